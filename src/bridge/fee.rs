use {
    super::{Dln, SubmitConfig, solana::SolanaProvider, with_buffer},
    crate::error::{Error, Result},
    solana_transaction::versioned::VersionedTransaction,
    std::fmt::{Display, Formatter},
    tracing::{debug, warn},
};

/// Compute budget applied to a Solana order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFee {
    /// micro-lamports per compute unit
    pub compute_unit_price: u64,
    pub compute_unit_limit: u32,
    /// As reported by the simulation, `None` when the fallback was used
    pub units_consumed: Option<u64>,
}

impl Display for PriorityFee {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "compute unit price {} limit {}",
            self.compute_unit_price, self.compute_unit_limit
        )
    }
}

/// Median of the recent prioritization fees, the upper one for even counts
pub fn suggest_compute_unit_price(fees: &[u64], fallback: u64) -> u64 {
    if fees.is_empty() {
        return fallback;
    }
    let mut sorted = fees.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

/// Simulated units plus the buffer, capped at the runtime maximum
pub fn compute_unit_limit(units_consumed: Option<u64>, config: &SubmitConfig) -> u32 {
    let units = units_consumed.unwrap_or(config.fallback_units_consumed);
    let limit = with_buffer(units, config.compute_unit_buffer_percent);
    u32::try_from(limit)
        .unwrap_or(u32::MAX)
        .min(config.max_compute_unit_limit)
}

impl<P: SolanaProvider> Dln<P> {
    /// Simulate a signed transaction and return the units it consumed
    pub async fn simulate_units(&self, tx: &VersionedTransaction) -> Result<Option<u64>> {
        let simulation = self.provider.rpc().simulate_transaction(tx).await?.value;
        if let Some(err) = simulation.err {
            let logs = simulation.logs.unwrap_or_default().join("\n");
            return Err(Error::SimulationFailed {
                reason: format!("{err:?}\n{logs}"),
            });
        }
        if simulation.units_consumed.is_none() {
            warn!("simulation did not report units consumed");
        }
        Ok(simulation.units_consumed)
    }

    /// Median of the node's recent prioritization fees
    pub async fn recent_compute_unit_price(&self) -> Result<u64> {
        let fees: Vec<u64> = self
            .provider
            .rpc()
            .get_recent_prioritization_fees(&[])
            .await?
            .into_iter()
            .map(|f| f.prioritization_fee)
            .collect();
        let price = suggest_compute_unit_price(&fees, self.config.fallback_compute_unit_price);
        debug!(samples = fees.len(), price, "recent prioritization fees");
        Ok(price)
    }

    /// Size the compute budget of a signed transaction, nothing is modified
    pub async fn estimate_priority_fee(&self, tx: &VersionedTransaction) -> Result<PriorityFee> {
        let units_consumed = self.simulate_units(tx).await?;
        let compute_unit_limit = compute_unit_limit(units_consumed, &self.config);
        let compute_unit_price = self.recent_compute_unit_price().await?;
        Ok(PriorityFee {
            compute_unit_price,
            compute_unit_limit,
            units_consumed,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::bridge::solana::tests::{mock_dln, order_transaction},
        rstest::rstest,
        serde_json::json,
        solana_keypair::Keypair,
        solana_rpc_client::{mock_sender::Mocks, nonblocking::rpc_client::RpcClient},
        solana_rpc_client_api::request::RpcRequest,
    };

    fn simulation(err: serde_json::Value, units_consumed: Option<u64>) -> serde_json::Value {
        json!({
            "context": { "slot": 1 },
            "value": {
                "err": err,
                "logs": ["Program log: Instruction: CreateOrder", "Program log: boom"],
                "accounts": null,
                "unitsConsumed": units_consumed,
                "returnData": null
            }
        })
    }

    #[rstest]
    #[case(&[], 2_000)]
    #[case(&[5], 5)]
    #[case(&[300, 100, 200], 200)]
    #[case(&[0, 0, 10, 40], 10)]
    #[case(&[1, 2, 3, 4, 5, 6], 4)]
    fn test_suggest_compute_unit_price(#[case] fees: &[u64], #[case] expected: u64) {
        assert_eq!(suggest_compute_unit_price(fees, 2_000), expected);
    }

    #[rstest]
    #[case(Some(100_000), 110_000)]
    #[case(Some(12_345), 13_580)]
    #[case(Some(1), 2)]
    #[case(None, 220_000)]
    #[case(Some(1_300_000), 1_400_000)]
    #[case(Some(u64::MAX), 1_400_000)]
    fn test_compute_unit_limit(#[case] units: Option<u64>, #[case] expected: u32) {
        assert_eq!(compute_unit_limit(units, &SubmitConfig::default()), expected);
    }

    #[test]
    fn test_compute_unit_limit_custom_buffer() {
        let config = SubmitConfig::default().with_compute_unit_buffer_percent(50);
        assert_eq!(compute_unit_limit(Some(10_000), &config), 15_000);
    }

    #[tokio::test]
    async fn test_estimate_priority_fee_fallback_units() -> anyhow::Result<()> {
        let dln = mock_dln(RpcClient::new_mock("succeeds".to_string()));
        let fee = dln
            .estimate_priority_fee(&order_transaction(&Keypair::new()))
            .await?;
        assert_eq!(fee.units_consumed, None);
        assert_eq!(fee.compute_unit_limit, 220_000);
        assert_eq!(fee.compute_unit_price, 10_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_estimate_priority_fee_from_simulation() -> anyhow::Result<()> {
        let mocks = Mocks::from([
            (RpcRequest::SimulateTransaction, simulation(json!(null), Some(50_000))),
            (RpcRequest::GetRecentPrioritizationFees, json!([])),
        ]);
        let dln = mock_dln(RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks))
            .with_config(SubmitConfig::default().with_fallback_compute_unit_price(1_234));
        let fee = dln
            .estimate_priority_fee(&order_transaction(&Keypair::new()))
            .await?;
        assert_eq!(fee, PriorityFee {
            compute_unit_price: 1_234,
            compute_unit_limit: 55_000,
            units_consumed: Some(50_000),
        });
        Ok(())
    }

    #[tokio::test]
    async fn test_simulation_failed() {
        let mocks = Mocks::from([(
            RpcRequest::SimulateTransaction,
            simulation(json!("AccountNotFound"), None),
        )]);
        let dln = mock_dln(RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks));
        let payer = Keypair::new();
        let mut tx = order_transaction(&payer);
        let result = dln.prepare_transaction(&mut tx, &payer).await;
        match result {
            Err(Error::SimulationFailed { reason }) => {
                assert!(reason.contains("AccountNotFound"), "{reason}");
                assert!(reason.contains("Program log: boom"), "{reason}");
            }
            other => panic!("expected a simulation failure, got {other:?}"),
        }
    }
}
