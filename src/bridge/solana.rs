use {
    super::{Dln, OrderTransaction, PriorityFee, SolanaOrderResult},
    crate::{
        SOLANA_MAINNET,
        compute_budget::{refresh_and_sign, update_priority_fee},
        error::Result,
    },
    solana_commitment_config::CommitmentConfig,
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    solana_signer::Signer,
    solana_transaction::versioned::VersionedTransaction,
    std::sync::Arc,
    tracing::{Level, debug, info, instrument},
};

impl From<RpcClient> for SolanaWrapper {
    fn from(rpc: RpcClient) -> Self {
        SolanaWrapper(Arc::new(rpc))
    }
}

#[derive(Clone)]
pub struct SolanaWrapper(Arc<RpcClient>);

impl SolanaWrapper {
    /// Client at `confirmed` commitment
    pub fn new(url: impl Into<String>) -> Self {
        RpcClient::new_with_commitment(url.into(), CommitmentConfig::confirmed()).into()
    }
}

pub trait SolanaProvider {
    fn rpc(&self) -> &RpcClient;
}

impl SolanaProvider for SolanaWrapper {
    fn rpc(&self) -> &RpcClient {
        &self.0
    }
}

impl<P: SolanaProvider> Dln<P> {
    pub fn new_solana(provider: P) -> Self {
        Self::with_provider(provider, SOLANA_MAINNET)
    }

    /// Re-price a DLN Solana order and sign it.
    ///
    /// The transaction is signed against a fresh blockhash and simulated, the
    /// compute budget instructions are patched from the simulation and recent
    /// prioritization fees, then it is signed again against a newer blockhash.
    #[instrument(skip(self, tx, signer), level = Level::INFO)]
    pub async fn prepare_transaction<S: Signer + ?Sized>(
        &self,
        tx: &mut VersionedTransaction,
        signer: &S,
    ) -> Result<PriorityFee> {
        let rpc = self.provider.rpc();
        refresh_and_sign(tx, rpc.get_latest_blockhash().await?, signer)?;

        let fee = self.estimate_priority_fee(tx).await?;
        debug!(units_consumed = ?fee.units_consumed, %fee, "estimated priority fee");
        update_priority_fee(tx, fee.compute_unit_price, Some(fee.compute_unit_limit))?;

        refresh_and_sign(tx, rpc.get_latest_blockhash().await?, signer)?;
        Ok(fee)
    }

    /// Prepare, send and confirm the order returned by the DLN API
    #[instrument(skip(self, order, signer), level = Level::INFO)]
    pub async fn send_solana_order<S: Signer + ?Sized>(
        &self,
        order: &OrderTransaction,
        signer: &S,
    ) -> Result<SolanaOrderResult> {
        let mut tx = order.solana_transaction()?;
        let fee = self.prepare_transaction(&mut tx, signer).await?;
        let signature = self
            .provider
            .rpc()
            .send_and_confirm_transaction(&tx)
            .await?;
        info!(%signature, %fee, "order sent");
        Ok(SolanaOrderResult { signature, fee })
    }
}

#[cfg(test)]
pub(super) mod tests {
    use {
        super::*,
        crate::compute_budget::read_compute_budget,
        alloy_primitives::hex,
        solana_compute_budget_interface::ComputeBudgetInstruction,
        solana_hash::Hash,
        solana_keypair::Keypair,
        solana_message::{Message, VersionedMessage},
        solana_rpc_client::mock_sender::PUBKEY,
        std::str::FromStr,
    };

    /// Legacy transfer with placeholder compute budget instructions, the
    /// shape DLN hands out for Solana orders
    pub(in crate::bridge) fn order_transaction(payer: &Keypair) -> VersionedTransaction {
        let instructions = [
            ComputeBudgetInstruction::set_compute_unit_limit(1),
            ComputeBudgetInstruction::set_compute_unit_price(1),
            solana_system_interface::instruction::transfer(
                &payer.pubkey(),
                &solana_pubkey::Pubkey::new_unique(),
                1,
            ),
        ];
        VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::Legacy(Message::new(&instructions, Some(&payer.pubkey()))),
        }
    }

    pub(in crate::bridge) fn mock_dln(rpc: RpcClient) -> Dln<SolanaWrapper> {
        Dln::new_solana(SolanaWrapper::from(rpc))
    }

    #[tokio::test]
    async fn test_prepare_transaction() -> anyhow::Result<()> {
        let payer = Keypair::new();
        let dln = mock_dln(RpcClient::new_mock("succeeds".to_string()));
        let mut tx = order_transaction(&payer);

        let fee = dln.prepare_transaction(&mut tx, &payer).await?;
        // the mock reports no units consumed and a single 10 000 fee sample
        assert_eq!(fee, PriorityFee {
            compute_unit_price: 10_000,
            compute_unit_limit: 220_000,
            units_consumed: None,
        });
        assert_eq!(read_compute_budget(&tx), (Some(10_000), Some(220_000)));
        assert_eq!(*tx.message.recent_blockhash(), Hash::from_str(PUBKEY)?);
        assert!(tx.verify_with_results().iter().all(|ok| *ok));
        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_foreign_signer() {
        let dln = mock_dln(RpcClient::new_mock("succeeds".to_string()));
        let mut tx = order_transaction(&Keypair::new());
        let result = dln.prepare_transaction(&mut tx, &Keypair::new()).await;
        assert!(matches!(result, Err(crate::Error::SignerNotRequired(_))));
    }

    #[tokio::test]
    async fn test_send_solana_order() -> anyhow::Result<()> {
        let payer = Keypair::new();
        let dln = mock_dln(RpcClient::new_mock("succeeds".to_string()));
        let order = OrderTransaction {
            to: None,
            data: format!("0x{}", hex::encode(bincode::serialize(&order_transaction(&payer))?)),
            value: None,
        };

        let SolanaOrderResult { signature, fee } = dln.send_solana_order(&order, &payer).await?;
        assert_ne!(signature, solana_signature::Signature::default());
        assert_eq!(fee.compute_unit_limit, 220_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_solana_order_unconfirmed() -> anyhow::Result<()> {
        let payer = Keypair::new();
        let dln = mock_dln(RpcClient::new_mock("instruction_error".to_string()));
        let order = OrderTransaction {
            to: None,
            data: hex::encode(bincode::serialize(&order_transaction(&payer))?),
            value: None,
        };
        let result = dln.send_solana_order(&order, &payer).await;
        assert!(matches!(result, Err(crate::Error::SolanaRpc(_))));
        Ok(())
    }
}
