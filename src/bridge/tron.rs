use {
    super::{Dln, OrderTransaction, TronOrderResult},
    crate::{
        ERC20,
        TRON_MAINNET,
        TRX_SENTINEL,
        error::{Error, Result},
        tron::{
            BroadcastReceipt,
            TriggerConstantResponse,
            TriggerSmartContractResponse,
            TronAddress,
            TronClient,
            TronTransaction,
            calc_fee_limit,
            check_broadcast,
        },
    },
    alloy_primitives::{U256, hex},
    alloy_signer_local::PrivateKeySigner,
    alloy_sol_types::SolCall,
    serde_json::json,
    std::future::Future,
    tokio::time::{Instant, sleep},
    tracing::{Level, debug, info, instrument, trace},
};

/// The full-node calls order submission needs
pub trait TronProvider {
    /// Dry-run a contract call
    fn trigger_constant_contract(
        &self,
        owner: &TronAddress,
        contract: &TronAddress,
        call_value: u64,
        data: &[u8],
    ) -> impl Future<Output = Result<TriggerConstantResponse>> + Send;

    /// Current energy price in sun
    fn energy_price(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Build an unsigned contract call transaction
    fn trigger_smart_contract(
        &self,
        owner: &TronAddress,
        contract: &TronAddress,
        call_value: u64,
        data: &[u8],
        fee_limit: u64,
    ) -> impl Future<Output = Result<TronTransaction>> + Send;

    fn broadcast(
        &self,
        transaction: &TronTransaction,
    ) -> impl Future<Output = Result<BroadcastReceipt>> + Send;
}

impl TronProvider for TronClient {
    async fn trigger_constant_contract(
        &self,
        owner: &TronAddress,
        contract: &TronAddress,
        call_value: u64,
        data: &[u8],
    ) -> Result<TriggerConstantResponse> {
        self.post(
            "wallet/triggerconstantcontract",
            &json!({
                "owner_address": owner.to_hex41(),
                "contract_address": contract.to_hex41(),
                "data": hex::encode(data),
                "call_value": call_value,
                "visible": false,
            }),
        )
        .await
    }

    async fn energy_price(&self) -> Result<u64> {
        self.chain_parameters().await?.energy_fee()
    }

    async fn trigger_smart_contract(
        &self,
        owner: &TronAddress,
        contract: &TronAddress,
        call_value: u64,
        data: &[u8],
        fee_limit: u64,
    ) -> Result<TronTransaction> {
        let response: TriggerSmartContractResponse = self
            .post(
                "wallet/triggersmartcontract",
                &json!({
                    "owner_address": owner.to_hex41(),
                    "contract_address": contract.to_hex41(),
                    "data": hex::encode(data),
                    "call_value": call_value,
                    "fee_limit": fee_limit,
                    "visible": false,
                }),
            )
            .await?;
        if !response.result.result {
            return Err(Error::TronApi(format!(
                "failed to build transaction: {}",
                response.result.reason()
            )));
        }
        response
            .transaction
            .ok_or_else(|| Error::TronApi("node returned no transaction".to_string()))
    }

    async fn broadcast(&self, transaction: &TronTransaction) -> Result<BroadcastReceipt> {
        self.post(
            "wallet/broadcasttransaction",
            &serde_json::to_value(transaction)?,
        )
        .await
    }
}

impl<P: TronProvider> Dln<P> {
    pub fn new_tron(provider: P) -> Self {
        Self::with_provider(provider, TRON_MAINNET)
    }

    /// Energy a call would burn
    pub async fn simulate_tron_call(
        &self,
        owner: &TronAddress,
        contract: &TronAddress,
        call_value: u64,
        data: &[u8],
    ) -> Result<u64> {
        let energy = self
            .provider
            .trigger_constant_contract(owner, contract, call_value, data)
            .await?
            .energy()?;
        trace!(%contract, energy, "simulated");
        Ok(energy)
    }

    /// Fee limit in sun for `energy` at the current energy price
    pub async fn tron_fee_limit(&self, energy: u64) -> Result<u64> {
        let price = self.provider.energy_price().await?;
        Ok(calc_fee_limit(
            energy,
            price,
            self.config.tron_fee_limit_buffer_percent,
        ))
    }

    pub async fn trc20_balance(&self, token: &TronAddress, owner: &TronAddress) -> Result<U256> {
        let data = ERC20::balanceOfCall {
            owner: owner.evm_address(),
        }
        .abi_encode();
        self.provider
            .trigger_constant_contract(owner, token, 0, &data)
            .await?
            .word()
    }

    pub async fn trc20_allowance(
        &self,
        token: &TronAddress,
        owner: &TronAddress,
        spender: &TronAddress,
    ) -> Result<U256> {
        let data = ERC20::allowanceCall {
            owner: owner.evm_address(),
            spender: spender.evm_address(),
        }
        .abi_encode();
        self.provider
            .trigger_constant_contract(owner, token, 0, &data)
            .await?
            .word()
    }

    /// Simulate, size, build, sign and broadcast a contract call. Returns the
    /// txid and the fee limit used.
    async fn send_trigger(
        &self,
        signer: &PrivateKeySigner,
        contract: &TronAddress,
        call_value: u64,
        data: &[u8],
    ) -> Result<(String, u64)> {
        let owner = TronAddress::from_evm(signer.address());
        let energy = self
            .simulate_tron_call(&owner, contract, call_value, data)
            .await?;
        let fee_limit = self.tron_fee_limit(energy).await?;
        debug!(energy, fee_limit, "sizing {contract} call");

        let mut tx = self
            .provider
            .trigger_smart_contract(&owner, contract, call_value, data, fee_limit)
            .await?;
        tx.sign(signer)?;
        let receipt = self.provider.broadcast(&tx).await?;
        Ok((check_broadcast(&receipt)?, fee_limit))
    }

    /// Poll until `spender` may pull `required`, so a following simulation
    /// sees the approval. The allowance is read at least once.
    async fn wait_for_tron_allowance(
        &self,
        token: &TronAddress,
        owner: &TronAddress,
        spender: &TronAddress,
        required: U256,
    ) -> Result<()> {
        let started = Instant::now();
        loop {
            let current = self.trc20_allowance(token, owner, spender).await?;
            if current >= required {
                return Ok(());
            }
            if started.elapsed() >= self.config.allowance_timeout {
                return Err(Error::AllowanceTimeout);
            }
            trace!("allowance {current} < {required}, polling");
            sleep(self.config.allowance_poll_interval).await;
        }
    }

    /// TRC-20 counterpart of `ensure_allowance` on EVM chains
    #[instrument(skip(self, signer), level = Level::INFO)]
    pub async fn ensure_tron_allowance(
        &self,
        signer: &PrivateKeySigner,
        token: &TronAddress,
        spender: &TronAddress,
        required: U256,
    ) -> Result<Option<String>> {
        let owner = TronAddress::from_evm(signer.address());
        let balance = self.trc20_balance(token, &owner).await?;
        debug!("balance {balance}");
        if balance < required {
            return Err(Error::InsufficientBalance(balance, required));
        }

        let current_allowance = self.trc20_allowance(token, &owner, spender).await?;
        if current_allowance >= required {
            return Ok(None);
        }

        let data = ERC20::approveCall {
            spender: spender.evm_address(),
            amount: required,
        }
        .abi_encode();
        let (txid, _) = self.send_trigger(signer, token, 0, &data).await?;
        info!("Approved spending: {txid}");
        self.wait_for_tron_allowance(token, &owner, spender, required)
            .await?;
        Ok(Some(txid))
    }

    /// Approve `token_in` when needed and broadcast the order.
    ///
    /// `call_value` is the order's fixed fee in sun, paid in TRX alongside
    /// the call.
    #[instrument(skip(self, signer, order), level = Level::INFO)]
    pub async fn send_tron_order(
        &self,
        signer: &PrivateKeySigner,
        order: &OrderTransaction,
        token_in: &TronAddress,
        required: U256,
        call_value: u64,
    ) -> Result<TronOrderResult> {
        let contract = order.tron_to()?;
        let approval = if *token_in == TRX_SENTINEL {
            None
        } else {
            self.ensure_tron_allowance(signer, token_in, &contract, required)
                .await?
        };

        let data = order.calldata()?;
        let (txid, fee_limit) = self
            .send_trigger(signer, &contract, call_value, &data)
            .await?;
        info!("order broadcast: {txid}");
        Ok(TronOrderResult {
            approval,
            order: txid,
            fee_limit,
        })
    }
}
