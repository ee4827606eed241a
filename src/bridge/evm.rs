use {
    super::{Dln, EvmOrderResult, OrderTransaction, with_buffer},
    crate::{
        ERC20,
        EVM_NATIVE_TOKEN,
        error::{Error, Result},
    },
    alloy_chains::NamedChain,
    alloy_network::{Ethereum, TransactionBuilder},
    alloy_primitives::{Address as EvmAddress, TxHash, U256},
    alloy_provider::{Provider, WalletProvider},
    alloy_rpc_types::{TransactionReceipt, TransactionRequest},
    std::time::Duration,
    tracing::{Level, debug, info, instrument},
};

/// Hash of a mined transaction, or `TransactionFailed` when it reverted
fn ensure_success(receipt: &TransactionReceipt) -> Result<TxHash> {
    if !receipt.status() {
        return Err(Error::TransactionFailed {
            reason: format!(
                "transaction {} reverted in block {:?}",
                receipt.transaction_hash, receipt.block_number
            ),
        });
    }
    Ok(receipt.transaction_hash)
}

impl<P: Provider<Ethereum> + WalletProvider + Clone> Dln<P> {
    pub fn new_evm(provider: P, chain: NamedChain) -> Self {
        Self::with_provider(provider, chain.into())
    }

    /// Make sure `spender` can pull `required` of `token` from the wallet,
    /// approving exactly `required` when the current allowance is short.
    #[instrument(skip(self), level = Level::INFO)]
    pub async fn ensure_allowance(
        &self,
        token: EvmAddress,
        spender: EvmAddress,
        required: U256,
    ) -> Result<Option<TxHash>> {
        let provider = self.provider();
        let owner = provider.default_signer_address();
        let erc20 = ERC20::new(token, provider);

        let balance = erc20.balanceOf(owner).call().await?;
        debug!("balance {balance}");
        if balance < required {
            return Err(Error::InsufficientBalance(balance, required));
        }

        let current_allowance = erc20.allowance(owner, spender).call().await?;
        if current_allowance >= required {
            debug!("allowance {current_allowance} is sufficient");
            return Ok(None);
        }

        let (confirmations, timeout) = self.confirmations();
        debug!("Approving allowance");
        let receipt = erc20
            .approve(spender, required)
            .send()
            .await?
            .with_required_confirmations(confirmations)
            .with_timeout(Some(timeout))
            .get_receipt()
            .await?;
        let approve_hash = ensure_success(&receipt)?;
        info!("Approved spending: {approve_hash}");
        Ok(Some(approve_hash))
    }

    /// Estimate, pad and send a DLN built transaction from the wallet, then
    /// wait for `confirmations`
    pub(super) async fn send_buffered(
        &self,
        order: &OrderTransaction,
        (confirmations, timeout): (u64, Duration),
    ) -> Result<(TxHash, u64)> {
        let provider = self.provider();
        let request = TransactionRequest::default()
            .with_from(provider.default_signer_address())
            .with_to(order.evm_to()?)
            .with_input(order.calldata()?)
            .with_value(order.value()?);

        let estimate = provider.estimate_gas(request.clone()).await?;
        let gas_limit = with_buffer(estimate, self.config.gas_buffer_percent);
        debug!(estimate, gas_limit, "gas");

        let receipt = provider
            .send_transaction(request.with_gas_limit(gas_limit))
            .await?
            .with_required_confirmations(confirmations)
            .with_timeout(Some(timeout))
            .get_receipt()
            .await?;
        Ok((ensure_success(&receipt)?, gas_limit))
    }

    /// Approve `token_in` for the DLN contract when needed, then send the
    /// order transaction. The native token needs no approval.
    #[instrument(skip(self, order), level = Level::INFO)]
    pub async fn send_evm_order(
        &self,
        order: &OrderTransaction,
        token_in: EvmAddress,
        required: U256,
    ) -> Result<EvmOrderResult> {
        let spender = order.evm_to()?;
        let approval = if token_in == EVM_NATIVE_TOKEN {
            None
        } else {
            self.ensure_allowance(token_in, spender, required).await?
        };

        let (hash, gas_limit) = self.send_buffered(order, self.confirmations()).await?;
        info!("order sent on {}: {hash}", self.chain());
        Ok(EvmOrderResult {
            approval,
            order: hash,
            gas_limit,
        })
    }
}
