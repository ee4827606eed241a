use {
    super::{CancelTransaction, Dln},
    crate::error::{Error, Result},
    alloy_chains::Chain,
    alloy_network::Ethereum,
    alloy_primitives::TxHash,
    alloy_provider::{Provider, WalletProvider},
    tracing::{Level, info, instrument},
};

impl<P: Provider<Ethereum> + WalletProvider + Clone> Dln<P> {
    /// Cancel an unfulfilled order on its destination chain. Only the order's
    /// destination authority can do this, from a provider on that chain.
    #[instrument(skip(self, cancel), fields(chain_id = cancel.chain_id), level = Level::INFO)]
    pub async fn cancel_order(&self, cancel: &CancelTransaction) -> Result<TxHash> {
        let provider = self.provider();
        let actual = provider.get_chain_id().await?;
        if actual != cancel.chain_id {
            return Err(Error::ChainMismatch {
                expected: cancel.chain_id,
                actual,
            });
        }

        let sender = provider.default_signer_address();
        let authority = cancel.from_address()?;
        if sender != authority {
            return Err(Error::SenderMismatch {
                expected: authority.to_string(),
                actual: sender.to_string(),
            });
        }

        let confirmations = self.confirmations_on(&Chain::from_id(cancel.chain_id));
        let (hash, gas_limit) = self
            .send_buffered(&cancel.transaction(), confirmations)
            .await?;
        info!(gas_limit, "cancel sent: {hash}");
        Ok(hash)
    }
}
