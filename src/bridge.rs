use {
    crate::{
        DlnChain,
        compute_budget::decode_transaction,
        error::{Error, Result},
        tron::TronAddress,
    },
    alloy_chains::{Chain, NamedChain},
    alloy_primitives::{Address as EvmAddress, Bytes, TxHash, U256, hex},
    serde::{Deserialize, Serialize},
    solana_signature::Signature as SolanaSignature,
    solana_transaction::versioned::VersionedTransaction,
    std::{
        fmt::{Debug, Display},
        str::FromStr,
        time::Duration,
    },
};

mod affiliate;
mod cancel;
mod evm;
mod fee;
mod solana;
mod tron;

pub use {affiliate::*, fee::*, solana::*, tron::TronProvider};

/// Default confirmation requirements and timeouts for different chains
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(180); // 3 minutes default
pub const CHAIN_CONFIRMATION_CONFIG: &[(NamedChain, u64, Duration)] = &[
    // (Chain, Required Confirmations, Timeout)
    (NamedChain::Mainnet, 2, Duration::from_secs(300)),
    (NamedChain::Arbitrum, 1, Duration::from_secs(120)),
    (NamedChain::Optimism, 1, Duration::from_secs(120)),
    (NamedChain::Polygon, 15, Duration::from_secs(180)), // reorgs
    (NamedChain::Avalanche, 3, Duration::from_secs(120)),
    (NamedChain::BinanceSmartChain, 2, Duration::from_secs(120)),
    (NamedChain::Base, 1, Duration::from_secs(120)),
    (NamedChain::Linea, 1, Duration::from_secs(180)),
];

/// Gets the chain-specific confirmation configuration
pub fn get_chain_confirmation_config(chain: &NamedChain) -> (u64, Duration) {
    CHAIN_CONFIRMATION_CONFIG
        .iter()
        .find(|(ch, _, _)| ch == chain)
        .map(|(_, confirmations, timeout)| (*confirmations, *timeout))
        .unwrap_or((1, DEFAULT_CONFIRMATION_TIMEOUT))
}

/// Runtime cap on compute units per transaction
pub const MAX_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

/// Knobs for fee sizing and confirmation waits.
///
/// Buffers are whole percents added on top of the simulated/estimated cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitConfig {
    pub compute_unit_buffer_percent: u64,
    /// Used when the simulation does not report `units_consumed`
    pub fallback_units_consumed: u64,
    /// Micro-lamports, used when the node has no recent prioritization fees
    pub fallback_compute_unit_price: u64,
    pub max_compute_unit_limit: u32,
    pub gas_buffer_percent: u64,
    pub tron_fee_limit_buffer_percent: u64,
    pub allowance_poll_interval: Duration,
    pub allowance_timeout: Duration,
    /// Pause between affiliate withdrawal batches
    pub batch_interval: Duration,
    /// Overrides [`CHAIN_CONFIRMATION_CONFIG`]
    pub confirmations: Option<(u64, Duration)>,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            compute_unit_buffer_percent: 10,
            fallback_units_consumed: 200_000,
            fallback_compute_unit_price: 2_000,
            max_compute_unit_limit: MAX_COMPUTE_UNIT_LIMIT,
            gas_buffer_percent: 30,
            tron_fee_limit_buffer_percent: 30,
            allowance_poll_interval: Duration::from_secs(2),
            allowance_timeout: Duration::from_secs(30),
            batch_interval: Duration::from_secs(5),
            confirmations: None,
        }
    }
}

impl SubmitConfig {
    pub fn with_compute_unit_buffer_percent(mut self, percent: u64) -> Self {
        self.compute_unit_buffer_percent = percent;
        self
    }

    pub fn with_fallback_compute_unit_price(mut self, micro_lamports: u64) -> Self {
        self.fallback_compute_unit_price = micro_lamports;
        self
    }

    pub fn with_gas_buffer_percent(mut self, percent: u64) -> Self {
        self.gas_buffer_percent = percent;
        self
    }

    pub fn with_tron_fee_limit_buffer_percent(mut self, percent: u64) -> Self {
        self.tron_fee_limit_buffer_percent = percent;
        self
    }

    pub fn with_allowance_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.allowance_poll_interval = interval;
        self.allowance_timeout = timeout;
        self
    }

    pub fn with_batch_interval(mut self, interval: Duration) -> Self {
        self.batch_interval = interval;
        self
    }

    pub fn with_confirmations(mut self, confirmations: u64, timeout: Duration) -> Self {
        self.confirmations = Some((confirmations, timeout));
        self
    }
}

/// `value * (100 + percent) / 100`, rounded up
pub fn with_buffer(value: u64, percent: u64) -> u64 {
    let scaled = u128::from(value).saturating_mul(u128::from(percent) + 100);
    u64::try_from(scaled.div_ceil(100)).unwrap_or(u64::MAX)
}

/// The `tx` object of a DLN order response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTransaction {
    /// Absent for Solana orders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl OrderTransaction {
    fn to_str(&self) -> Result<&str> {
        self.to
            .as_deref()
            .filter(|to| !to.is_empty())
            .ok_or_else(|| Error::InvalidOrderTransaction("missing `to`".to_string()))
    }

    pub fn evm_to(&self) -> Result<EvmAddress> {
        let to = self.to_str()?;
        to.parse().map_err(|source| Error::InvalidAddress {
            address: to.to_string(),
            source,
        })
    }

    /// Either form the API hands out, base58 or 20 byte hex
    pub fn tron_to(&self) -> Result<TronAddress> {
        self.to_str()?.parse()
    }

    pub fn calldata(&self) -> Result<Bytes> {
        if self.data.is_empty() {
            return Err(Error::InvalidOrderTransaction("missing `data`".to_string()));
        }
        Ok(hex::decode(&self.data)?.into())
    }

    /// Decimal or `0x` hex, zero when absent
    pub fn value(&self) -> Result<U256> {
        match self.value.as_deref().map(str::trim) {
            None | Some("") => Ok(U256::ZERO),
            Some(v) => U256::from_str(v)
                .map_err(|e| Error::InvalidOrderTransaction(format!("bad value {v}: {e}"))),
        }
    }

    pub fn solana_transaction(&self) -> Result<VersionedTransaction> {
        decode_transaction(&self.data)
    }
}

/// The cancel transaction DLN builds for an order stuck on an EVM chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelTransaction {
    pub to: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub chain_id: u64,
    /// Order authority on the destination chain
    pub from: String,
}

impl CancelTransaction {
    pub fn transaction(&self) -> OrderTransaction {
        OrderTransaction {
            to: Some(self.to.clone()),
            data: self.data.clone(),
            value: self.value.clone(),
        }
    }

    pub fn from_address(&self) -> Result<EvmAddress> {
        self.from.parse().map_err(|source| Error::InvalidAddress {
            address: self.from.clone(),
            source,
        })
    }
}

#[derive(Clone, Debug)]
pub struct EvmOrderResult {
    pub approval: Option<TxHash>,
    pub order: TxHash,
    pub gas_limit: u64,
}

impl Display for EvmOrderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Approval: {:?}, Order: {}, Gas limit: {}",
            self.approval, self.order, self.gas_limit
        )
    }
}

#[derive(Clone, Debug)]
pub struct SolanaOrderResult {
    pub signature: SolanaSignature,
    pub fee: PriorityFee,
}

impl Display for SolanaOrderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order: {}, {}", self.signature, self.fee)
    }
}

#[derive(Clone, Debug)]
pub struct TronOrderResult {
    pub approval: Option<String>,
    pub order: String,
    /// sun
    pub fee_limit: u64,
}

impl Display for TronOrderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Approval: {:?}, Order: {}, Fee limit: {} sun",
            self.approval, self.order, self.fee_limit
        )
    }
}

/// Submits DLN orders on a single source chain through `P`
#[derive(Clone)]
pub struct Dln<P> {
    provider: P,
    chain: Chain,
    config: SubmitConfig,
}

impl<P> Debug for Dln<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.chain.dln_chain_id() {
            Ok(id) => write!(f, "DLN[{}({})]", self.chain, id.id()),
            Err(_) => write!(f, "DLN[{}(unsupported)]", self.chain),
        }
    }
}

impl<P> Dln<P> {
    fn with_provider(provider: P, chain: Chain) -> Self {
        Self {
            provider,
            chain,
            config: SubmitConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SubmitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn config(&self) -> &SubmitConfig {
        &self.config
    }

    /// Required confirmations and wait timeout for this chain
    pub fn confirmations(&self) -> (u64, Duration) {
        self.confirmations_on(&self.chain)
    }

    /// Required confirmations and wait timeout for `chain`, the configured
    /// override wins
    pub fn confirmations_on(&self, chain: &Chain) -> (u64, Duration) {
        if let Some(c) = self.config.confirmations {
            return c;
        }
        chain
            .named()
            .map(|n| get_chain_confirmation_config(&n))
            .unwrap_or((1, DEFAULT_CONFIRMATION_TIMEOUT))
    }
}
