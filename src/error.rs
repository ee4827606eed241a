use {
    alloy_primitives::{hex::FromHexError, ruint::aliases::U256},
    thiserror::Error,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Chain not supported: {chain}")]
    ChainNotSupported { chain: String },

    #[error("Invalid address: {address}")]
    InvalidAddress {
        address: String,
        #[source]
        source: FromHexError,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Contract call failed: {0}")]
    PendingError(#[from] alloy_provider::PendingTransactionError),

    #[error("Contract call failed: {0}")]
    ContractError(#[from] alloy_contract::Error),

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Simulation failed: {reason}")]
    SimulationFailed { reason: String },

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex conversion error: {0}")]
    Hex(#[from] FromHexError),

    #[error("Address conversion error: {0}")]
    AddrError(String),

    #[error("Insufficient balance have {0} need {1}")]
    InsufficientBalance(U256, U256),

    #[error("invalid order transaction: {0}")]
    InvalidOrderTransaction(String),

    #[error("wrong chain: order expects {expected}, provider is on {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("sender {actual} is not the order authority {expected}")]
    SenderMismatch { expected: String, actual: String },

    #[error(transparent)]
    EvmSigner(#[from] alloy_signer::Error),

    #[error("solana rpc error: {0}")]
    SolanaRpc(#[from] solana_rpc_client_api::client_error::Error),

    #[error("solana transaction decode error: {0}")]
    SolanaDecode(#[from] bincode::Error),

    #[error(transparent)]
    SolanaSigner(#[from] solana_signer::SignerError),

    #[error(transparent)]
    SolanaCompile(#[from] solana_message::CompileError),

    #[error("invalid compute budget: {0}")]
    InvalidComputeBudget(String),

    #[error("{0} is not a required signer of this transaction")]
    SignerNotRequired(String),

    #[error("instruction does not fit in a single transaction")]
    InstructionTooLarge,

    #[error("TRON API error: {0}")]
    TronApi(String),

    #[error("Timeout waiting for allowance update")]
    AllowanceTimeout,
}

pub type Result<T> = std::result::Result<T, Error>;
