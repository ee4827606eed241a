use solana_pubkey::{Pubkey, pubkey};

pub const SOLANA_MAINNET: alloy_chains::Chain =
    alloy_chains::Chain::from_id_unchecked(SOLANA_MAINNET_ID);
/// Reowned Chain ID for Solana Mainnet
pub(crate) const SOLANA_MAINNET_ID: u64 = chain_id_from_reown!("5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp");

pub const SOLANA_USDC_TOKEN: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
/// DLN represents native SOL with the system program id
pub const NATIVE_SOL: Pubkey = pubkey!("11111111111111111111111111111111");
pub const WRAPPED_SOL: Pubkey = pubkey!("So11111111111111111111111111111111111111112");
pub const SOL_DECIMALS: u8 = 9;

/// DLN source program, holds give-order state and escrow wallets
pub const DLN_SOURCE_PROGRAM: Pubkey = pubkey!("src5qyZHqTqecJV4aY6Cb6zDZLMDzrDKKezs22MPHr4");
pub const SPL_TOKEN_PROGRAM: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
