use {
    crate::tron::TronAddress,
    alloy_primitives::{Address, address},
    alloy_sol_types::sol,
};

/// DLN uses the zero address for the native token of every EVM chain
pub const EVM_NATIVE_TOKEN: Address = Address::ZERO;
pub const EVM_NATIVE_DECIMALS: u8 = 18;
pub const USDC_DECIMALS: u8 = 6;

pub const ARBITRUM_USDC_CONTRACT: Address = address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831");
pub const AVALANCHE_USDC_CONTRACT: Address = address!("0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E");
pub const BASE_USDC_CONTRACT: Address = address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
pub const BNB_USDC_CONTRACT: Address = address!("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d");
pub const ETHEREUM_USDC_CONTRACT: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const OPTIMISM_USDC_CONTRACT: Address = address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85");
pub const POLYGON_USDC_CONTRACT: Address = address!("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// `TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t`
pub const TRON_USDT_CONTRACT: TronAddress =
    TronAddress::from_evm(address!("0xa614f803b6fd780986a42c78ec9c7f77e6ded13c"));
pub const TRON_USDT_DECIMALS: u8 = 6;
/// `T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb`
pub const TRX_SENTINEL: TronAddress = TronAddress::ZERO;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tron_token_constants() {
        assert_eq!(TRON_USDT_CONTRACT.to_string(), "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t");
        assert_eq!(TRX_SENTINEL.to_string(), "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb");
    }
}
