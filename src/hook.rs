use {
    crate::error::Result,
    alloy_primitives::{Address, Bytes, U256, address},
    alloy_sol_types::{SolCall, sol},
    serde::{Deserialize, Serialize},
};

pub const AAVE_V3_POOL_POLYGON: Address = address!("0x794a61358D6845594F94dc1DB02A252b5b4814aD");

sol! {
    #[allow(missing_docs)]
    interface IAavePool {
        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
    }
}

/// A contract call executed on the destination chain once the order is
/// fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DlnHook {
    EvmTransactionCall {
        to: Address,
        calldata: Bytes,
        /// 0 lets the taker estimate
        gas: u64,
    },
}

impl DlnHook {
    pub fn evm_call(to: Address, calldata: impl Into<Bytes>) -> Self {
        Self::EvmTransactionCall {
            to,
            calldata: calldata.into(),
            gas: 0,
        }
    }

    /// Value of the `dlnHook` order parameter
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Calldata for Aave v3 `Pool.supply`
pub fn aave_supply_calldata(
    asset: Address,
    amount: U256,
    on_behalf_of: Address,
    referral_code: u16,
) -> Bytes {
    IAavePool::supplyCall {
        asset,
        amount,
        onBehalfOf: on_behalf_of,
        referralCode: referral_code,
    }
    .abi_encode()
    .into()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::POLYGON_USDC_CONTRACT,
        alloy_primitives::hex,
        serde_json::{Value, json},
    };

    #[test]
    fn test_aave_supply_calldata() {
        let owner = address!("0x55A8f5cce1d53D9Ff84EC0962882b447E5914dB8");
        let calldata = aave_supply_calldata(POLYGON_USDC_CONTRACT, U256::from(1_000_000), owner, 0);
        assert_eq!(calldata.len(), 4 + 32 * 4);
        assert_eq!(&calldata[..4], hex!("617ba037"));
        assert_eq!(&calldata[4 + 12..36], POLYGON_USDC_CONTRACT.as_slice());
        assert_eq!(U256::from_be_slice(&calldata[36..68]), U256::from(1_000_000));
        assert_eq!(&calldata[68 + 12..100], owner.as_slice());
        assert!(calldata[100..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_hook_json() -> anyhow::Result<()> {
        let hook = DlnHook::evm_call(AAVE_V3_POOL_POLYGON, hex!("deadbeef").to_vec());
        let value: Value = serde_json::from_str(&hook.to_json()?)?;
        assert_eq!(value["type"], json!("evm_transaction_call"));
        assert_eq!(value["data"]["calldata"], json!("0xdeadbeef"));
        assert_eq!(value["data"]["gas"], json!(0));
        let to = value["data"]["to"].as_str().unwrap_or_default().to_lowercase();
        assert_eq!(to, "0x794a61358d6845594f94dc1db02a252b5b4814ad");
        let back: DlnHook = serde_json::from_value(value)?;
        assert_eq!(back, hook);
        Ok(())
    }
}
