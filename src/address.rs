use {
    crate::{error::Error, tron::TronAddress},
    alloy_primitives::FixedBytes,
    std::{fmt::Display, str::FromStr},
};

const EVM_ADDRESS_BYTES: usize = 20;
const TRON_ADDRESS_BYTES: usize = 21;

/// Chain agnostic address, the raw bytes plus their length.
///
/// 20 bytes is an EVM account, 21 a TRON account and 32 a Solana pubkey.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub FixedBytes<64>, pub usize);

impl Address {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..self.1]
    }

    fn from_slice(bytes: &[u8]) -> Self {
        let mut out = FixedBytes::<64>::ZERO;
        out[..bytes.len()].copy_from_slice(bytes);
        Self(out, bytes.len())
    }

    fn length_error(&self, kind: &str, expected: usize) -> Error {
        Error::AddrError(format!(
            "Invalid length for {kind} address: expected {expected}, got {} ({self})",
            self.1
        ))
    }
}

impl AsRef<Address> for Address {
    fn as_ref(&self) -> &Address {
        self
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Tries EVM hex, then a Solana pubkey, then a TRON address
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(addr) = s.parse::<alloy_primitives::Address>() {
            return Ok(Self::from(addr));
        }
        if let Ok(pubkey) = s.parse::<solana_pubkey::Pubkey>() {
            return Ok(Self::from(pubkey));
        }
        s.parse::<TronAddress>()
            .map(Self::from)
            .map_err(|_| Error::AddrError(format!("Invalid address format: {s}")))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.1 {
            EVM_ADDRESS_BYTES => {
                let addr = alloy_primitives::Address::from_slice(self.as_bytes());
                write!(f, "{addr:#x}")
            }
            TRON_ADDRESS_BYTES => match TronAddress::from_bytes(self.as_bytes()) {
                Ok(addr) => write!(f, "{addr}"),
                Err(_) => write!(f, "0x{}", alloy_primitives::hex::encode(self.as_bytes())),
            },
            solana_pubkey::PUBKEY_BYTES => {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(self.as_bytes());
                write!(f, "{}", solana_pubkey::Pubkey::new_from_array(bytes))
            }
            _ => write!(f, "0x{}", alloy_primitives::hex::encode(self.as_bytes())),
        }
    }
}

impl TryFrom<&Address> for alloy_primitives::Address {
    type Error = Error;

    fn try_from(addr: &Address) -> Result<Self, Self::Error> {
        match addr.1 {
            EVM_ADDRESS_BYTES => Ok(alloy_primitives::Address::from_slice(addr.as_bytes())),
            // the DLN API hands out TRON contracts as 0x41 prefixed hex at times
            TRON_ADDRESS_BYTES => Ok(TronAddress::from_bytes(addr.as_bytes())?.evm_address()),
            _ => Err(addr.length_error("EVM", EVM_ADDRESS_BYTES)),
        }
    }
}

impl TryFrom<Address> for alloy_primitives::Address {
    type Error = Error;

    fn try_from(addr: Address) -> Result<Self, Self::Error> {
        Self::try_from(&addr)
    }
}

impl TryFrom<&Address> for solana_pubkey::Pubkey {
    type Error = Error;

    fn try_from(addr: &Address) -> Result<Self, Self::Error> {
        if addr.1 != solana_pubkey::PUBKEY_BYTES {
            return Err(addr.length_error("Solana", solana_pubkey::PUBKEY_BYTES));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(addr.as_bytes());
        Ok(solana_pubkey::Pubkey::new_from_array(bytes))
    }
}

impl TryFrom<Address> for solana_pubkey::Pubkey {
    type Error = Error;

    fn try_from(addr: Address) -> Result<Self, Self::Error> {
        Self::try_from(&addr)
    }
}

impl TryFrom<&Address> for TronAddress {
    type Error = Error;

    fn try_from(addr: &Address) -> Result<Self, Self::Error> {
        match addr.1 {
            TRON_ADDRESS_BYTES => TronAddress::from_bytes(addr.as_bytes()),
            EVM_ADDRESS_BYTES => Ok(TronAddress::from_evm(
                alloy_primitives::Address::from_slice(addr.as_bytes()),
            )),
            _ => Err(addr.length_error("TRON", TRON_ADDRESS_BYTES)),
        }
    }
}

impl TryFrom<Address> for TronAddress {
    type Error = Error;

    fn try_from(addr: Address) -> Result<Self, Self::Error> {
        Self::try_from(&addr)
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(addr: alloy_primitives::Address) -> Self {
        Self::from_slice(addr.as_slice())
    }
}

impl From<solana_pubkey::Pubkey> for Address {
    fn from(pubkey: solana_pubkey::Pubkey) -> Self {
        Self::from_slice(&pubkey.to_bytes())
    }
}

impl From<TronAddress> for Address {
    fn from(addr: TronAddress) -> Self {
        Self::from_slice(addr.as_bytes())
    }
}
