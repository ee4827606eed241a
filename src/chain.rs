use {
    crate::{
        SOLANA_MAINNET_ID,
        SOLANA_USDC_TOKEN,
        address::Address,
        error::{Error, Result},
        tokens::*,
    },
    alloy_chains::{Chain, ChainKind, NamedChain},
    std::fmt::Display,
};

pub const TRON_MAINNET: Chain = Chain::from_id_unchecked(TRON_MAINNET_ID);
/// Reowned Chain ID for TRON Mainnet
pub(crate) const TRON_MAINNET_ID: u64 = chain_id_from_reown!("0x2b6653dc");

/// How a chain's transactions are built, signed and sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    Evm,
    Solana,
    Tron,
}

/// Chain ids as used by the DLN API.
///
/// DLN uses internal ids which differ from the EIP-155 ones for some chains.
/// See <https://dln.debridge.finance/v1.0/supported-chains-info>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum DlnChainId {
    Ethereum = 1,
    Optimism = 10,
    Bnb = 56,
    Polygon = 137,
    Fantom = 250,
    Base = 8453,
    Arbitrum = 42161,
    Avalanche = 43114,
    Linea = 59144,
    Solana = 7565164,
    Neon = 100000001,
    Gnosis = 100000002,
    Metis = 100000004,
    Bitrock = 100000005,
    CrossFi = 100000006,
    Zilliqa = 100000008,
    Flow = 100000009,
    Cronos = 100000010,
    Story = 100000013,
    Sonic = 100000014,
    Zircuit = 100000015,
    Abstract = 100000017,
    Berachain = 100000020,
    Bob = 100000021,
    HyperEvm = 100000022,
    Mantle = 100000023,
    Plume = 100000024,
    Sophon = 100000025,
    Tron = 100000026,
    Sei = 100000027,
    Plasma = 100000028,
}

impl DlnChainId {
    pub const ALL: &[DlnChainId] = &[
        Self::Ethereum,
        Self::Optimism,
        Self::Bnb,
        Self::Polygon,
        Self::Fantom,
        Self::Base,
        Self::Arbitrum,
        Self::Avalanche,
        Self::Linea,
        Self::Solana,
        Self::Neon,
        Self::Gnosis,
        Self::Metis,
        Self::Bitrock,
        Self::CrossFi,
        Self::Zilliqa,
        Self::Flow,
        Self::Cronos,
        Self::Story,
        Self::Sonic,
        Self::Zircuit,
        Self::Abstract,
        Self::Berachain,
        Self::Bob,
        Self::HyperEvm,
        Self::Mantle,
        Self::Plume,
        Self::Sophon,
        Self::Tron,
        Self::Sei,
        Self::Plasma,
    ];

    pub const fn id(self) -> u64 {
        self as u64
    }

    pub fn from_id(id: u64) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.id() == id)
    }

    pub const fn family(self) -> ChainFamily {
        match self {
            Self::Solana => ChainFamily::Solana,
            Self::Tron => ChainFamily::Tron,
            _ => ChainFamily::Evm,
        }
    }

    /// The alloy chain for this id, when alloy names it
    pub const fn named_chain(self) -> Option<NamedChain> {
        Some(match self {
            Self::Ethereum => NamedChain::Mainnet,
            Self::Optimism => NamedChain::Optimism,
            Self::Bnb => NamedChain::BinanceSmartChain,
            Self::Polygon => NamedChain::Polygon,
            Self::Fantom => NamedChain::Fantom,
            Self::Base => NamedChain::Base,
            Self::Arbitrum => NamedChain::Arbitrum,
            Self::Avalanche => NamedChain::Avalanche,
            Self::Linea => NamedChain::Linea,
            Self::Gnosis => NamedChain::Gnosis,
            Self::Metis => NamedChain::Metis,
            Self::Cronos => NamedChain::Cronos,
            Self::Story => NamedChain::Story,
            Self::Sonic => NamedChain::Sonic,
            Self::Abstract => NamedChain::Abstract,
            Self::Berachain => NamedChain::Berachain,
            Self::Bob => NamedChain::Bob,
            Self::HyperEvm => NamedChain::Hyperliquid,
            Self::Mantle => NamedChain::Mantle,
            Self::Plume => NamedChain::Plume,
            Self::Sophon => NamedChain::Sophon,
            Self::Sei => NamedChain::Sei,
            Self::Plasma => NamedChain::Plasma,
            Self::Solana
            | Self::Tron
            | Self::Neon
            | Self::Bitrock
            | Self::CrossFi
            | Self::Zilliqa
            | Self::Flow
            | Self::Zircuit => return None,
        })
    }
}

impl Display for DlnChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}({})", self.id())
    }
}

impl TryFrom<u64> for DlnChainId {
    type Error = Error;

    fn try_from(id: u64) -> Result<Self> {
        Self::from_id(id).ok_or_else(|| Error::ChainNotSupported {
            chain: id.to_string(),
        })
    }
}

/// Trait for chains that DLN can bridge from or to
pub trait DlnChain {
    /// The id the DLN API knows this chain by
    fn dln_chain_id(&self) -> Result<DlnChainId>;

    fn family(&self) -> Result<ChainFamily> {
        Ok(self.dln_chain_id()?.family())
    }

    fn is_supported(&self) -> bool {
        self.dln_chain_id().is_ok()
    }

    fn usdc_token_address(&self) -> Result<Address>;
}

impl DlnChain for Chain {
    fn dln_chain_id(&self) -> Result<DlnChainId> {
        match self.kind() {
            ChainKind::Named(n) => n.dln_chain_id(),
            ChainKind::Id(id) => match *id {
                SOLANA_MAINNET_ID => Ok(DlnChainId::Solana),
                TRON_MAINNET_ID => Ok(DlnChainId::Tron),
                _ => Err(Error::ChainNotSupported {
                    chain: self.to_string(),
                }),
            },
        }
    }

    fn usdc_token_address(&self) -> Result<Address> {
        match self.kind() {
            ChainKind::Named(n) => n.usdc_token_address(),
            ChainKind::Id(id) => match *id {
                SOLANA_MAINNET_ID => Ok(SOLANA_USDC_TOKEN.into()),
                _ => Err(Error::ChainNotSupported {
                    chain: self.to_string(),
                }),
            },
        }
    }
}

impl DlnChain for NamedChain {
    fn dln_chain_id(&self) -> Result<DlnChainId> {
        use NamedChain::*;

        match self {
            Mainnet => Ok(DlnChainId::Ethereum),
            Optimism => Ok(DlnChainId::Optimism),
            BinanceSmartChain => Ok(DlnChainId::Bnb),
            Polygon => Ok(DlnChainId::Polygon),
            Fantom => Ok(DlnChainId::Fantom),
            Base => Ok(DlnChainId::Base),
            Arbitrum => Ok(DlnChainId::Arbitrum),
            Avalanche => Ok(DlnChainId::Avalanche),
            Linea => Ok(DlnChainId::Linea),
            Gnosis => Ok(DlnChainId::Gnosis),
            Metis => Ok(DlnChainId::Metis),
            Cronos => Ok(DlnChainId::Cronos),
            Mantle => Ok(DlnChainId::Mantle),
            Story => Ok(DlnChainId::Story),
            Sonic => Ok(DlnChainId::Sonic),
            Abstract => Ok(DlnChainId::Abstract),
            Berachain => Ok(DlnChainId::Berachain),
            Bob => Ok(DlnChainId::Bob),
            Hyperliquid => Ok(DlnChainId::HyperEvm),
            Plume => Ok(DlnChainId::Plume),
            Sophon => Ok(DlnChainId::Sophon),
            Sei => Ok(DlnChainId::Sei),
            Plasma => Ok(DlnChainId::Plasma),
            _ => Err(Error::ChainNotSupported {
                chain: self.to_string(),
            }),
        }
    }

    fn usdc_token_address(&self) -> Result<Address> {
        use NamedChain::*;

        let address: alloy_primitives::Address = match self {
            Mainnet => ETHEREUM_USDC_CONTRACT,
            Arbitrum => ARBITRUM_USDC_CONTRACT,
            Avalanche => AVALANCHE_USDC_CONTRACT,
            Base => BASE_USDC_CONTRACT,
            BinanceSmartChain => BNB_USDC_CONTRACT,
            Optimism => OPTIMISM_USDC_CONTRACT,
            Polygon => POLYGON_USDC_CONTRACT,
            _ => {
                return Err(Error::ChainNotSupported {
                    chain: self.to_string(),
                });
            }
        };

        Ok(address.into())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::SOLANA_MAINNET, rstest::rstest};

    #[rstest]
    #[case(NamedChain::Mainnet, DlnChainId::Ethereum, 1)]
    #[case(NamedChain::Arbitrum, DlnChainId::Arbitrum, 42161)]
    #[case(NamedChain::Polygon, DlnChainId::Polygon, 137)]
    #[case(NamedChain::BinanceSmartChain, DlnChainId::Bnb, 56)]
    #[case(NamedChain::Base, DlnChainId::Base, 8453)]
    #[case(NamedChain::Gnosis, DlnChainId::Gnosis, 100000002)]
    #[case(NamedChain::Mantle, DlnChainId::Mantle, 100000023)]
    #[case(NamedChain::Sonic, DlnChainId::Sonic, 100000014)]
    #[case(NamedChain::Hyperliquid, DlnChainId::HyperEvm, 100000022)]
    #[case(NamedChain::Berachain, DlnChainId::Berachain, 100000020)]
    fn test_dln_chain_id(
        #[case] chain: NamedChain,
        #[case] expected: DlnChainId,
        #[case] id: u64,
    ) -> anyhow::Result<()> {
        assert_eq!(chain.dln_chain_id()?, expected);
        assert_eq!(expected.id(), id);
        assert_eq!(DlnChainId::from_id(id), Some(expected));
        assert_eq!(chain.family()?, ChainFamily::Evm);
        Ok(())
    }

    #[test]
    fn test_every_named_dln_chain_round_trips() -> anyhow::Result<()> {
        for id in DlnChainId::ALL {
            let Some(named) = id.named_chain() else {
                continue;
            };
            assert_eq!(named.dln_chain_id()?, *id, "{named}");
            assert_eq!(Chain::from(named).dln_chain_id()?, *id, "{named}");
            assert_eq!(named.family()?, ChainFamily::Evm);
            assert!(named.is_supported());
        }
        assert_eq!(DlnChainId::Solana.named_chain(), None);
        assert_eq!(DlnChainId::Tron.named_chain(), None);
        Ok(())
    }

    #[rstest]
    #[case(SOLANA_MAINNET, DlnChainId::Solana, ChainFamily::Solana)]
    #[case(TRON_MAINNET, DlnChainId::Tron, ChainFamily::Tron)]
    fn test_non_evm_chains(
        #[case] chain: Chain,
        #[case] expected: DlnChainId,
        #[case] family: ChainFamily,
    ) -> anyhow::Result<()> {
        assert_eq!(chain.dln_chain_id()?, expected);
        assert_eq!(chain.family()?, family);
        assert!(chain.is_supported());
        Ok(())
    }

    #[test]
    fn test_unsupported_chain() {
        assert!(!NamedChain::Sepolia.is_supported());
        assert!(matches!(
            NamedChain::Sepolia.dln_chain_id(),
            Err(Error::ChainNotSupported { .. })
        ));
        assert!(DlnChainId::try_from(7u64).is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        for (i, a) in DlnChainId::ALL.iter().enumerate() {
            for b in &DlnChainId::ALL[i + 1..] {
                assert_ne!(a.id(), b.id(), "{a} and {b} share an id");
            }
        }
    }

    #[rstest]
    #[case(NamedChain::Polygon, POLYGON_USDC_CONTRACT)]
    #[case(NamedChain::Base, BASE_USDC_CONTRACT)]
    #[case(NamedChain::Arbitrum, ARBITRUM_USDC_CONTRACT)]
    #[case(NamedChain::BinanceSmartChain, BNB_USDC_CONTRACT)]
    fn test_usdc_address(
        #[case] chain: NamedChain,
        #[case] expected: alloy_primitives::Address,
    ) -> anyhow::Result<()> {
        let result: alloy_primitives::Address = chain.usdc_token_address()?.try_into()?;
        assert_eq!(result, expected);
        Ok(())
    }

    #[test]
    fn test_sol_usdc_address() -> anyhow::Result<()> {
        let result: solana_pubkey::Pubkey = SOLANA_MAINNET.usdc_token_address()?.try_into()?;
        assert_eq!(result, SOLANA_USDC_TOKEN);
        assert!(TRON_MAINNET.usdc_token_address().is_err());
        Ok(())
    }
}
