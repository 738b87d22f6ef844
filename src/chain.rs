//! Supported chains and the per-chain lookup table.
//!
//! Every chain the service knows about is a variant of [`ChainId`]. Values
//! that must exist for every chain (RPC clients, contract addresses) live in a
//! [`ChainMap`], which can only be built when all chains have an entry.

use std::{fmt, str::FromStr};

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u64", into = "u64")]
pub enum ChainId {
    Bsc,
    BscTestnet,
    Plexchain,
}

/// Chains with extended (concentrated liquidity) farms indexed by the
/// explorer.
pub const EXTENDED_CHAIN_IDS: [ChainId; 2] = [ChainId::Bsc, ChainId::BscTestnet];

/// Chains with regular farms refreshed by the snapshot job.
pub const FARM_CHAIN_IDS: [ChainId; 3] =
    [ChainId::Bsc, ChainId::BscTestnet, ChainId::Plexchain];

const MULTICALL3: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");
const PLEXCHAIN_MULTICALL3: Address =
    address!("2210e34629E5B17B5F2D875a76098223d71F1D3E");

impl ChainId {
    pub const ALL: [ChainId; 3] =
        [ChainId::Bsc, ChainId::BscTestnet, ChainId::Plexchain];

    pub const fn id(&self) -> u64 {
        match self {
            ChainId::Bsc => 56,
            ChainId::BscTestnet => 97,
            ChainId::Plexchain => 1149,
        }
    }

    pub fn from_id(id: u64) -> Option<ChainId> {
        ChainId::ALL.into_iter().find(|chain| chain.id() == id)
    }

    /// Kebab-case name of the chain's mainnet, as used by the indexer paths.
    pub const fn mainnet_slug(&self) -> &'static str {
        match self {
            ChainId::Bsc | ChainId::BscTestnet => "bsc",
            ChainId::Plexchain => "plexchain",
        }
    }

    pub const fn multicall3(&self) -> Address {
        match self {
            ChainId::Bsc | ChainId::BscTestnet => MULTICALL3,
            ChainId::Plexchain => PLEXCHAIN_MULTICALL3,
        }
    }

    pub fn has_extended_farms(&self) -> bool {
        EXTENDED_CHAIN_IDS.contains(self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for ChainId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .parse::<u64>()
            .ok()
            .and_then(ChainId::from_id)
            .ok_or_else(|| Error::UnsupportedChain(value.to_owned()))
    }
}

impl TryFrom<u64> for ChainId {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        ChainId::from_id(value)
            .ok_or_else(|| Error::UnsupportedChain(value.to_string()))
    }
}

impl From<ChainId> for u64 {
    fn from(chain: ChainId) -> u64 {
        chain.id()
    }
}

/// A value for every [`ChainId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMap<T> {
    bsc: T,
    bsc_testnet: T,
    plexchain: T,
}

impl<T> ChainMap<T> {
    pub fn from_fn(mut f: impl FnMut(ChainId) -> T) -> Self {
        ChainMap {
            bsc: f(ChainId::Bsc),
            bsc_testnet: f(ChainId::BscTestnet),
            plexchain: f(ChainId::Plexchain),
        }
    }

    /// Builds the map, failing on the first chain without a value.
    pub fn try_from_fn<E>(
        mut f: impl FnMut(ChainId) -> Result<T, E>,
    ) -> Result<Self, E> {
        Ok(ChainMap {
            bsc: f(ChainId::Bsc)?,
            bsc_testnet: f(ChainId::BscTestnet)?,
            plexchain: f(ChainId::Plexchain)?,
        })
    }

    pub fn get(&self, chain: ChainId) -> &T {
        match chain {
            ChainId::Bsc => &self.bsc,
            ChainId::BscTestnet => &self.bsc_testnet,
            ChainId::Plexchain => &self.plexchain,
        }
    }
}
