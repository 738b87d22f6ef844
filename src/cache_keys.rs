//! Durable store key layout
//!
//! Keys are `<prefix><chainId>` for chain-wide records and
//! `<prefix><chainId>-<address>` for per-pool records.

use crate::chain::ChainId;

pub const FARM_LIST: &str = "farmList:";
pub const LP_APR: &str = "lpApr:";
pub const EXTENDED_LIQUIDITY: &str = "farmExtendedLiquidity:";

pub fn farms(chain: ChainId) -> String {
    format!("{}{}", FARM_LIST, chain)
}

pub fn lp_apr(chain: ChainId) -> String {
    format!("{}{}", LP_APR, chain)
}

/// `address` is expected lower-cased.
pub fn extended_liquidity(chain: ChainId, address: &str) -> String {
    format!("{}{}-{}", EXTENDED_LIQUIDITY, chain, address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(farms(ChainId::Plexchain), "farmList:1149");
        assert_eq!(lp_apr(ChainId::Bsc), "lpApr:56");
        assert_eq!(
            extended_liquidity(
                ChainId::BscTestnet,
                "0x36696169c63e42cd08ce11f5deebbcebae652050"
            ),
            "farmExtendedLiquidity:97-0x36696169c63e42cd08ce11f5deebbcebae652050"
        );
    }
}
