use bigdecimal::{num_bigint::BigUint, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::{error::Error, helpers::format_units};

/// Raw token totals in base units.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmounts {
    #[serde_as(as = "DisplayFromStr")]
    pub token0: BigUint,
    #[serde_as(as = "DisplayFromStr")]
    pub token1: BigUint,
}

impl TokenAmounts {
    pub fn zero() -> Self {
        TokenAmounts {
            token0: BigUint::zero(),
            token1: BigUint::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedAmounts {
    pub token0: String,
    pub token1: String,
}

/// Active in-range liquidity of an extended farm, as served and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedLiquidityResult {
    pub tvl: TokenAmounts,
    pub formatted: FormattedAmounts,
    pub updated_at: DateTime<Utc>,
}

impl ExtendedLiquidityResult {
    pub fn zero(updated_at: DateTime<Utc>) -> Self {
        ExtendedLiquidityResult {
            tvl: TokenAmounts::zero(),
            formatted: FormattedAmounts {
                token0: String::from("0"),
                token1: String::from("0"),
            },
            updated_at,
        }
    }

    pub fn from_totals(
        totals: TokenAmounts,
        pool: &IndexedPool,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let formatted = FormattedAmounts {
            token0: format_units(&totals.token0, pool.token0.decimals),
            token1: format_units(&totals.token1, pool.token1.decimals),
        };

        ExtendedLiquidityResult {
            tvl: totals,
            formatted,
            updated_at,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now < self.updated_at + max_age
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityPosition {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub lower_tick_idx: i32,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub upper_tick_idx: i32,
    #[serde_as(as = "DisplayFromStr")]
    pub liquidity: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsPage {
    pub rows: Vec<LiquidityPosition>,
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedToken {
    pub id: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub decimals: u8,
}

/// Pool token metadata returned by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedPool {
    pub token0: IndexedToken,
    pub token1: IndexedToken,
}

/// `slot0()` of an extended pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: BigUint,
    pub tick: i32,
}

/// `poolInfo(pid)` of the chief farmer extended contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPoolInfo {
    pub alloc_point: BigUint,
    pub total_liquidity: BigUint,
}

impl ExtendedPoolInfo {
    /// Pools without weight or liquidity earn nothing and are never indexed.
    pub fn is_active(&self) -> bool {
        !self.alloc_point.is_zero() && !self.total_liquidity.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub tick: i32,
    pub sqrt_price_x96: BigUint,
    pub pool: IndexedPool,
}

impl PoolState {
    pub fn new(slot0: &Slot0, pool: IndexedPool) -> Self {
        PoolState {
            tick: slot0.tick,
            sqrt_price_x96: slot0.sqrt_price_x96.clone(),
            pool,
        }
    }

    /// Sums the in-range token amounts of `positions`.
    pub fn active_amounts(
        &self,
        positions: &[LiquidityPosition],
    ) -> Result<TokenAmounts, Error> {
        let mut totals = TokenAmounts::zero();

        for position in positions.iter().filter(|p| {
            crate::math::in_range(self.tick, p.lower_tick_idx, p.upper_tick_idx)
        }) {
            totals.token0 += crate::math::get_token0_amount(
                self.tick,
                position.lower_tick_idx,
                position.upper_tick_idx,
                &self.sqrt_price_x96,
                &position.liquidity,
            )?;
            totals.token1 += crate::math::get_token1_amount(
                self.tick,
                position.lower_tick_idx,
                position.upper_tick_idx,
                &self.sqrt_price_x96,
                &position.liquidity,
            )?;
        }

        Ok(totals)
    }
}
