//! Concentrated liquidity math in arbitrary precision.
//!
//! Mirrors the on-chain Q64.96 fixed point formulas, rounding down like the
//! reference SDK does for read-only amount queries.

pub mod position;
pub mod sqrt_price_math;
pub mod tick_math;

pub use position::{get_token0_amount, get_token1_amount, in_range};
pub use sqrt_price_math::{get_amount0_delta, get_amount1_delta};
pub use tick_math::{get_sqrt_ratio_at_tick, MAX_TICK, MIN_TICK};
