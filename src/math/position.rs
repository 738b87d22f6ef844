use bigdecimal::{num_bigint::BigUint, Zero};

use super::{get_amount0_delta, get_amount1_delta, get_sqrt_ratio_at_tick};
use crate::error::Error;

/// A position earns fees only while `tick_lower <= tick_current < tick_upper`.
pub fn in_range(tick_current: i32, tick_lower: i32, tick_upper: i32) -> bool {
    tick_lower <= tick_current && tick_current < tick_upper
}

pub fn get_token0_amount(
    tick_current: i32,
    tick_lower: i32,
    tick_upper: i32,
    sqrt_ratio_x96: &BigUint,
    liquidity: &BigUint,
) -> Result<BigUint, Error> {
    if tick_current < tick_lower {
        return get_amount0_delta(
            &get_sqrt_ratio_at_tick(tick_lower)?,
            &get_sqrt_ratio_at_tick(tick_upper)?,
            liquidity,
        );
    }

    if tick_current < tick_upper {
        return get_amount0_delta(
            sqrt_ratio_x96,
            &get_sqrt_ratio_at_tick(tick_upper)?,
            liquidity,
        );
    }

    Ok(BigUint::zero())
}

pub fn get_token1_amount(
    tick_current: i32,
    tick_lower: i32,
    tick_upper: i32,
    sqrt_ratio_x96: &BigUint,
    liquidity: &BigUint,
) -> Result<BigUint, Error> {
    if tick_current < tick_lower {
        return Ok(BigUint::zero());
    }

    if tick_current < tick_upper {
        return get_amount1_delta(
            &get_sqrt_ratio_at_tick(tick_lower)?,
            sqrt_ratio_x96,
            liquidity,
        );
    }

    get_amount1_delta(
        &get_sqrt_ratio_at_tick(tick_lower)?,
        &get_sqrt_ratio_at_tick(tick_upper)?,
        liquidity,
    )
}

#[cfg(test)]
mod tests {
    use bigdecimal::One;

    use super::*;

    #[test]
    fn test_in_range_bounds() {
        assert!(in_range(0, -100, 100));
        assert!(in_range(-100, -100, 100));
        assert!(!in_range(100, -100, 100));
        assert!(!in_range(-101, -100, 100));
    }

    #[test]
    fn test_symmetric_position_at_tick_zero() {
        let q96 = BigUint::one() << 96u32;
        let liquidity = BigUint::from(1000u32);

        let amount0 = get_token0_amount(0, -100, 100, &q96, &liquidity).unwrap();
        let amount1 = get_token1_amount(0, -100, 100, &q96, &liquidity).unwrap();

        assert_eq!(amount0, BigUint::from(4u32));
        assert_eq!(amount1, BigUint::from(4u32));
    }

    #[test]
    fn test_large_liquidity_is_exact() {
        let q96 = BigUint::one() << 96u32;
        let liquidity: BigUint = "1000000000000000000000000".parse().unwrap();

        let amount0 = get_token0_amount(0, -100, 100, &q96, &liquidity).unwrap();
        let amount1 = get_token1_amount(0, -100, 100, &q96, &liquidity).unwrap();

        assert_eq!(amount0.to_string(), "4987272070749096133500");
        assert_eq!(amount1.to_string(), "4987272070749096133500");
    }

    #[test]
    fn test_out_of_range_sides() {
        let q96 = BigUint::one() << 96u32;
        let liquidity = BigUint::from(1_000_000u32);

        // price below the range: only token0
        let below0 = get_token0_amount(0, 10, 20, &q96, &liquidity).unwrap();
        let below1 = get_token1_amount(0, 10, 20, &q96, &liquidity).unwrap();
        assert!(below0 > BigUint::zero());
        assert!(below1.is_zero());

        // price above the range: only token1
        let above0 = get_token0_amount(0, -20, -10, &q96, &liquidity).unwrap();
        let above1 = get_token1_amount(0, -20, -10, &q96, &liquidity).unwrap();
        assert!(above0.is_zero());
        assert!(above1 > BigUint::zero());
    }
}
