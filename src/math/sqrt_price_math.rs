use bigdecimal::{num_bigint::BigUint, Zero};

use crate::error::Error;

const RESOLUTION: u32 = 96;

/// Amount of token0 between two sqrt prices for `liquidity`, rounded down.
///
/// `((liquidity << 96) * (upper - lower) / upper) / lower`
pub fn get_amount0_delta(
    sqrt_ratio_a: &BigUint,
    sqrt_ratio_b: &BigUint,
    liquidity: &BigUint,
) -> Result<BigUint, Error> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);

    if lower.is_zero() {
        return Err(Error::MathError(String::from(
            "Sqrt price must be positive",
        )));
    }

    let numerator1 = liquidity << RESOLUTION;
    let numerator2 = upper - lower;

    Ok(numerator1 * numerator2 / upper / lower)
}

/// Amount of token1 between two sqrt prices for `liquidity`, rounded down.
///
/// `liquidity * (upper - lower) / 2^96`
pub fn get_amount1_delta(
    sqrt_ratio_a: &BigUint,
    sqrt_ratio_b: &BigUint,
    liquidity: &BigUint,
) -> Result<BigUint, Error> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);

    Ok((liquidity * (upper - lower)) >> RESOLUTION)
}

fn sorted<'a>(a: &'a BigUint, b: &'a BigUint) -> (&'a BigUint, &'a BigUint) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}
