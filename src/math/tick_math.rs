use bigdecimal::{num_bigint::BigUint, One, Zero};
use once_cell::sync::Lazy;

use crate::error::Error;

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// `1 / sqrt(1.0001)^(2^i)` in Q128.128 for every bit `i` of the tick.
const TICK_RATIOS: [u128; 20] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

static MAX_UINT256: Lazy<BigUint> =
    Lazy::new(|| (BigUint::one() << 256u32) - BigUint::one());

/// Returns `sqrt(1.0001^tick) * 2^96`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<BigUint, Error> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(Error::MathError(format!("Tick {} out of range", tick)));
    }

    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        BigUint::from(TICK_RATIOS[0])
    } else {
        BigUint::one() << 128u32
    };

    for (bit, multiplier) in TICK_RATIOS.iter().enumerate().skip(1) {
        if abs_tick & (1 << bit) != 0 {
            ratio = (ratio * BigUint::from(*multiplier)) >> 128u32;
        }
    }

    if tick > 0 {
        ratio = &*MAX_UINT256 / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let remainder = &ratio % (BigUint::one() << 32u32);
    let mut sqrt_price = ratio >> 32u32;
    if !remainder.is_zero() {
        sqrt_price += 1u32;
    }

    Ok(sqrt_price)
}
