use std::{num::NonZeroU64, str::FromStr, time::Duration};

use bigdecimal::{
    num_bigint::{BigInt, BigUint, Sign},
    BigDecimal, RoundingMode,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    chain::ChainId,
    error::{Error, ValidationIssue},
};

static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("valid address pattern")
});

pub mod cache_control {
    pub const SHORT: &str = "s-maxage=30, max-age=20, stale-while-revalidate=120";
    pub const LONG: &str = "s-maxage=300, max-age=150, stale-while-revalidate=1200";
    pub const NO_CACHE: &str = "no-cache";
}

pub fn is_address(value: &str) -> bool {
    ADDRESS_PATTERN.is_match(value)
}

/// Validates the `{chainId}/{address}` path of the liquidity endpoint.
///
/// Returns the chain and the lower-cased address.
pub fn parse_extended_pool_params(
    chain_id: &str,
    address: &str,
) -> Result<(ChainId, String), Error> {
    let mut issues = vec![];

    let chain = match ChainId::from_str(chain_id) {
        Ok(chain) if chain.has_extended_farms() => Some(chain),
        _ => {
            issues.push(ValidationIssue::new(
                "chainId",
                format!("Unsupported chain {}", chain_id),
            ));
            None
        },
    };

    if !is_address(address) {
        issues.push(ValidationIssue::new(
            "address",
            format!("Invalid address {}", address),
        ));
    }

    match chain {
        Some(chain) if issues.is_empty() => Ok((chain, address.to_lowercase())),
        _ => Err(Error::Validation(issues)),
    }
}

/// Renders `value / 10^decimals` exactly, without trailing zeros.
pub fn format_units(value: &BigUint, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = usize::from(decimals);

    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        integer.to_owned()
    } else {
        format!("{}.{}", integer, fraction)
    }
}

/// Signed variant of [`format_units`], used for oracle answers.
pub fn format_units_signed(value: &BigInt, decimals: u8) -> String {
    let formatted = format_units(value.magnitude(), decimals);
    match value.sign() {
        Sign::Minus => format!("-{}", formatted),
        _ => formatted,
    }
}

/// `value / 10^decimals` as a decimal.
pub fn to_decimal(value: &BigUint, decimals: u8) -> BigDecimal {
    BigDecimal::new(BigInt::from(value.clone()), i64::from(decimals))
}

/// Rounds half-up to `digits` significant digits.
pub fn to_significant(value: &BigDecimal, digits: NonZeroU64) -> BigDecimal {
    value.with_precision_round(digits, RoundingMode::HalfUp)
}

/// Lifetime of a response in the edge cache, from its `Cache-Control` value.
///
/// `s-maxage` wins over `max-age`; responses marked `no-cache`, `no-store` or
/// `private` are not kept.
pub fn edge_ttl(cache_control: &str) -> Option<Duration> {
    let mut max_age = None;
    let mut shared_max_age = None;

    for directive in cache_control.split(',').map(str::trim) {
        let (name, value) = match directive.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (directive, None),
        };

        match (name.to_ascii_lowercase().as_str(), value) {
            ("no-cache" | "no-store" | "private", _) => return None,
            ("s-maxage", Some(value)) => shared_max_age = value.parse().ok(),
            ("max-age", Some(value)) => max_age = value.parse().ok(),
            _ => {},
        }
    }

    shared_max_age
        .or(max_age)
        .filter(|seconds| *seconds > 0)
        .map(Duration::from_secs)
}
