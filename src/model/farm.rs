use std::collections::HashMap;

use alloy_primitives::Address;
use bigdecimal::{num_bigint::BigUint, BigDecimal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// LP address (lowercase) to trading fee APR.
pub type AprMap = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedToken {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_link: Option<String>,
}

/// A farm as published in the static farm configuration lists.
///
/// Price helper LPs carry no `pid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmConfig {
    #[serde(default)]
    pub pid: Option<u64>,
    pub lp_symbol: String,
    pub lp_address: Address,
    pub token: SerializedToken,
    pub quote_token: SerializedToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boosted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_community: Option<bool>,
}

/// Raw chief farmer and LP reads for one farm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmOnChain {
    pub token_balance_lp: BigUint,
    pub quote_token_balance_lp: BigUint,
    pub lp_token_balance_mc: BigUint,
    pub lp_total_supply: BigUint,
    pub alloc_point: BigUint,
    pub is_regular: bool,
}

/// Chain-wide chief farmer reads plus per-farm reads, in farm order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmsOnChain {
    pub pool_length: u64,
    pub total_regular_alloc_point: BigUint,
    pub total_special_alloc_point: BigUint,
    pub regular_waya_per_block: BigUint,
    pub farms: Vec<FarmOnChain>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmWithPrices {
    #[serde(flatten)]
    pub config: FarmConfig,
    pub alloc_point: BigDecimal,
    pub pool_weight: BigDecimal,
    pub multiplier: String,
    pub token_amount_total: BigDecimal,
    pub quote_token_amount_total: BigDecimal,
    pub lp_total_supply: BigDecimal,
    pub lp_total_in_quote_token: BigDecimal,
    pub token_price_vs_quote: BigDecimal,
    pub token_price_busd: BigDecimal,
    pub quote_token_price_busd: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmWithApr {
    #[serde(flatten)]
    pub farm: FarmWithPrices,
    pub waya_apr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lp_apr: Option<f64>,
}

/// Farm snapshot of a chain as persisted by the snapshot job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFarmResult {
    pub updated_at: DateTime<Utc>,
    pub pool_length: u64,
    pub regular_waya_per_block: f64,
    pub data: Vec<FarmWithApr>,
}
