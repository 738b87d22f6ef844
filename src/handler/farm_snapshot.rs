//! Farm list snapshots: farm config merged with on-chain reserves,
//! allocation and the reward rate, priced and turned into APRs.

use std::{collections::HashMap, num::NonZeroU64};

use alloy_primitives::Address;
use bigdecimal::{
    num_bigint::BigUint, BigDecimal, RoundingMode, ToPrimitive, Zero,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    chain::ChainId,
    configuration::{RewardPair, State},
    error::Error,
    helpers::{to_decimal, to_significant},
    model::{
        AprMap, FarmConfig, FarmOnChain, FarmWithApr, FarmWithPrices,
        FarmsOnChain, SavedFarmResult,
    },
    provider::ChainReader,
};

const BLOCK_TIME_SECONDS: u64 = 3;

/// (60 / 3) * 60 * 24 * 365
pub const BLOCKS_PER_YEAR: u64 = (60 / BLOCK_TIME_SECONDS) * 60 * 24 * 365;

/// Tokens not paired with a stable token directly are priced through at
/// most this many intermediate farms.
const MAX_PRICE_HOPS: usize = 2;

const REWARD_PRICE_DIGITS: u64 = 3;

/// Rebuilds the farm snapshot of `chain` and persists it in the background.
pub async fn save_farms(
    state: &State,
    chain: ChainId,
) -> Result<SavedFarmResult, Error> {
    let chain_config = state.config.chain(chain);
    let reader = state.reader(chain).as_ref();

    let farms = state.farm_config.farms(chain).await?;
    let price_helpers = match state.farm_config.price_helpers(chain).await {
        Ok(helpers) => helpers,
        Err(e) => {
            error!("Get LP price helpers error on {}: {}", chain, e);
            vec![]
        },
    };

    let configs = farms
        .into_iter()
        .filter(|farm| farm.pid != Some(0))
        .chain(price_helpers)
        .collect::<Vec<FarmConfig>>();

    let on_chain = reader.farms_on_chain(&configs).await?;
    let farms_with_prices =
        get_farms_prices(configs, &on_chain, &chain_config.stable_tokens)?;

    let reward_price =
        get_reward_price(reader, &chain_config.reward_pair).await?;
    let regular_waya_per_block =
        to_decimal(&on_chain.regular_waya_per_block, 18);

    let apr_map = match state.kv.get_apr(chain).await {
        Ok(apr_map) => apr_map.unwrap_or_default(),
        Err(e) => {
            warn!("LP APR map unavailable on {}: {}", chain, e);
            AprMap::new()
        },
    };

    let data = farms_with_prices
        .into_iter()
        .map(|farm| {
            let waya_apr = get_farm_waya_reward_apr(
                &farm,
                reward_price.as_ref(),
                &regular_waya_per_block,
            );
            let lp_apr = apr_map
                .get(&farm.config.lp_address.to_string().to_lowercase())
                .copied();

            FarmWithApr {
                farm,
                waya_apr,
                lp_apr,
            }
        })
        .collect::<Vec<FarmWithApr>>();

    let saved = SavedFarmResult {
        updated_at: Utc::now(),
        pool_length: on_chain.pool_length,
        regular_waya_per_block: regular_waya_per_block.to_f64().ok_or_else(
            || {
                Error::MathError(format!(
                    "wayaPerBlock {} is not representable",
                    regular_waya_per_block
                ))
            },
        )?,
        data,
    };

    let kv = state.kv.clone();
    let snapshot = saved.clone();
    tokio::spawn(async move {
        if let Err(e) = kv.save_farms(chain, &snapshot).await {
            error!("Could not persist farms of {}: {}", chain, e);
        }
    });

    info!("Saved {} farms on {}", saved.data.len(), chain);

    Ok(saved)
}

/// Per-farm amounts, weights and prices.
pub fn get_farms_prices(
    configs: Vec<FarmConfig>,
    on_chain: &FarmsOnChain,
    stable_tokens: &[Address],
) -> Result<Vec<FarmWithPrices>, Error> {
    if configs.len() != on_chain.farms.len() {
        return Err(Error::RpcError(format!(
            "{} farm configs but {} on-chain reads",
            configs.len(),
            on_chain.farms.len()
        )));
    }

    let farms = configs
        .into_iter()
        .zip(on_chain.farms.iter())
        .map(|(config, data)| farm_amounts(config, data, on_chain))
        .collect::<Vec<FarmWithPrices>>();

    let prices = token_prices(&farms, stable_tokens);
    let price_of = |token: &Address| {
        prices.get(token).cloned().unwrap_or_else(BigDecimal::zero)
    };

    Ok(farms
        .into_iter()
        .map(|farm| FarmWithPrices {
            token_price_busd: price_of(&farm.config.token.address),
            quote_token_price_busd: price_of(&farm.config.quote_token.address),
            ..farm
        })
        .collect())
}

fn farm_amounts(
    config: FarmConfig,
    data: &FarmOnChain,
    on_chain: &FarmsOnChain,
) -> FarmWithPrices {
    let token_amount_total =
        to_decimal(&data.token_balance_lp, config.token.decimals);
    let quote_token_amount_total =
        to_decimal(&data.quote_token_balance_lp, config.quote_token.decimals);
    let lp_total_supply = to_decimal(&data.lp_total_supply, 18);

    let lp_token_ratio = ratio(
        &to_decimal(&data.lp_token_balance_mc, 18),
        &lp_total_supply,
    );
    let lp_total_in_quote_token =
        &quote_token_amount_total * &lp_token_ratio * BigDecimal::from(2);
    let token_price_vs_quote =
        ratio(&quote_token_amount_total, &token_amount_total);

    let total_alloc_point = if data.is_regular {
        &on_chain.total_regular_alloc_point
    } else {
        &on_chain.total_special_alloc_point
    };
    let alloc_point = to_decimal(&data.alloc_point, 0);
    let pool_weight = ratio(&alloc_point, &to_decimal(total_alloc_point, 0));
    let multiplier = alloc_point.clone() / BigDecimal::from(10);
    let multiplier = format!("{}X", multiplier.normalized());

    FarmWithPrices {
        config,
        alloc_point,
        pool_weight: pool_weight.normalized(),
        multiplier,
        token_amount_total: token_amount_total.normalized(),
        quote_token_amount_total: quote_token_amount_total.normalized(),
        lp_total_supply: lp_total_supply.normalized(),
        lp_total_in_quote_token: lp_total_in_quote_token.normalized(),
        token_price_vs_quote: token_price_vs_quote.normalized(),
        token_price_busd: BigDecimal::zero(),
        quote_token_price_busd: BigDecimal::zero(),
    }
}

/// Stable tokens are worth 1; every other token is priced through a farm
/// pairing it with an already priced token.
fn token_prices(
    farms: &[FarmWithPrices],
    stable_tokens: &[Address],
) -> HashMap<Address, BigDecimal> {
    let mut prices = stable_tokens
        .iter()
        .map(|token| (*token, BigDecimal::from(1)))
        .collect::<HashMap<Address, BigDecimal>>();

    for _ in 0..=MAX_PRICE_HOPS {
        let known = prices.clone();

        for farm in farms {
            if farm.token_price_vs_quote.is_zero() {
                continue;
            }

            let token = farm.config.token.address;
            let quote = farm.config.quote_token.address;

            match (known.get(&token), known.get(&quote)) {
                (None, Some(quote_price)) => {
                    prices.entry(token).or_insert_with(|| {
                        (quote_price * &farm.token_price_vs_quote).normalized()
                    });
                },
                (Some(token_price), None) => {
                    prices.entry(quote).or_insert_with(|| {
                        (token_price / &farm.token_price_vs_quote).normalized()
                    });
                },
                _ => {},
            }
        }
    }

    prices
}

/// Price of the reward token in the pair's quote token, three significant
/// digits. `None` when the pair holds no reward tokens.
pub async fn get_reward_price(
    reader: &dyn ChainReader,
    pair: &RewardPair,
) -> Result<Option<BigDecimal>, Error> {
    let (reserve0, reserve1) = reader.pair_reserves(pair.address).await?;
    Ok(reward_price_from_reserves(pair, &reserve0, &reserve1))
}

fn reward_price_from_reserves(
    pair: &RewardPair,
    reserve0: &BigUint,
    reserve1: &BigUint,
) -> Option<BigDecimal> {
    let (reward, quote) = pair_reserves_by_token(pair, reserve0, reserve1);
    let (_, reward_decimals) = pair.reward_token;
    let (_, quote_decimals) = pair.quote_token;

    if reward.is_zero() {
        return None;
    }

    let price =
        to_decimal(quote, quote_decimals) / to_decimal(reward, reward_decimals);
    let digits = NonZeroU64::new(REWARD_PRICE_DIGITS)?;

    Some(to_significant(&price, digits).normalized())
}

/// Pairs order their reserves by token address.
fn pair_reserves_by_token<'a>(
    pair: &RewardPair,
    reserve0: &'a BigUint,
    reserve1: &'a BigUint,
) -> (&'a BigUint, &'a BigUint) {
    let (reward_token, _) = pair.reward_token;
    let (quote_token, _) = pair.quote_token;

    if reward_token < quote_token {
        (reserve0, reserve1)
    } else {
        (reserve1, reserve0)
    }
}

/// Yearly reward value over staked liquidity, in percent with two decimals.
pub fn get_farm_waya_reward_apr(
    farm: &FarmWithPrices,
    waya_price_busd: Option<&BigDecimal>,
    regular_waya_per_block: &BigDecimal,
) -> String {
    let zero = String::from("0");

    let Some(waya_price_busd) = waya_price_busd else {
        return zero;
    };

    let total_liquidity =
        &farm.lp_total_in_quote_token * &farm.quote_token_price_busd;
    if total_liquidity.is_zero() || farm.pool_weight.is_zero() {
        return zero;
    }

    let yearly_waya_reward_allocation = &farm.pool_weight
        * BigDecimal::from(BLOCKS_PER_YEAR)
        * regular_waya_per_block;
    let waya_rewards_apr = yearly_waya_reward_allocation * waya_price_busd
        / total_liquidity
        * BigDecimal::from(100);

    if waya_rewards_apr.is_zero() {
        return zero;
    }

    waya_rewards_apr
        .with_scale_round(2, RoundingMode::HalfUp)
        .to_string()
}

fn ratio(numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
    if denominator.is_zero() {
        return BigDecimal::zero();
    }

    numerator / denominator
}
