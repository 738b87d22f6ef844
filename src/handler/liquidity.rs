//! Active in-range liquidity of extended farms.
//!
//! Request flow: on-chain pool lookup, durable cache freshness check, live
//! recompute from the indexer raced against [`LIVE_FETCH_TIMEOUT`], and a
//! stale durable entry as fallback when the recompute fails.

use std::{str::FromStr, time::Duration};

use alloy_primitives::Address;
use chrono::Utc;
use tokio::time::timeout;
use tracing::{error, warn};

use crate::{
    chain::ChainId,
    configuration::State,
    error::Error,
    helpers::cache_control,
    model::{ExtendedLiquidityResult, ExtendedPoolInfo, PoolState, Slot0},
    provider::{fetch_all_positions, ChainReader, FarmKv},
};

pub const LIVE_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Durable entries younger than this are served without a recompute.
pub const FRESHNESS_MINUTES: i64 = 5;

/// Results drawn from more positions than this are cached longer.
pub const LONG_CACHE_POSITIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiquidityOutcome {
    Fresh(ExtendedLiquidityResult),
    Computed {
        result: ExtendedLiquidityResult,
        position_count: usize,
    },
    /// Inactive pool or no positions. Never persisted.
    Zero(ExtendedLiquidityResult),
    Stale(ExtendedLiquidityResult),
}

impl LiquidityOutcome {
    pub fn result(&self) -> &ExtendedLiquidityResult {
        match self {
            LiquidityOutcome::Fresh(result)
            | LiquidityOutcome::Computed { result, .. }
            | LiquidityOutcome::Zero(result)
            | LiquidityOutcome::Stale(result) => result,
        }
    }

    pub fn cache_control(&self) -> &'static str {
        match self {
            LiquidityOutcome::Computed { position_count, .. }
                if *position_count > LONG_CACHE_POSITIONS =>
            {
                cache_control::LONG
            },
            LiquidityOutcome::Zero(_) => cache_control::NO_CACHE,
            _ => cache_control::SHORT,
        }
    }
}

/// `address` must already be validated and lower-cased.
pub async fn active_liquidity(
    state: &State,
    chain: ChainId,
    address: &str,
) -> Result<LiquidityOutcome, Error> {
    let pool = Address::from_str(address)?;
    let reader = state.reader(chain).as_ref();

    let (slot0, pool_info) = match lookup_pool(reader, pool).await {
        Ok(lookup) => lookup,
        Err(
            e @ (Error::InvalidLpAddress
            | Error::Slot0NotFound
            | Error::PoolInfoNotFound),
        ) => return Err(e),
        Err(e) => {
            error!("Pool lookup failed for {} on {}: {}", address, chain, e);
            let cached = read_cached(&state.kv, chain, address).await;
            return fallback(cached);
        },
    };

    let cached = read_cached(&state.kv, chain, address).await;
    let now = Utc::now();

    if let Some(cached) = &cached {
        if cached.is_fresh(now, chrono::Duration::minutes(FRESHNESS_MINUTES)) {
            return Ok(LiquidityOutcome::Fresh(cached.clone()));
        }
    }

    if !pool_info.is_active() {
        return Ok(LiquidityOutcome::Zero(ExtendedLiquidityResult::zero(now)));
    }

    let live = fetch_live(state, chain, address, &slot0);

    match timeout(LIVE_FETCH_TIMEOUT, live).await {
        Ok(Ok((_, 0))) => Ok(LiquidityOutcome::Zero(
            ExtendedLiquidityResult::zero(Utc::now()),
        )),
        Ok(Ok((result, position_count))) => {
            let kv = state.kv.clone();
            persist(kv, chain, address.to_owned(), result.clone());
            Ok(LiquidityOutcome::Computed {
                result,
                position_count,
            })
        },
        Ok(Err(e)) => {
            error!("Live fetch failed for {} on {}: {}", address, chain, e);
            fallback(cached)
        },
        Err(_) => {
            warn!(
                "Live fetch for {} on {} timed out after {:?}",
                address, chain, LIVE_FETCH_TIMEOUT
            );
            fallback(cached)
        },
    }
}

async fn lookup_pool(
    reader: &dyn ChainReader,
    pool: Address,
) -> Result<(Slot0, ExtendedPoolInfo), Error> {
    let pid = match reader.extended_pool_pid(pool).await? {
        Some(pid) if pid > 0 => pid,
        _ => return Err(Error::InvalidLpAddress),
    };

    match reader.extended_pool_state(pool, pid).await? {
        (None, _) => Err(Error::Slot0NotFound),
        (_, None) => Err(Error::PoolInfoNotFound),
        (Some(slot0), Some(pool_info)) => Ok((slot0, pool_info)),
    }
}

/// Pool metadata and all positions from the indexer, aggregated.
async fn fetch_live(
    state: &State,
    chain: ChainId,
    address: &str,
    slot0: &Slot0,
) -> Result<(ExtendedLiquidityResult, usize), Error> {
    let slug = chain.mainnet_slug();
    let owner = state
        .config
        .chain(chain)
        .chief_farmer_extended
        .to_string()
        .to_lowercase();
    let indexer = state.indexer.as_ref();

    let (pool, positions) = tokio::try_join!(
        indexer.pool(slug, address),
        fetch_all_positions(indexer, slug, address, &owner),
    )?;

    let pool_state = PoolState::new(slot0, pool);
    let totals = pool_state.active_amounts(&positions)?;
    let result = ExtendedLiquidityResult::from_totals(
        totals,
        &pool_state.pool,
        Utc::now(),
    );

    Ok((result, positions.len()))
}

async fn read_cached(
    kv: &FarmKv,
    chain: ChainId,
    address: &str,
) -> Option<ExtendedLiquidityResult> {
    match kv.get_extended_liquidity(chain, address).await {
        Ok(cached) => cached,
        Err(e) => {
            error!(
                "Durable cache read failed for {} on {}: {}",
                address, chain, e
            );
            None
        },
    }
}

fn fallback(
    cached: Option<ExtendedLiquidityResult>,
) -> Result<LiquidityOutcome, Error> {
    cached
        .map(LiquidityOutcome::Stale)
        .ok_or(Error::LiveFetchFailed)
}

fn persist(
    kv: FarmKv,
    chain: ChainId,
    address: String,
    result: ExtendedLiquidityResult,
) {
    tokio::spawn(async move {
        let saved = kv.save_extended_liquidity(chain, &address, &result).await;
        if let Err(e) = saved {
            error!(
                "Could not persist liquidity of {} on {}: {}",
                address, chain, e
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bigdecimal::num_bigint::BigUint;

    use super::*;
    use crate::{
        model::{FormattedAmounts, TokenAmounts},
        test_support::{
            position, state, FakeFarmConfig, FakeIndexer, FakeReader, POOL,
        },
    };

    fn stored(age: chrono::Duration) -> ExtendedLiquidityResult {
        ExtendedLiquidityResult {
            tvl: TokenAmounts {
                token0: BigUint::from(11u32),
                token1: BigUint::from(22u32),
            },
            formatted: FormattedAmounts {
                token0: String::from("0.000000000000000011"),
                token1: String::from("0.000000000000000022"),
            },
            updated_at: Utc::now() - age,
        }
    }

    fn setup(
        reader: FakeReader,
        indexer: FakeIndexer,
    ) -> (State, Arc<FakeReader>, Arc<FakeIndexer>) {
        let reader = Arc::new(reader);
        let indexer = Arc::new(indexer);
        let state = state(
            reader.clone(),
            indexer.clone(),
            Arc::new(FakeFarmConfig::default()),
        );
        (state, reader, indexer)
    }

    #[tokio::test]
    async fn test_computes_worked_example() {
        let (state, _, _) = setup(
            FakeReader::active_pool(),
            FakeIndexer::with_pages(vec![vec![
                position(-100, 100, "1000"),
                // out of range, ignored
                position(100, 200, "1000000"),
            ]]),
        );

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();

        match &outcome {
            LiquidityOutcome::Computed {
                result,
                position_count,
            } => {
                assert_eq!(result.tvl.token0, BigUint::from(4u32));
                assert_eq!(result.tvl.token1, BigUint::from(4u32));
                assert_eq!(*position_count, 2);
            },
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(outcome.cache_control(), cache_control::SHORT);

        tokio::task::yield_now().await;
        let persisted = state
            .kv
            .get_extended_liquidity(ChainId::Bsc, POOL)
            .await
            .unwrap();
        assert_eq!(persisted.as_ref(), Some(outcome.result()));
    }

    #[tokio::test]
    async fn test_many_positions_get_long_cache() {
        let positions = (0..51).map(|_| position(-100, 100, "1000")).collect();
        let (state, _, _) =
            setup(FakeReader::active_pool(), FakeIndexer::with_pages(vec![positions]));

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();

        assert_eq!(outcome.result().tvl.token0, BigUint::from(204u32));
        assert_eq!(outcome.cache_control(), cache_control::LONG);
    }

    #[tokio::test]
    async fn test_empty_positions_are_not_cached() {
        let (state, _, indexer) =
            setup(FakeReader::active_pool(), FakeIndexer::with_pages(vec![vec![]]));

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();

        assert!(matches!(outcome, LiquidityOutcome::Zero(_)));
        assert_eq!(outcome.cache_control(), cache_control::NO_CACHE);
        assert_eq!(outcome.result().formatted.token0, "0");
        assert!(indexer.calls() > 0);

        tokio::task::yield_now().await;
        assert!(state
            .kv
            .get_extended_liquidity(ChainId::Bsc, POOL)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_inactive_pool_skips_indexer() {
        let reader = FakeReader {
            pool_info: Some(ExtendedPoolInfo {
                alloc_point: BigUint::default(),
                total_liquidity: BigUint::from(1u8),
            }),
            ..FakeReader::active_pool()
        };
        let (state, _, indexer) = setup(
            reader,
            FakeIndexer::with_pages(vec![vec![position(-100, 100, "1000")]]),
        );

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();

        assert!(matches!(outcome, LiquidityOutcome::Zero(_)));
        assert_eq!(indexer.calls(), 0);
    }

    #[tokio::test]
    async fn test_fresh_entry_short_circuits() {
        let (state, _, indexer) = setup(
            FakeReader::active_pool(),
            FakeIndexer::with_pages(vec![vec![position(-100, 100, "1000")]]),
        );
        let entry = stored(chrono::Duration::minutes(4));
        state
            .kv
            .save_extended_liquidity(ChainId::Bsc, POOL, &entry)
            .await
            .unwrap();

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();

        assert_eq!(outcome, LiquidityOutcome::Fresh(entry));
        assert_eq!(outcome.cache_control(), cache_control::SHORT);
        assert_eq!(indexer.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_fallback_on_indexer_failure() {
        let (state, _, _) = setup(FakeReader::active_pool(), FakeIndexer::failing());
        let entry = stored(chrono::Duration::hours(1));
        state
            .kv
            .save_extended_liquidity(ChainId::Bsc, POOL, &entry)
            .await
            .unwrap();

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();

        assert_eq!(outcome, LiquidityOutcome::Stale(entry));
        assert_eq!(outcome.cache_control(), cache_control::SHORT);
    }

    #[tokio::test]
    async fn test_failure_without_fallback() {
        let (state, _, _) = setup(FakeReader::active_pool(), FakeIndexer::failing());

        let result = active_liquidity(&state, ChainId::Bsc, POOL).await;

        assert!(matches!(result, Err(Error::LiveFetchFailed)));
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        let reader = FakeReader {
            transport_error: true,
            ..FakeReader::active_pool()
        };
        let (state, _, indexer) = setup(reader, FakeIndexer::with_pages(vec![]));

        let result = active_liquidity(&state, ChainId::Bsc, POOL).await;
        assert!(matches!(result, Err(Error::LiveFetchFailed)));

        let entry = stored(chrono::Duration::hours(2));
        state
            .kv
            .save_extended_liquidity(ChainId::Bsc, POOL, &entry)
            .await
            .unwrap();

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();
        assert_eq!(outcome, LiquidityOutcome::Stale(entry));
        assert_eq!(indexer.calls(), 0);
    }

    #[tokio::test]
    async fn test_pool_lookup_errors() {
        let cases = [
            (
                FakeReader {
                    pid: None,
                    ..FakeReader::active_pool()
                },
                "Invalid LP address",
            ),
            (
                FakeReader {
                    pid: Some(0),
                    ..FakeReader::active_pool()
                },
                "Invalid LP address",
            ),
            (
                FakeReader {
                    slot0: None,
                    ..FakeReader::active_pool()
                },
                "Slot0 not found",
            ),
            (
                FakeReader {
                    pool_info: None,
                    ..FakeReader::active_pool()
                },
                "PoolInfo not found",
            ),
        ];

        for (reader, message) in cases {
            let (state, _, indexer) =
                setup(reader, FakeIndexer::with_pages(vec![]));

            let error = active_liquidity(&state, ChainId::Bsc, POOL)
                .await
                .unwrap_err();

            assert_eq!(error.to_string(), message);
            assert_eq!(indexer.calls(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_boundary() {
        let entry = stored(chrono::Duration::hours(1));

        // just inside the window: the live result wins
        let (state, _, _) = setup(
            FakeReader::active_pool(),
            FakeIndexer::with_pages(vec![vec![position(-100, 100, "1000")]])
                .with_delay(Duration::from_millis(19_900)),
        );
        state
            .kv
            .save_extended_liquidity(ChainId::Bsc, POOL, &entry)
            .await
            .unwrap();

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();
        assert!(matches!(outcome, LiquidityOutcome::Computed { .. }));

        // just outside: the live result is discarded
        let (state, _, _) = setup(
            FakeReader::active_pool(),
            FakeIndexer::with_pages(vec![vec![position(-100, 100, "1000")]])
                .with_delay(Duration::from_millis(20_100)),
        );
        state
            .kv
            .save_extended_liquidity(ChainId::Bsc, POOL, &entry)
            .await
            .unwrap();

        let outcome = active_liquidity(&state, ChainId::Bsc, POOL).await.unwrap();
        assert_eq!(outcome, LiquidityOutcome::Stale(entry));
    }
}
