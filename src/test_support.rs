//! In-process fakes of the upstream services, shared by unit tests.

use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use alloy_primitives::Address;
use async_trait::async_trait;
use bigdecimal::num_bigint::{BigInt, BigUint};

use crate::{
    chain::{ChainId, ChainMap},
    configuration::{ChainConfig, Config, RewardPair, State},
    error::Error,
    model::{
        ExtendedPoolInfo, FarmConfig, FarmsOnChain, IndexedPool, IndexedToken,
        LiquidityPosition, PositionsPage, Slot0,
    },
    provider::{ChainReader, FarmConfigSource, FarmKv, PositionIndexer},
};

pub const POOL: &str = "0x36696169c63e42cd08ce11f5deebbcebae652050";
pub const REWARD_TOKEN: &str = "0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82";
pub const STABLE_TOKEN: &str = "0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56";

pub fn address(value: &str) -> Address {
    Address::from_str(value).unwrap()
}

pub fn config() -> Config {
    Config {
        server_host: String::from("127.0.0.1"),
        port: 8080,
        allowed_origins: vec![String::from("*")],
        timeout: 30,
        database_url: None,
        indexer_url: String::from("http://indexer.test"),
        indexer_api_key: String::from("key"),
        farm_config_url: String::from("http://farms.test"),
        auth: String::from("secret"),
        farms_refresh_interval: 5,
        max_tasks: 2,
        reward_price_feed: address("0xB6064eD41d4f67e353768aA239cA86f4F73665a1"),
        chains: ChainMap::from_fn(|_| ChainConfig {
            rpc_url: String::from("http://rpc.test"),
            chief_farmer: address("0x1111111111111111111111111111111111111111"),
            chief_farmer_extended: address(
                "0x2222222222222222222222222222222222222222",
            ),
            reward_pair: RewardPair {
                address: address("0x3333333333333333333333333333333333333333"),
                reward_token: (address(REWARD_TOKEN), 18),
                quote_token: (address(STABLE_TOKEN), 18),
            },
            stable_tokens: vec![address(STABLE_TOKEN)],
        }),
    }
}

pub fn position(lower: i32, upper: i32, liquidity: &str) -> LiquidityPosition {
    LiquidityPosition {
        lower_tick_idx: lower,
        upper_tick_idx: upper,
        liquidity: liquidity.parse().unwrap(),
    }
}

pub fn indexed_pool() -> IndexedPool {
    IndexedPool {
        token0: IndexedToken {
            id: String::from(REWARD_TOKEN).to_lowercase(),
            decimals: 18,
        },
        token1: IndexedToken {
            id: String::from(STABLE_TOKEN).to_lowercase(),
            decimals: 18,
        },
    }
}

#[derive(Debug)]
pub struct FakeIndexer {
    pages: Vec<Vec<LiquidityPosition>>,
    delay: Duration,
    failing: bool,
    broken_cursor: bool,
    calls: AtomicUsize,
    cursors: Mutex<Vec<Option<String>>>,
}

impl FakeIndexer {
    /// Serves `pages` in order; page `n` links to page `n + 1` via cursor
    /// `"n + 1"`.
    pub fn with_pages(pages: Vec<Vec<LiquidityPosition>>) -> Self {
        FakeIndexer {
            pages,
            delay: Duration::ZERO,
            failing: false,
            broken_cursor: false,
            calls: AtomicUsize::new(0),
            cursors: Mutex::new(vec![]),
        }
    }

    pub fn failing() -> Self {
        FakeIndexer {
            failing: true,
            ..FakeIndexer::with_pages(vec![])
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        FakeIndexer { delay, ..self }
    }

    /// Announces a next page without a cursor.
    pub fn without_cursor(self) -> Self {
        FakeIndexer {
            broken_cursor: true,
            ..self
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }

    async fn enter(&self) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if self.failing {
            return Err(Error::IndexerError(String::from("indexer down")));
        }

        Ok(())
    }
}

#[async_trait]
impl PositionIndexer for FakeIndexer {
    async fn pool(
        &self,
        _slug: &str,
        _address: &str,
    ) -> Result<IndexedPool, Error> {
        self.enter().await?;
        Ok(indexed_pool())
    }

    async fn positions_page(
        &self,
        _slug: &str,
        _address: &str,
        _owner: &str,
        after: Option<&str>,
    ) -> Result<PositionsPage, Error> {
        self.enter().await?;
        self.cursors.lock().unwrap().push(after.map(str::to_owned));

        if self.broken_cursor {
            return Ok(PositionsPage {
                rows: vec![],
                has_next_page: true,
                end_cursor: None,
            });
        }

        let index = after.map(|c| c.parse::<usize>().unwrap()).unwrap_or(0);
        let rows = self.pages.get(index).cloned().unwrap_or_default();
        let has_next_page = index + 1 < self.pages.len();

        Ok(PositionsPage {
            rows,
            has_next_page,
            end_cursor: has_next_page.then(|| (index + 1).to_string()),
        })
    }
}

#[derive(Debug)]
pub struct FakeReader {
    pub pid: Option<u64>,
    pub slot0: Option<Slot0>,
    pub pool_info: Option<ExtendedPoolInfo>,
    pub transport_error: bool,
    pub farms_on_chain: Option<FarmsOnChain>,
    pub reserves: (BigUint, BigUint),
    pub answer: BigInt,
    pub calls: AtomicUsize,
}

impl FakeReader {
    /// An active pool at tick 0.
    pub fn active_pool() -> Self {
        FakeReader {
            pid: Some(1),
            slot0: Some(Slot0 {
                sqrt_price_x96: BigUint::from(1u8) << 96,
                tick: 0,
            }),
            pool_info: Some(ExtendedPoolInfo {
                alloc_point: BigUint::from(100u32),
                total_liquidity: BigUint::from(1000u32),
            }),
            transport_error: false,
            farms_on_chain: None,
            reserves: (BigUint::default(), BigUint::default()),
            answer: BigInt::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.transport_error {
            return Err(Error::RpcError(String::from("connection refused")));
        }

        Ok(())
    }
}

#[async_trait]
impl ChainReader for FakeReader {
    async fn extended_pool_pid(
        &self,
        _pool: Address,
    ) -> Result<Option<u64>, Error> {
        self.enter()?;
        Ok(self.pid)
    }

    async fn extended_pool_state(
        &self,
        _pool: Address,
        _pid: u64,
    ) -> Result<(Option<Slot0>, Option<ExtendedPoolInfo>), Error> {
        self.enter()?;
        Ok((self.slot0.clone(), self.pool_info.clone()))
    }

    async fn farms_on_chain(
        &self,
        _farms: &[FarmConfig],
    ) -> Result<FarmsOnChain, Error> {
        self.enter()?;
        self.farms_on_chain
            .clone()
            .ok_or_else(|| Error::RpcError(String::from("no farms")))
    }

    async fn pair_reserves(
        &self,
        _pair: Address,
    ) -> Result<(BigUint, BigUint), Error> {
        self.enter()?;
        Ok(self.reserves.clone())
    }

    async fn latest_answer(&self, _feed: Address) -> Result<BigInt, Error> {
        self.enter()?;
        Ok(self.answer.clone())
    }
}

#[derive(Debug, Default)]
pub struct FakeFarmConfig {
    pub farms: Vec<FarmConfig>,
    /// `None` makes the price helper list fail.
    pub price_helpers: Option<Vec<FarmConfig>>,
}

#[async_trait]
impl FarmConfigSource for FakeFarmConfig {
    async fn farms(&self, _chain: ChainId) -> Result<Vec<FarmConfig>, Error> {
        Ok(self.farms.clone())
    }

    async fn price_helpers(
        &self,
        _chain: ChainId,
    ) -> Result<Vec<FarmConfig>, Error> {
        self.price_helpers
            .clone()
            .ok_or_else(|| Error::NotFound(String::from("price helpers")))
    }
}

pub fn state(
    reader: Arc<FakeReader>,
    indexer: Arc<FakeIndexer>,
    farm_config: Arc<FakeFarmConfig>,
) -> State {
    State::from_parts(
        config(),
        ChainMap::from_fn(|_| reader.clone() as Arc<dyn ChainReader>),
        indexer,
        farm_config,
        FarmKv::in_memory(),
    )
}
