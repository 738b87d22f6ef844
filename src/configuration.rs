use std::{
    env, fs, io::ErrorKind, ops::Deref, str::FromStr, sync::Arc,
    time::Duration,
};

use alloy_primitives::Address;
use tracing::info;

use crate::{
    cache::{CachedResponse, TimedCache},
    chain::{ChainId, ChainMap},
    error::Error,
    provider::{
        ChainReader, DatabasePool, ExplorerIndexer, FarmConfigSource, FarmKv,
        HttpFarmConfig, KvStore, MemoryKv, PositionIndexer, PostgresKv,
        RpcReader,
    },
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

pub struct State {
    pub config: Config,
    pub readers: ChainMap<Arc<dyn ChainReader>>,
    pub indexer: Arc<dyn PositionIndexer>,
    pub farm_config: Arc<dyn FarmConfigSource>,
    pub kv: FarmKv,
    pub edge_cache: TimedCache<CachedResponse>,
}

impl State {
    pub async fn new(config: Config) -> Result<State, Error> {
        let store: Arc<dyn KvStore> = match &config.database_url {
            Some(url) => {
                let database = DatabasePool::new(url).await?;
                database.init_migrations().await?;
                Arc::new(PostgresKv::new(database))
            },
            None => {
                info!("DATABASE_URL not set, farm records are kept in memory");
                Arc::new(MemoryKv::default())
            },
        };

        let rpc_timeout = Duration::from_secs(config.timeout);
        let readers = ChainMap::try_from_fn(|chain| {
            let reader =
                RpcReader::new(chain, config.chain(chain).clone(), rpc_timeout)?;
            Ok::<_, Error>(Arc::new(reader) as Arc<dyn ChainReader>)
        })?;
        let indexer = Arc::new(ExplorerIndexer::new(&config)?);
        let farm_config = Arc::new(HttpFarmConfig::new(&config)?);

        Ok(Self::from_parts(
            config,
            readers,
            indexer,
            farm_config,
            FarmKv::new(store),
        ))
    }

    pub fn from_parts(
        config: Config,
        readers: ChainMap<Arc<dyn ChainReader>>,
        indexer: Arc<dyn PositionIndexer>,
        farm_config: Arc<dyn FarmConfigSource>,
        kv: FarmKv,
    ) -> State {
        State {
            config,
            readers,
            indexer,
            farm_config,
            kv,
            edge_cache: TimedCache::new(),
        }
    }

    pub fn reader(&self, chain: ChainId) -> &Arc<dyn ChainReader> {
        self.readers.get(chain)
    }
}

/// The reward token / stable token pair used to price rewards on a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardPair {
    pub address: Address,
    pub reward_token: (Address, u8),
    pub quote_token: (Address, u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chief_farmer: Address,
    pub chief_farmer_extended: Address,
    pub reward_pair: RewardPair,
    pub stable_tokens: Vec<Address>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub timeout: u64,
    pub database_url: Option<String>,
    pub indexer_url: String,
    pub indexer_api_key: String,
    pub farm_config_url: String,
    pub auth: String,
    pub farms_refresh_interval: u64,
    pub max_tasks: usize,
    pub reward_price_feed: Address,
    pub chains: ChainMap<ChainConfig>,
}

impl Config {
    pub fn chain(&self, chain: ChainId) -> &ChainConfig {
        self.chains.get(chain)
    }

    pub fn get_extended_pool_url(&self, slug: &str, address: &str) -> String {
        format!(
            "{}/cached/pools/extended/{}/{}",
            self.indexer_url, slug, address
        )
    }

    pub fn get_extended_positions_url(
        &self,
        slug: &str,
        address: &str,
    ) -> String {
        format!(
            "{}/cached/pools/positions/extended/{}/{}",
            self.indexer_url, slug, address
        )
    }

    pub fn get_farm_config_url(&self, chain: ChainId) -> String {
        format!("{}/{}.json", self.farm_config_url, chain)
    }

    pub fn get_price_helpers_url(&self, chain: ChainId) -> String {
        format!("{}/priceHelperLps/{}.json", self.farm_config_url, chain)
    }
}

pub fn get_configuration() -> Result<Config, Error> {
    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let allowed_origins = env::var("ALLOWED_ORIGINS")?
        .split(',')
        .map(|item| item.trim().to_owned())
        .collect::<Vec<String>>();
    let timeout = env::var("TIMEOUT")?.parse()?;
    let database_url = env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty());
    let indexer_url = env::var("INDEXER_URL")?
        .trim_end_matches('/')
        .to_owned();
    let indexer_api_key = env::var("INDEXER_API_KEY")?;
    let farm_config_url = env::var("FARM_CONFIG_URL")?
        .trim_end_matches('/')
        .to_owned();
    let auth = env::var("AUTH")?;
    let farms_refresh_interval =
        env::var("FARMS_REFRESH_INTERVAL_IN_MINUTES")?.parse()?;
    let max_tasks = env::var("MAX_TASKS")?.parse()?;
    let reward_price_feed = parse_address(
        "REWARD_PRICE_FEED",
        &env::var("REWARD_PRICE_FEED")?,
    )?;

    let chains = ChainMap::try_from_fn(get_chain_configuration)?;

    let config = Config {
        server_host,
        port,
        allowed_origins,
        timeout,
        database_url,
        indexer_url,
        indexer_api_key,
        farm_config_url,
        auth,
        farms_refresh_interval,
        max_tasks,
        reward_price_feed,
        chains,
    };

    Ok(config)
}

fn get_chain_configuration(chain: ChainId) -> Result<ChainConfig, Error> {
    let rpc_url = chain_var("RPC_URL", chain)?;
    let chief_farmer = parse_address(
        "CHIEF_FARMER",
        &chain_var("CHIEF_FARMER", chain)?,
    )?;
    let chief_farmer_extended = parse_address(
        "CHIEF_FARMER_EXTENDED",
        &chain_var("CHIEF_FARMER_EXTENDED", chain)?,
    )?;
    let reward_pair = parse_reward_pair(&chain_var("REWARD_PAIR", chain)?)?;
    let stable_tokens = chain_var("STABLE_TOKENS", chain)?
        .split(',')
        .filter(|item| !item.trim().is_empty())
        .map(|item| parse_address("STABLE_TOKENS", item.trim()))
        .collect::<Result<Vec<Address>, Error>>()?;

    Ok(ChainConfig {
        rpc_url,
        chief_farmer,
        chief_farmer_extended,
        reward_pair,
        stable_tokens,
    })
}

fn chain_var(name: &str, chain: ChainId) -> Result<String, Error> {
    let key = format!("{}_{}", name, chain);
    env::var(&key)
        .map_err(|_| Error::ConfigurationError(format!("{} is missing", key)))
}

fn parse_address(key: &str, value: &str) -> Result<Address, Error> {
    Address::from_str(value).map_err(|_| {
        Error::ConfigurationError(format!("{} is not an address: {}", key, value))
    })
}

/// `pair,reward_token,reward_decimals,quote_token,quote_decimals`
fn parse_reward_pair(value: &str) -> Result<RewardPair, Error> {
    let items: Vec<&str> = value.split(',').map(str::trim).collect();

    if items.len() != 5 {
        return Err(Error::ConfigurationError(format!(
            "REWARD_PAIR expects 5 items, got {}",
            items.len()
        )));
    }

    Ok(RewardPair {
        address: parse_address("REWARD_PAIR", items[0])?,
        reward_token: (
            parse_address("REWARD_PAIR", items[1])?,
            items[2].parse()?,
        ),
        quote_token: (
            parse_address("REWARD_PAIR", items[3])?,
            items[4].parse()?,
        ),
    })
}

pub fn set_configuration() -> Result<(), Error> {
    let config_file: &str = ".env";

    let directory = env!("CARGO_MANIFEST_DIR");
    let path = format!("{}/{}", directory, config_file);

    match fs::read_to_string(path) {
        Ok(config_string) => parse_config_string(config_string),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_config_string(config: String) -> Result<(), Error> {
    let params = config
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='));

    for (key, value) in params {
        env::set_var(key.trim(), value.trim());
    }

    Ok(())
}
