//! Durable farm records.
//!
//! [`KvStore`] is the raw string store (Postgres or in-memory). [`FarmKv`]
//! layers the typed records on top of it: farm snapshots, LP APR maps and
//! extended pool liquidity, all JSON encoded.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use crate::{
    cache_keys,
    chain::ChainId,
    error::Error,
    model::{AprMap, ExtendedLiquidityResult, SavedFarmResult},
    provider::DatabasePool,
};

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn put(&self, key: &str, value: String) -> Result<(), Error>;
}

pub struct PostgresKv {
    database: DatabasePool,
}

impl PostgresKv {
    pub fn new(database: DatabasePool) -> Self {
        PostgresKv { database }
    }
}

#[async_trait]
impl KvStore for PostgresKv {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let record = self.database.farm_kv.get(key).await?;
        Ok(record.map(|record| record.value))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), Error> {
        self.database.farm_kv.upsert(key, &value).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), Error> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }
}

#[derive(Clone)]
pub struct FarmKv {
    store: Arc<dyn KvStore>,
}

impl FarmKv {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        FarmKv { store }
    }

    pub fn in_memory() -> Self {
        FarmKv::new(Arc::new(MemoryKv::default()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, Error> {
        match self.store.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn put_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), Error> {
        let value = serde_json::to_string(value)?;
        self.store.put(key, value).await
    }

    pub async fn get_farms(
        &self,
        chain: ChainId,
    ) -> Result<Option<SavedFarmResult>, Error> {
        self.get_json(&cache_keys::farms(chain)).await
    }

    pub async fn save_farms(
        &self,
        chain: ChainId,
        farms: &SavedFarmResult,
    ) -> Result<(), Error> {
        self.put_json(&cache_keys::farms(chain), farms).await
    }

    pub async fn get_apr(&self, chain: ChainId) -> Result<Option<AprMap>, Error> {
        self.get_json(&cache_keys::lp_apr(chain)).await
    }

    pub async fn save_apr(
        &self,
        chain: ChainId,
        apr: &AprMap,
    ) -> Result<(), Error> {
        self.put_json(&cache_keys::lp_apr(chain), apr).await
    }

    pub async fn get_extended_liquidity(
        &self,
        chain: ChainId,
        address: &str,
    ) -> Result<Option<ExtendedLiquidityResult>, Error> {
        self.get_json(&cache_keys::extended_liquidity(chain, address))
            .await
    }

    pub async fn save_extended_liquidity(
        &self,
        chain: ChainId,
        address: &str,
        result: &ExtendedLiquidityResult,
    ) -> Result<(), Error> {
        self.put_json(&cache_keys::extended_liquidity(chain, address), result)
            .await
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }
}
