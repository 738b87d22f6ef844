use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    configuration::Config,
    error::Error,
    model::{IndexedPool, LiquidityPosition, PositionsPage},
};

const API_KEY_HEADER: &str = "x-api-key";

/// Read access to the explorer indexer.
#[async_trait]
pub trait PositionIndexer: Send + Sync {
    /// Token metadata of an extended pool.
    async fn pool(&self, slug: &str, address: &str)
        -> Result<IndexedPool, Error>;

    /// One page of the extended positions of `address` held by `owner`.
    async fn positions_page(
        &self,
        slug: &str,
        address: &str,
        owner: &str,
        after: Option<&str>,
    ) -> Result<PositionsPage, Error>;
}

/// Follows `endCursor` until the indexer reports no further pages.
pub async fn fetch_all_positions(
    indexer: &dyn PositionIndexer,
    slug: &str,
    address: &str,
    owner: &str,
) -> Result<Vec<LiquidityPosition>, Error> {
    let mut positions = vec![];
    let mut cursor: Option<String> = None;

    loop {
        let page = indexer
            .positions_page(slug, address, owner, cursor.as_deref())
            .await?;
        positions.extend(page.rows);

        if !page.has_next_page {
            break;
        }

        match page.end_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => {
                cursor = Some(next);
            },
            Some(next) => {
                return Err(Error::IndexerError(format!(
                    "cursor {} repeated for pool {}",
                    next, address
                )));
            },
            None => {
                return Err(Error::IndexerError(format!(
                    "next page without cursor for pool {}",
                    address
                )));
            },
        }
    }

    debug!("Drained {} positions for pool {}", positions.len(), address);

    Ok(positions)
}

#[derive(Debug)]
pub struct ExplorerIndexer {
    pub config: Config,
    client: Client,
}

impl ExplorerIndexer {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(ExplorerIndexer {
            config: config.clone(),
            client,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, Error> {
        let response = request
            .header(API_KEY_HEADER, &self.config.indexer_api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::IndexerError(format!(
                "{} returned {}",
                response.url(),
                status
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PositionIndexer for ExplorerIndexer {
    async fn pool(
        &self,
        slug: &str,
        address: &str,
    ) -> Result<IndexedPool, Error> {
        let url = self.config.get_extended_pool_url(slug, address);
        self.send(self.client.get(url)).await
    }

    async fn positions_page(
        &self,
        slug: &str,
        address: &str,
        owner: &str,
        after: Option<&str>,
    ) -> Result<PositionsPage, Error> {
        let url = self.config.get_extended_positions_url(slug, address);
        let mut query = vec![("owner", owner)];
        if let Some(after) = after {
            query.push(("after", after));
        }

        self.send(self.client.get(url).query(&query)).await
    }
}
