use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    chain::ChainId, configuration::Config, error::Error, model::FarmConfig,
};

/// The published farm lists of a chain.
#[async_trait]
pub trait FarmConfigSource: Send + Sync {
    async fn farms(&self, chain: ChainId) -> Result<Vec<FarmConfig>, Error>;

    /// LPs used only to derive token prices.
    async fn price_helpers(
        &self,
        chain: ChainId,
    ) -> Result<Vec<FarmConfig>, Error>;
}

#[derive(Debug)]
pub struct HttpFarmConfig {
    pub config: Config,
    client: Client,
}

impl HttpFarmConfig {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(HttpFarmConfig {
            config: config.clone(),
            client,
        })
    }

    async fn fetch(&self, url: String) -> Result<Vec<FarmConfig>, Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let json = response.json::<Vec<FarmConfig>>().await?;
        Ok(json)
    }
}

#[async_trait]
impl FarmConfigSource for HttpFarmConfig {
    async fn farms(&self, chain: ChainId) -> Result<Vec<FarmConfig>, Error> {
        self.fetch(self.config.get_farm_config_url(chain)).await
    }

    async fn price_helpers(
        &self,
        chain: ChainId,
    ) -> Result<Vec<FarmConfig>, Error> {
        self.fetch(self.config.get_price_helpers_url(chain)).await
    }
}
