//! Background farm snapshot refresh.
//!
//! Rebuilds the farm snapshot of every farm chain on startup and then on a
//! fixed interval, with at most `MAX_TASKS` chains in flight.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::{
    chain::{ChainId, FARM_CHAIN_IDS},
    configuration::{AppState, State},
    error::Error,
    handler::farm_snapshot::save_farms,
};

/// Edge cache sweep period.
const EDGE_CACHE_CLEANUP_SECS: u64 = 60;

pub async fn farms_refresh_task(app_state: AppState<State>) -> Result<(), Error> {
    info!("Starting farms refresh background task");

    let period = app_state.config.farms_refresh_interval.max(1) * 60;
    let mut check_interval = interval(Duration::from_secs(period));

    loop {
        // the first tick completes immediately
        check_interval.tick().await;
        refresh_all_chains(&app_state).await;
    }
}

/// Drops expired edge cache entries so idle keys do not accumulate.
pub async fn edge_cache_cleanup_task(
    app_state: AppState<State>,
) -> Result<(), Error> {
    let mut check_interval =
        interval(Duration::from_secs(EDGE_CACHE_CLEANUP_SECS));

    loop {
        check_interval.tick().await;
        app_state.edge_cache.cleanup_expired().await;
        debug!("Edge cache holds {} entries", app_state.edge_cache.len().await);
    }
}

/// Returns the chains whose refresh failed.
pub async fn refresh_all_chains(app_state: &AppState<State>) -> Vec<ChainId> {
    let max_tasks = app_state.config.max_tasks.max(1);

    let results: Vec<_> = stream::iter(FARM_CHAIN_IDS)
        .map(|chain| {
            let app_state = app_state.clone();
            async move {
                let result = save_farms(&app_state, chain).await;
                (chain, result)
            }
        })
        .buffer_unordered(max_tasks)
        .collect()
        .await;

    let mut failed = vec![];
    for (chain, result) in results {
        match result {
            Ok(saved) => {
                debug!("Refreshed {} farms on {}", saved.data.len(), chain)
            },
            Err(e) => {
                warn!("Failed to refresh farms on {}: {}", chain, e);
                failed.push(chain);
            },
        }
    }

    if !failed.is_empty() {
        error!(
            "Farms refresh finished with {} failed chains: {:?}",
            failed.len(),
            failed
        );
    }

    failed
}
