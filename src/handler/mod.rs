pub mod farm_refresher;
pub mod farm_snapshot;
pub mod liquidity;
