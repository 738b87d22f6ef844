pub use self::{
    database::DatabasePool,
    farm_config::{FarmConfigSource, HttpFarmConfig},
    indexer::{fetch_all_positions, ExplorerIndexer, PositionIndexer},
    kv::{FarmKv, KvStore, MemoryKv, PostgresKv},
    rpc::{ChainReader, RpcReader},
};

mod database;
mod farm_config;
mod indexer;
mod kv;
mod rpc;
