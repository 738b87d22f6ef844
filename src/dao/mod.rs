mod farm_kv;

use sqlx::{postgres::PgPoolOptions, PgPool};

pub type PoolType = PgPool;
pub type PoolOption = PgPoolOptions;
