use crate::{
    dao::{PoolOption, PoolType},
    error::Error,
    model::{FarmRecord, Table},
};

const MIGRATIONS: &[&str] =
    &[include_str!("../../migration/postgresql/farm_kv.sql")];

#[derive(Debug)]
pub struct DatabasePool {
    pub farm_kv: Table<FarmRecord>,
    pub pool: PoolType,
}

impl DatabasePool {
    pub async fn new(database_url: &str) -> Result<DatabasePool, Error> {
        let pool = PoolOption::new()
            .after_connect(|_conn, _meta| Box::pin(async move { Ok(()) }))
            .max_connections(20)
            .connect(database_url)
            .await?;

        Ok(DatabasePool {
            farm_kv: Table::new(pool.clone()),
            pool,
        })
    }

    pub async fn init_migrations(&self) -> Result<(), Error> {
        for migration in MIGRATIONS {
            sqlx::query(migration).execute(&self.pool).await?;
        }

        Ok(())
    }
}
