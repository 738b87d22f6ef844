use sqlx::Error;

use crate::model::{FarmRecord, Table};

impl Table<FarmRecord> {
    pub async fn get(&self, key: &str) -> Result<Option<FarmRecord>, Error> {
        const SQL: &str = r#"
        SELECT "key", "value", "updated_at"
        FROM "farm_kv"
        WHERE "key" = $1
        "#;

        sqlx::query_as(SQL).bind(key).fetch_optional(&self.pool).await
    }

    /// Last writer wins.
    pub async fn upsert(&self, key: &str, value: &str) -> Result<(), Error> {
        const SQL: &str = r#"
        INSERT INTO "farm_kv" (
            "key",
            "value",
            "updated_at"
        )
        VALUES ($1, $2, NOW())
        ON CONFLICT ("key") DO UPDATE
        SET "value" = EXCLUDED."value",
            "updated_at" = EXCLUDED."updated_at"
        "#;

        sqlx::query(SQL)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map(drop)
    }
}
