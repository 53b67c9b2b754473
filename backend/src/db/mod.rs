pub mod schema;

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use crate::config::TableNames;

#[derive(Clone)]
pub struct Db {
    pub pool: AnyPool,
}

impl Db {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = AnyPoolOptions::new()
            .max_connections(16)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self, tables: &TableNames) -> anyhow::Result<()> {
        schema::migrate(&self.pool, tables).await
    }
}
