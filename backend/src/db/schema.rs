use sqlx::AnyPool;

use crate::config::TableNames;

/// Idempotent schema setup for the three record kinds. Inventory and seat
/// rows are seeded out-of-band; the engine only mutates them.
pub async fn migrate(pool: &AnyPool, tables: &TableNames) -> anyhow::Result<()> {
    // Quantity inventory
    sqlx::query(&format!(
        r#"
CREATE TABLE IF NOT EXISTS {} (
  event_id TEXT PRIMARY KEY,
  remaining BIGINT NOT NULL,
  version BIGINT NOT NULL,
  total_seats BIGINT NOT NULL,
  updated_at TEXT NOT NULL
);
"#,
        tables.inventory
    ))
    .execute(pool)
    .await?;

    // Per-seat status
    sqlx::query(&format!(
        r#"
CREATE TABLE IF NOT EXISTS {} (
  event_id TEXT NOT NULL,
  seat_id TEXT NOT NULL,
  status TEXT NOT NULL,
  reservation_id TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  PRIMARY KEY (event_id, seat_id)
);
"#,
        tables.seats
    ))
    .execute(pool)
    .await?;

    // Idempotency records: k is "{operation}:{reservation_id}"
    sqlx::query(&format!(
        r#"
CREATE TABLE IF NOT EXISTS {} (
  k TEXT PRIMARY KEY,
  op_result TEXT NOT NULL,
  event_id TEXT NOT NULL,
  created_at TEXT NOT NULL,
  expires_at BIGINT NOT NULL
);
"#,
        tables.idempotency
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"CREATE INDEX IF NOT EXISTS idx_{t}_expires ON {t}(expires_at);"#,
        t = tables.idempotency
    ))
    .execute(pool)
    .await?;

    Ok(())
}
