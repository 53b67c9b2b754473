use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{AnyPool, Row};

use crate::config::TableNames;
use crate::store::port::{
    IdempotencyRow, InventoryGuard, InventoryRow, SeatGuard, SeatRow, SeatWrite, StoreError,
    StorePort,
};

/// SQL-backed Store Port over `sqlx::Any` (sqlite or postgres).
///
/// Dialect notes:
/// - conditional updates are `UPDATE .. WHERE <predicate>` checked through
///   `rows_affected()`: the predicate is evaluated atomically with the write
///   and a miss is a `ConditionFailed`, never a silent no-op;
/// - the seat-commit predicate (absent, or AVAILABLE, or owned by this
///   reservation) is the insert-or-guarded-update form of
///   `INSERT .. ON CONFLICT DO UPDATE .. WHERE`;
/// - multi-seat writes run inside one transaction and roll back whenever an
///   aborting guard misses.
pub struct SqlxStorePort {
    pool: AnyPool,
    tables: TableNames,
    call_timeout: Duration,
    max_read_retries: u32,
}

impl SqlxStorePort {
    pub fn new(
        pool: AnyPool,
        tables: TableNames,
        call_timeout: Duration,
        max_read_retries: u32,
    ) -> Self {
        Self {
            pool,
            tables,
            call_timeout,
            max_read_retries,
        }
    }

    async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    async fn get_inventory_once(&self, event_id: &str) -> Result<Option<InventoryRow>, StoreError> {
        let sql = format!(
            "SELECT event_id, remaining, version, total_seats, updated_at FROM {} WHERE event_id = ?",
            self.tables.inventory
        );
        let row = sqlx::query(&sql)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| InventoryRow {
            event_id: r.get("event_id"),
            remaining: r.get("remaining"),
            version: r.get("version"),
            total_seats: r.get("total_seats"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn batch_get_seats_once(
        &self,
        event_id: &str,
        seat_ids: &[String],
    ) -> Result<Vec<SeatRow>, StoreError> {
        let placeholders = vec!["?"; seat_ids.len()].join(", ");
        let sql = format!(
            "SELECT event_id, seat_id, status, reservation_id, updated_at FROM {} \
             WHERE event_id = ? AND seat_id IN ({placeholders})",
            self.tables.seats
        );
        let mut query = sqlx::query(&sql).bind(event_id);
        for id in seat_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| SeatRow {
                event_id: r.get("event_id"),
                seat_id: r.get("seat_id"),
                status: r.get("status"),
                reservation_id: r.get("reservation_id"),
                updated_at: r.get("updated_at"),
            })
            .collect())
    }

    async fn get_idempotency_once(
        &self,
        key: &str,
        now_epoch: i64,
    ) -> Result<Option<IdempotencyRow>, StoreError> {
        let sql = format!(
            "SELECT k, op_result, event_id, created_at, expires_at FROM {} \
             WHERE k = ? AND expires_at > ?",
            self.tables.idempotency
        );
        let row = sqlx::query(&sql)
            .bind(key)
            .bind(now_epoch)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| IdempotencyRow {
            k: r.get("k"),
            op_result: r.get("op_result"),
            event_id: r.get("event_id"),
            created_at: r.get("created_at"),
            expires_at: r.get("expires_at"),
        }))
    }

    async fn transact_write_seats_inner(&self, writes: &[SeatWrite]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let sold_sql = format!(
            r#"
INSERT INTO {t} (event_id, seat_id, status, reservation_id, updated_at)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT (event_id, seat_id) DO UPDATE
SET status = excluded.status,
    reservation_id = excluded.reservation_id,
    updated_at = excluded.updated_at
WHERE {t}.status = 'AVAILABLE'
   OR ({t}.status IN ('HOLD', 'SOLD') AND {t}.reservation_id = ?)
"#,
            t = self.tables.seats
        );
        let held_sql = format!(
            "UPDATE {} SET status = ?, reservation_id = ?, updated_at = ? \
             WHERE event_id = ? AND seat_id = ? AND status = 'HOLD' AND reservation_id = ?",
            self.tables.seats
        );

        let mut rejected = Vec::new();
        for w in writes {
            match &w.guard {
                SeatGuard::AvailableOrOwnedBy(rid) => {
                    let res = sqlx::query(&sold_sql)
                        .bind(&w.event_id)
                        .bind(&w.seat_id)
                        .bind(&w.status)
                        .bind(&w.reservation_id)
                        .bind(&w.updated_at)
                        .bind(rid)
                        .execute(&mut *tx)
                        .await?;
                    if res.rows_affected() != 1 {
                        rejected.push(w.seat_id.clone());
                    }
                }
                SeatGuard::HeldBy(rid) => {
                    // 0 rows affected is an idempotent skip, not an abort.
                    sqlx::query(&held_sql)
                        .bind(&w.status)
                        .bind(&w.reservation_id)
                        .bind(&w.updated_at)
                        .bind(&w.event_id)
                        .bind(&w.seat_id)
                        .bind(rid)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        if !rejected.is_empty() {
            tx.rollback().await?;
            return Err(StoreError::ConditionFailed {
                unavailable: rejected,
            });
        }

        tx.commit().await?;
        Ok(())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
impl StorePort for SqlxStorePort {
    async fn get_inventory(&self, event_id: &str) -> Result<Option<InventoryRow>, StoreError> {
        let mut attempt = 0u32;
        loop {
            match self.with_deadline(self.get_inventory_once(event_id)).await {
                Err(StoreError::Backend(msg)) if attempt < self.max_read_retries => {
                    attempt += 1;
                    tracing::warn!(target: "store", attempt, error = %msg, "inventory read failed; retrying");
                    tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                }
                other => return other,
            }
        }
    }

    async fn put_inventory(&self, row: &InventoryRow) -> Result<(), StoreError> {
        let sql = format!(
            r#"
INSERT INTO {} (event_id, remaining, version, total_seats, updated_at)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT (event_id) DO UPDATE
SET remaining = excluded.remaining,
    version = excluded.version,
    total_seats = excluded.total_seats,
    updated_at = excluded.updated_at
"#,
            self.tables.inventory
        );
        self.with_deadline(async {
            sqlx::query(&sql)
                .bind(&row.event_id)
                .bind(row.remaining)
                .bind(row.version)
                .bind(row.total_seats)
                .bind(&row.updated_at)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn update_inventory(
        &self,
        event_id: &str,
        delta: i64,
        guard: InventoryGuard,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        match guard {
            InventoryGuard::RemainingAtVersion {
                min_remaining,
                version,
            } => {
                let sql = format!(
                    "UPDATE {} SET remaining = remaining + ?, version = version + 1, updated_at = ? \
                     WHERE event_id = ? AND remaining >= ? AND version = ?",
                    self.tables.inventory
                );
                self.with_deadline(async {
                    let res = sqlx::query(&sql)
                        .bind(delta)
                        .bind(updated_at)
                        .bind(event_id)
                        .bind(min_remaining)
                        .bind(version)
                        .execute(&self.pool)
                        .await?;
                    if res.rows_affected() == 1 {
                        Ok(())
                    } else {
                        Err(StoreError::ConditionFailed {
                            unavailable: vec![],
                        })
                    }
                })
                .await
            }
            InventoryGuard::Unconditional => {
                let sql = format!(
                    "UPDATE {} SET remaining = CASE \
                       WHEN remaining + ? > total_seats THEN total_seats \
                       WHEN remaining + ? < 0 THEN 0 \
                       ELSE remaining + ? END, \
                     updated_at = ? WHERE event_id = ?",
                    self.tables.inventory
                );
                self.with_deadline(async {
                    let res = sqlx::query(&sql)
                        .bind(delta)
                        .bind(delta)
                        .bind(delta)
                        .bind(updated_at)
                        .bind(event_id)
                        .execute(&self.pool)
                        .await?;
                    if res.rows_affected() == 1 {
                        Ok(())
                    } else {
                        Err(StoreError::NotFound)
                    }
                })
                .await
            }
        }
    }

    async fn batch_get_seats(
        &self,
        event_id: &str,
        seat_ids: &[String],
    ) -> Result<Vec<SeatRow>, StoreError> {
        if seat_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut attempt = 0u32;
        loop {
            match self
                .with_deadline(self.batch_get_seats_once(event_id, seat_ids))
                .await
            {
                Err(StoreError::Backend(msg)) if attempt < self.max_read_retries => {
                    attempt += 1;
                    tracing::warn!(target: "store", attempt, error = %msg, "seat batch read failed; retrying");
                    tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                }
                other => return other,
            }
        }
    }

    async fn put_seat(&self, row: &SeatRow) -> Result<(), StoreError> {
        let sql = format!(
            r#"
INSERT INTO {} (event_id, seat_id, status, reservation_id, updated_at)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT (event_id, seat_id) DO UPDATE
SET status = excluded.status,
    reservation_id = excluded.reservation_id,
    updated_at = excluded.updated_at
"#,
            self.tables.seats
        );
        self.with_deadline(async {
            sqlx::query(&sql)
                .bind(&row.event_id)
                .bind(&row.seat_id)
                .bind(&row.status)
                .bind(&row.reservation_id)
                .bind(&row.updated_at)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn transact_write_seats(&self, writes: &[SeatWrite]) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }
        self.with_deadline(self.transact_write_seats_inner(writes))
            .await
    }

    async fn get_idempotency(
        &self,
        key: &str,
        now_epoch: i64,
    ) -> Result<Option<IdempotencyRow>, StoreError> {
        let mut attempt = 0u32;
        loop {
            match self
                .with_deadline(self.get_idempotency_once(key, now_epoch))
                .await
            {
                Err(StoreError::Backend(msg)) if attempt < self.max_read_retries => {
                    attempt += 1;
                    tracing::warn!(target: "store", attempt, error = %msg, "idempotency read failed; retrying");
                    tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                }
                other => return other,
            }
        }
    }

    async fn put_idempotency_if_absent(
        &self,
        row: &IdempotencyRow,
        now_epoch: i64,
    ) -> Result<(), StoreError> {
        // First writer wins; an expired row counts as absent and is replaced.
        let sql = format!(
            r#"
INSERT INTO {t} (k, op_result, event_id, created_at, expires_at)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT (k) DO UPDATE
SET op_result = excluded.op_result,
    event_id = excluded.event_id,
    created_at = excluded.created_at,
    expires_at = excluded.expires_at
WHERE {t}.expires_at <= ?
"#,
            t = self.tables.idempotency
        );
        self.with_deadline(async {
            let res = sqlx::query(&sql)
                .bind(&row.k)
                .bind(&row.op_result)
                .bind(&row.event_id)
                .bind(&row.created_at)
                .bind(row.expires_at)
                .bind(now_epoch)
                .execute(&self.pool)
                .await?;
            if res.rows_affected() == 1 {
                Ok(())
            } else {
                Err(StoreError::ConditionFailed {
                    unavailable: vec![],
                })
            }
        })
        .await
    }

    async fn delete_idempotency(&self, key: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE k = ?", self.tables.idempotency);
        self.with_deadline(async {
            sqlx::query(&sql).bind(key).execute(&self.pool).await?;
            Ok(())
        })
        .await
    }

    async fn delete_expired_idempotency(&self, now_epoch: i64) -> Result<u64, StoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE expires_at <= ?",
            self.tables.idempotency
        );
        self.with_deadline(async {
            let res = sqlx::query(&sql)
                .bind(now_epoch)
                .execute(&self.pool)
                .await?;
            Ok(res.rows_affected())
        })
        .await
    }
}
