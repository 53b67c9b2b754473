use std::str::FromStr;
use std::time::Duration;

/// Backing-store table names. Validated as plain SQL identifiers because
/// they are interpolated into statements, not bound.
#[derive(Clone, Debug)]
pub struct TableNames {
    pub inventory: String,
    pub seats: String,
    pub idempotency: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string (sqlx Any: sqlite or postgres).
    pub database_url: String,

    // =========================
    // RPC server configuration
    // =========================
    /// gRPC listen port.
    pub server_port: u16,

    /// Hard per-call deadline. A call that exceeds it answers
    /// DEADLINE_EXCEEDED; the in-flight store write is then indeterminate
    /// and the idempotency protocol is the recovery mechanism.
    pub server_timeout: Duration,

    /// Concurrent-request cap. Above it, calls are rejected with
    /// RESOURCE_EXHAUSTED rather than queued.
    pub server_max_concurrency: usize,

    // =========================
    // Store configuration
    // =========================
    pub tables: TableNames,

    /// Retry budget for read-only store calls on backend failures.
    /// Guarded writes are never retried internally; retry is the
    /// caller's responsibility and idempotency makes it safe.
    pub store_max_retries: u32,

    /// Per-store-call timeout, below the server deadline so a slow store
    /// surfaces as a store timeout rather than an opaque RPC deadline.
    pub store_timeout: Duration,

    // =========================
    // Idempotency configuration
    // =========================
    /// How long a reservation's terminal outcome is replayed to retries.
    /// Records past the window are indistinguishable from absent.
    pub idempotency_ttl: Duration,

    /// Bound on the in-process replay cache. The cache is write-through
    /// and always falls back to the store; it is not coherent across
    /// replicas.
    pub idempotency_cache_size: usize,

    // =========================
    // Observability
    // =========================
    pub service_name: String,
    pub service_version: String,

    /// Trace collector endpoint, when the deployment runs one. Spans are
    /// emitted through `tracing`; shipping them is the collector sidecar's
    /// job, so this is surfaced at startup and otherwise informational.
    pub trace_collector_endpoint: Option<String>,

    /// Port advertised for metrics scrapes. Counters are surfaced as
    /// periodic structured log lines; see `metrics`.
    pub metrics_port: u16,

    /// Cadence of the counter-snapshot log line.
    pub metrics_flush_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://turnstile_dev.db".to_string());

        Self {
            database_url,

            server_port: parse_or(env("SERVER_PORT"), 8080, "SERVER_PORT"),
            server_timeout: Duration::from_millis(parse_or(
                env("SERVER_TIMEOUT_MS"),
                250,
                "SERVER_TIMEOUT_MS",
            )),
            server_max_concurrency: parse_or(
                env("SERVER_MAX_CONCURRENCY"),
                1000,
                "SERVER_MAX_CONCURRENCY",
            ),

            tables: TableNames {
                inventory: table_or(env("STORE_TABLE_INVENTORY"), "inventory"),
                seats: table_or(env("STORE_TABLE_SEATS"), "seats"),
                idempotency: table_or(env("STORE_TABLE_IDEMPOTENCY"), "idempotency"),
            },
            store_max_retries: parse_or(env("STORE_MAX_RETRIES"), 3, "STORE_MAX_RETRIES"),
            store_timeout: Duration::from_millis(parse_or(
                env("STORE_TIMEOUT_MS"),
                200,
                "STORE_TIMEOUT_MS",
            )),

            idempotency_ttl: Duration::from_secs(parse_or(
                env("IDEMPOTENCY_TTL_SECS"),
                300,
                "IDEMPOTENCY_TTL_SECS",
            )),
            idempotency_cache_size: parse_or(
                env("IDEMPOTENCY_CACHE_SIZE"),
                10_000,
                "IDEMPOTENCY_CACHE_SIZE",
            ),

            service_name: env("SERVICE_NAME").unwrap_or_else(|| "turnstile".to_string()),
            service_version: env("SERVICE_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            trace_collector_endpoint: env("TRACE_COLLECTOR_ENDPOINT"),
            metrics_port: parse_or(env("METRICS_PORT"), 9090, "METRICS_PORT"),
            metrics_flush_interval: Duration::from_secs(parse_or(
                env("METRICS_FLUSH_SECS"),
                60,
                "METRICS_FLUSH_SECS",
            )),
        }
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parses an env value, falling back to the default (with a warning) on
/// anything unparseable. Misconfiguration should degrade, not crash.
fn parse_or<T: FromStr + Copy>(raw: Option<String>, default: T, key: &str) -> T {
    match raw {
        None => default,
        Some(s) => s.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %s, "unparseable config value; using default");
            default
        }),
    }
}

/// Table names end up interpolated into SQL, so anything that is not a bare
/// identifier falls back to the default.
fn table_or(raw: Option<String>, default: &str) -> String {
    match raw {
        Some(s) if is_sql_identifier(&s) => s,
        Some(s) => {
            tracing::warn!(value = %s, default, "table name is not a bare identifier; using default");
            default.to_string()
        }
        None => default.to_string(),
    }
}

fn is_sql_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
