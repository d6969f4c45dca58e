use std::time::Duration;

use serde::Deserialize;

use orderq_core::config::Config;

use crate::worker::WorkerConfig;

/// Orders service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3120). Env var: `ORDERS_PORT`.
    #[serde(default = "default_orders_port")]
    pub orders_port: u16,
    /// Run workers in this process (default true).
    #[serde(default = "default_true")]
    pub worker_enabled: bool,
    /// Number of independent worker loops (default 1).
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,
    #[serde(default = "default_worker_batch_size")]
    pub worker_batch_size: u64,
    #[serde(default = "default_worker_max_attempts")]
    pub worker_max_attempts: i32,
    #[serde(default = "default_worker_poll_interval_ms")]
    pub worker_poll_interval_ms: u64,
    /// Release claims older than this many seconds. Unset: claims never expire.
    pub worker_lock_ttl_secs: Option<u64>,
    /// Downstream endpoint receiving claimed orders. Unset: orders are only logged.
    pub order_webhook_url: Option<String>,
    /// Upper bound on one webhook delivery, connect included (default 10000).
    #[serde(default = "default_order_webhook_timeout_ms")]
    pub order_webhook_timeout_ms: u64,
}

impl Config for OrdersConfig {}

impl OrdersConfig {
    pub fn worker(&self) -> WorkerConfig {
        WorkerConfig {
            batch_size: self.worker_batch_size,
            max_attempts: self.worker_max_attempts,
            poll_interval: Duration::from_millis(self.worker_poll_interval_ms),
            lock_ttl: self.worker_lock_ttl_secs.map(Duration::from_secs),
        }
    }

    pub fn order_webhook_timeout(&self) -> Duration {
        Duration::from_millis(self.order_webhook_timeout_ms)
    }
}

fn default_orders_port() -> u16 {
    3120
}

fn default_true() -> bool {
    true
}

fn default_worker_concurrency() -> usize {
    1
}

fn default_worker_batch_size() -> u64 {
    10
}

fn default_worker_max_attempts() -> i32 {
    3
}

fn default_worker_poll_interval_ms() -> u64 {
    1000
}

fn default_order_webhook_timeout_ms() -> u64 {
    10_000
}
