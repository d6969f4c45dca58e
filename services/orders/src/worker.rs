//! Polling worker: fetch a batch of pending orders, claim each one, process it,
//! and record the outcome.
//!
//! Workers share nothing in memory. Two workers may fetch the same candidate;
//! the store's conditional claim lets exactly one of them proceed and the other
//! skips it.

use std::future::Future;
use std::time::Duration;

use anyhow::Context as _;
use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::repository::{OrderProcessor, OrderStore};
use crate::domain::types::Order;
use crate::error::OrderServiceError;
use crate::usecase::order::OrderService;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Orders fetched per poll.
    pub batch_size: u64,
    /// Failed attempts after which an order leaves the pending pool.
    pub max_attempts: i32,
    pub poll_interval: Duration,
    /// When set, claims older than this are released before each poll.
    pub lock_ttl: Option<Duration>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_attempts: 3,
            poll_interval: Duration::from_secs(1),
            lock_ttl: None,
        }
    }
}

/// Outcome counts for one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub released: u64,
    pub fetched: usize,
    pub claimed: usize,
    pub processed: usize,
    pub failed: usize,
    /// Candidates another worker claimed first.
    pub skipped: usize,
}

/// Processor that only logs. Used when no downstream is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProcessor;

impl OrderProcessor for LogProcessor {
    async fn process(&self, order: &Order) -> anyhow::Result<()> {
        info!(
            id = %order.id,
            order_id = %order.order_id,
            customer = %order.customer,
            total = %order.total,
            "order processed"
        );
        Ok(())
    }
}

pub struct OrderWorker<S: OrderStore, P: OrderProcessor> {
    pub service: OrderService<S>,
    pub processor: P,
    pub config: WorkerConfig,
}

impl<S: OrderStore, P: OrderProcessor> OrderWorker<S, P> {
    pub fn new(service: OrderService<S>, processor: P, config: WorkerConfig) -> Self {
        Self {
            service,
            processor,
            config,
        }
    }

    /// Run a single poll. Storage errors abort the batch and are returned;
    /// processing errors are recorded on the order.
    pub async fn run_once(&self) -> Result<BatchReport, OrderServiceError> {
        let mut report = BatchReport::default();

        if let Some(ttl) = self.config.lock_ttl {
            let ttl = chrono::Duration::from_std(ttl).context("lock ttl out of range")?;
            report.released = self.service.release_expired_locks(Utc::now() - ttl).await?;
            if report.released > 0 {
                warn!(released = report.released, "released expired order locks");
            }
        }

        let candidates = self
            .service
            .fetch_pending_orders(self.config.batch_size, self.config.max_attempts)
            .await?;
        report.fetched = candidates.len();

        for order in candidates {
            if !self.service.lock_order_by_id(order.id).await? {
                debug!(id = %order.id, order_id = %order.order_id, "order claimed elsewhere");
                report.skipped += 1;
                continue;
            }
            report.claimed += 1;

            match self.processor.process(&order).await {
                Ok(()) => {
                    self.service
                        .mark_order_processed(order.id)
                        .await
                        .inspect_err(|e| outcome_not_recorded(&order, e))?;
                    report.processed += 1;
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    let failed = self
                        .service
                        .mark_order_failed(order.id, &message)
                        .await
                        .inspect_err(|e| outcome_not_recorded(&order, e))?;
                    report.failed += 1;
                    if failed.is_exhausted(self.config.max_attempts) {
                        warn!(
                            id = %failed.id,
                            order_id = %failed.order_id,
                            attempts = failed.attempts,
                            error = %message,
                            "order exhausted its retry budget"
                        );
                    } else {
                        info!(
                            id = %failed.id,
                            order_id = %failed.order_id,
                            attempts = failed.attempts,
                            error = %message,
                            "order processing failed, will retry"
                        );
                    }
                }
            }
        }

        Ok(report)
    }

    /// Poll every `poll_interval` until `shutdown` resolves. A batch in flight
    /// is finished before the loop exits.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("order worker stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(report) if report.fetched > 0 => debug!(?report, "order batch done"),
                        Ok(_) => {}
                        Err(e) => error!(error = ?e, "order batch failed"),
                    }
                }
            }
        }
    }
}

/// The claim is still held; the order waits for a lock release.
fn outcome_not_recorded(order: &Order, e: &OrderServiceError) {
    error!(
        id = %order.id,
        order_id = %order.order_id,
        error = ?e,
        "order outcome not recorded, order stays claimed"
    );
}
