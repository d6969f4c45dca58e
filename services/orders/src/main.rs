use anyhow::Context as _;
use sea_orm::Database;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{Instrument as _, info, info_span};

use orderq_core::config::Config as _;
use orderq_core::tracing::init_tracing;

use orderq_orders::config::OrdersConfig;
use orderq_orders::infra::webhook::WebhookProcessor;
use orderq_orders::router::build_router;
use orderq_orders::state::AppState;
use orderq_orders::worker::{LogProcessor, OrderWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = OrdersConfig::from_env().context("load orders config")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let state = AppState {
        db: db.into(),
        max_attempts: config.worker_max_attempts,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut workers = JoinSet::new();
    if config.worker_enabled {
        for id in 0..config.worker_concurrency.max(1) {
            let service = state.order_service();
            let worker_config = config.worker();
            let webhook = config
                .order_webhook_url
                .as_deref()
                .map(|url| WebhookProcessor::new(url, config.order_webhook_timeout()))
                .transpose()?;
            let shutdown = wait_for_shutdown(shutdown_rx.clone());
            let span = info_span!("order_worker", id);
            workers.spawn(
                async move {
                    match webhook {
                        Some(webhook) => {
                            OrderWorker::new(service, webhook, worker_config)
                                .run(shutdown)
                                .await
                        }
                        None => {
                            OrderWorker::new(service, LogProcessor, worker_config)
                                .run(shutdown)
                                .await
                        }
                    }
                }
                .instrument(span),
            );
        }
        info!(count = workers.len(), "order workers started");
    }

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.orders_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("orders service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("server error")?;

    while workers.join_next().await.is_some() {}
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    // An error means the sender is gone, which is also a shutdown.
    let _ = rx.wait_for(|stop| *stop).await;
}
