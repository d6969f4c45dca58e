use std::time::Duration;

use anyhow::Context as _;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::repository::OrderProcessor;
use crate::domain::types::Order;

/// Hands a claimed order to a downstream HTTP endpoint.
///
/// Transport errors, timeouts and non-2xx responses count as failed attempts;
/// the error text becomes the order's `last_error`. `timeout` bounds the whole
/// request so a silent downstream cannot hold a claim indefinitely.
#[derive(Clone)]
pub struct WebhookProcessor {
    pub client: reqwest::Client,
    pub url: String,
}

impl WebhookProcessor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("build webhook client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    id: Uuid,
    order_id: &'a str,
    customer: &'a str,
    total: rust_decimal::Decimal,
    attempt: i32,
}

impl OrderProcessor for WebhookProcessor {
    async fn process(&self, order: &Order) -> anyhow::Result<()> {
        let payload = WebhookPayload {
            id: order.id,
            order_id: &order.order_id,
            customer: &order.customer,
            total: order.total,
            attempt: order.attempts + 1,
        };
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("deliver order webhook")?
            .error_for_status()
            .context("order webhook rejected")?;
        Ok(())
    }
}
