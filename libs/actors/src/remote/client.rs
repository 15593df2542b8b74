//! HTTP client side of remote delivery.

use crate::envelope::{WireEnvelope, WireReply};
use crate::error::{ActorSystemError, Result};
use crate::metrics::SystemMetrics;
use actor_config::RemoteConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Posts wire envelopes to remote command endpoints
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: reqwest::Client,
    metrics: Arc<SystemMetrics>,
}

impl RemoteClient {
    /// Client whose every call fails with `TimeoutException` after `timeout`
    pub fn new(timeout: Duration, metrics: Arc<SystemMetrics>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(ActorSystemError::post_operation)?;

        Ok(Self { http, metrics })
    }

    pub async fn post(&self, target: &RemoteConfig, envelope: &WireEnvelope) -> Result<WireReply> {
        let url = target.command_url();
        let started = Instant::now();

        let result = self.round_trip(&url, envelope).await;
        self.metrics.record_remote_call(result.is_err());

        match &result {
            Ok(_) => debug!(
                url = %url,
                op = ?envelope.op,
                recipient = %envelope.path,
                elapsed_ms = started.elapsed().as_millis(),
                "Remote call completed"
            ),
            Err(error) => warn!(
                url = %url,
                op = ?envelope.op,
                recipient = %envelope.path,
                error = %error,
                "Remote call failed"
            ),
        }
        result
    }

    async fn round_trip(&self, url: &str, envelope: &WireEnvelope) -> Result<WireReply> {
        let response = self
            .http
            .post(url)
            .json(envelope)
            .send()
            .await
            .map_err(classify)?;

        response.json::<WireReply>().await.map_err(classify)
    }
}

fn classify(error: reqwest::Error) -> ActorSystemError {
    if error.is_timeout() {
        ActorSystemError::Timeout
    } else if error.is_decode() {
        ActorSystemError::command_parser(error)
    } else {
        ActorSystemError::post_operation(error)
    }
}
