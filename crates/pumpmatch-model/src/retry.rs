use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::client::{ModelClient, ModelError, ModelRequest, ModelResponse};

/// Wraps a client with at most one retry after a fixed backoff.
///
/// Only transient failures (timeout, transport, 5xx) are retried; a
/// response that fails validation is returned immediately. One retry keeps
/// the worst-case latency of a degraded stage bounded at roughly two
/// timeouts plus the backoff.
pub struct RetryingClient<C> {
    inner: C,
    backoff: Duration,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for RetryingClient<C> {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        match self.inner.complete(request).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_transient() => {
                warn!(error = %err, backoff_ms = self.backoff.as_millis() as u64, "Model call failed, retrying once");
                tokio::time::sleep(self.backoff).await;
                self.inner.complete(request).await
            }
            Err(err) => Err(err),
        }
    }
}
