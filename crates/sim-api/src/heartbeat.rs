//! Liveness reports to the service status aggregator.
//!
//! Emitting never blocks and never fails from the caller's point of view: the HTTP
//! sink posts on a detached task and drops any error after logging it.

use std::sync::Mutex;
use std::time::Duration;

use contracts::HeartbeatReport;

const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(2);

pub trait HeartbeatSink: Send + Sync {
    fn emit(&self, message: &str);
}

pub struct HttpHeartbeat {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpHeartbeat {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HEARTBEAT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl HeartbeatSink for HttpHeartbeat {
    fn emit(&self, message: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(heartbeat = message, "no runtime for heartbeat; dropped");
            return;
        };

        let request = self
            .client
            .post(&self.endpoint)
            .json(&HeartbeatReport::sim(message));
        let endpoint = self.endpoint.clone();

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::debug!(%endpoint, status = %response.status(), "heartbeat rejected");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(%endpoint, error = %err, "heartbeat delivery failed");
                }
            }
        });
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHeartbeat;

impl HeartbeatSink for NoopHeartbeat {
    fn emit(&self, _message: &str) {}
}

/// Keeps every emitted message in order. Not used by [`crate::serve`]; exposed
/// so integration tests and embedders can observe which ticks ran.
#[derive(Debug, Default)]
pub struct RecordingHeartbeat {
    messages: Mutex<Vec<String>>,
}

impl RecordingHeartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, message: &str) -> usize {
        self.messages()
            .iter()
            .filter(|recorded| recorded.as_str() == message)
            .count()
    }
}

impl HeartbeatSink for RecordingHeartbeat {
    fn emit(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
