//! Appliance readiness probing
//!
//! A freshly booted appliance takes a while before its REST API answers.
//! Rather than sleeping a fixed interval, the orchestrator polls the API
//! until it responds or a deadline passes.

use crate::error::{ApplianceError, Result};
use adcflow_config::Settings;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Blocks until the appliance at `mgmt_ip` answers, or errors with
    /// [`ApplianceError::ClusterReadyTimeout`] once the deadline passes.
    async fn wait_ready(&self, mgmt_ip: &str) -> Result<()>;
}

/// Probes the appliance REST API over HTTPS. Any HTTP response counts as
/// ready, including auth rejections: the process answering is what matters.
pub struct RestReadinessProbe {
    client: reqwest::Client,
    settings: Arc<Settings>,
}

impl RestReadinessProbe {
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        // Appliances serve a self-signed certificate out of the box.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl ReadinessProbe for RestReadinessProbe {
    async fn wait_ready(&self, mgmt_ip: &str) -> Result<()> {
        let timing = &self.settings.timing;
        let url = format!(
            "https://{}:{}/",
            mgmt_ip, self.settings.appliance.rest_port
        );
        let deadline = Instant::now() + Duration::from_secs(timing.cluster_ready_timeout_secs);
        let interval = Duration::from_secs(timing.cluster_ready_interval_secs);

        loop {
            match self.client.get(&url).send().await {
                Ok(_) => {
                    debug!(%mgmt_ip, "appliance answering");
                    return Ok(());
                }
                Err(err) => {
                    debug!(%mgmt_ip, error = %err, "appliance not yet answering");
                }
            }
            if Instant::now() >= deadline {
                return Err(ApplianceError::ClusterReadyTimeout {
                    addr: mgmt_ip.to_string(),
                    waited_secs: timing.cluster_ready_timeout_secs,
                });
            }
            tokio::time::sleep(interval).await;
        }
    }
}
