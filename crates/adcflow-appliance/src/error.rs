//! Orchestration error types

use adcflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplianceError {
    #[error("Instance {hostname} failed to build")]
    BuildFailed { hostname: String },

    #[error("Instance {hostname} still building after {waited_secs}s")]
    BuildTimedOut { hostname: String, waited_secs: u64 },

    #[error("Cluster primary at {addr} not answering after {waited_secs}s")]
    ClusterReadyTimeout { addr: String, waited_secs: u64 },

    #[error("No instance found for hostname {0}")]
    InstanceNotFound(String),

    #[error("No data port found for {0}")]
    DataPortNotFound(String),

    #[error("No security group named {0}")]
    SecurityGroupNotFound(String),

    #[error("Reused security groups for {0} are missing the management group")]
    MissingManagementGroup(String),

    #[error("Missing address: {0}")]
    MissingAddress(String),

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("Cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Payload serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

pub type Result<T> = std::result::Result<T, ApplianceError>;
