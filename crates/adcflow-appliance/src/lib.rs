//! Appliance lifecycle orchestration
//!
//! Provisions, clusters and decommissions virtual traffic-manager
//! appliances on an OpenStack control plane:
//!
//! ```text
//! ┌──────────────┐   allocate    ┌───────────────┐
//! │ Provisioner  │──────────────▶│ NetworkEngine │
//! │              │               └───────────────┘
//! │  boot + poll │   payload     ┌──────────────────┐
//! │  + probe     │──────────────▶│ PayloadGenerator │
//! └──────────────┘               └──────────────────┘
//! ┌────────────────┐  teardown with warnings
//! │ Decommissioner │────────────────────────▶
//! └────────────────┘
//! ```
//!
//! Appliances configure themselves on first boot from a cloud-init document
//! built by [`bootstrap::cloud_init_document`]; the orchestrator never logs
//! in to an appliance.

pub mod bootstrap;
pub mod decommission;
pub mod error;
pub mod lookup;
pub mod model;
pub mod network;
pub mod payload;
pub mod probe;
pub mod provision;
pub mod secgroup;

pub use decommission::{CleanupResource, CleanupWarning, Decommissioner};
pub use error::{ApplianceError, Result};
pub use model::{
    ClusterInfo, HaCluster, HaClusterMember, LoadBalancer, NetworkAllocation,
    ProvisionedAppliance, SecurityGroupPair,
};
pub use network::NetworkEngine;
pub use payload::{ClusterJoinData, PayloadGenerator, ReplayData, UserData};
pub use probe::{ReadinessProbe, RestReadinessProbe};
pub use provision::{Provisioner, generate_password};
pub use secgroup::{GroupOptions, SecurityGroupManager};
