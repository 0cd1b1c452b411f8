//! adcflow control-plane abstraction
//!
//! Typed access to the compute and networking control planes, expressed as
//! traits so the orchestration core never depends on a concrete vendor
//! client.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            adcflow-appliance             │
//! │   (provisioning / teardown workflows)    │
//! └───────────────────┬──────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────┐
//! │             adcflow-cloud                │
//! │   trait NetworkApi / trait ComputeApi    │
//! └───────────────────┬──────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────┐
//! │        adcflow-cloud-openstack           │
//! │     Keystone / Neutron / Nova clients    │
//! └──────────────────────────────────────────┘
//! ```

pub mod api;
pub mod error;
pub mod model;

// Re-exports
pub use api::{ComputeApi, NetworkApi};
pub use error::{CloudError, Result};
pub use model::{
    AddressPair, Direction, FixedIp, FloatingIp, Port, PortRequest, Protocol, RuleRequest,
    SecurityGroup, SecurityGroupRule, Server, ServerRequest, ServerStatus, Subnet,
};
