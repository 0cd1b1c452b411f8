//! Orchestration-level model.

use adcflow_cloud::Port;
use serde::{Deserialize, Serialize};

/// The externally-owned loadbalancer an appliance serves.
///
/// Owned by the calling framework; the orchestrator reads it and must never
/// hard-delete its bound VIP port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    pub tenant_id: String,
    pub vip_subnet_id: String,
    pub vip_port_id: String,
}

/// Security groups allocated for one logical loadbalancer.
///
/// The management group only exists in mgmt-net mode. An HA secondary is
/// handed the primary's pair so the groups are reused, not recreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupPair {
    pub service: String,
    pub management: Option<String>,
}

/// Everything the network engine allocated for one instance.
#[derive(Debug, Clone)]
pub struct NetworkAllocation {
    pub data_port: Port,

    /// Present only in mgmt-net mode
    pub mgmt_port: Option<Port>,

    /// Address on which the instance's management API is reachable
    pub mgmt_ip: String,

    /// Address the peer uses for intra-cluster traffic; None outside HA
    pub cluster_addr: Option<String>,

    pub security_groups: SecurityGroupPair,

    /// Ports to attach at boot, in interface order (management first)
    pub nic_ports: Vec<String>,
}

/// HA role and peer identity for one cluster member.
#[derive(Debug, Clone)]
pub struct ClusterInfo {
    pub is_primary: bool,
    pub peer_name: String,
    pub peer_addr: String,
}

/// Result of provisioning a standalone appliance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedAppliance {
    pub hostname: String,
    pub mgmt_ip: String,
    pub password: String,
}

/// One member of a provisioned HA pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaClusterMember {
    pub hostname: String,
    pub mgmt_ip: String,
}

/// Result of provisioning an HA pair. Both members share one password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaCluster {
    pub password: String,
    pub members: Vec<HaClusterMember>,
}
