//! Control-plane trait definitions
//!
//! The orchestrator only ever talks to these traits; the OpenStack clients in
//! `adcflow-cloud-openstack` implement them, and tests substitute in-memory
//! fakes.

use crate::error::Result;
use crate::model::{
    FloatingIp, Port, PortRequest, RuleRequest, SecurityGroup, Server, ServerRequest, Subnet,
};
use async_trait::async_trait;

/// Networking control plane (ports, subnets, security groups, floating IPs).
#[async_trait]
pub trait NetworkApi: Send + Sync {
    async fn create_port(&self, request: &PortRequest) -> Result<Port>;

    async fn show_port(&self, port_id: &str) -> Result<Port>;

    /// Replace the port's security-group binding. An empty slice clears it.
    async fn update_port_security_groups(&self, port_id: &str, groups: &[String]) -> Result<Port>;

    /// Replace the port's allowed-address-pairs list.
    async fn update_allowed_address_pairs(&self, port_id: &str, addresses: &[String])
    -> Result<Port>;

    async fn delete_port(&self, port_id: &str) -> Result<()>;

    /// Ports attached to a compute instance.
    async fn list_ports(&self, device_id: &str) -> Result<Vec<Port>>;

    async fn show_subnet(&self, subnet_id: &str) -> Result<Subnet>;

    async fn create_floating_ip(
        &self,
        tenant_id: &str,
        floating_network_id: &str,
        port_id: &str,
    ) -> Result<FloatingIp>;

    async fn delete_floating_ip(&self, floating_ip_id: &str) -> Result<()>;

    /// Floating IPs bound to a port.
    async fn list_floating_ips(&self, port_id: &str) -> Result<Vec<FloatingIp>>;

    async fn create_security_group(&self, tenant_id: &str, name: &str) -> Result<SecurityGroup>;

    async fn delete_security_group(&self, group_id: &str) -> Result<()>;

    /// Look a security group up by exact name.
    async fn find_security_group(&self, name: &str) -> Result<Option<SecurityGroup>>;

    /// Create a rule. A rule identical to an existing one fails with
    /// [`CloudError::AlreadyExists`](crate::CloudError::AlreadyExists);
    /// callers decide whether that is an error.
    async fn create_rule(&self, request: &RuleRequest) -> Result<SecurityGroupRuleId>;

    async fn delete_rule(&self, rule_id: &str) -> Result<()>;
}

/// Identifier of a created security-group rule.
pub type SecurityGroupRuleId = String;

/// Compute control plane (servers).
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn create_server(&self, request: &ServerRequest) -> Result<Server>;

    async fn get_server(&self, tenant_id: &str, server_id: &str) -> Result<Server>;

    /// All servers visible in the tenant, with status.
    async fn list_servers(&self, tenant_id: &str) -> Result<Vec<Server>>;

    /// Set or clear the administrative delete-protection lock.
    async fn set_lock(&self, tenant_id: &str, server_id: &str, locked: bool) -> Result<()>;

    async fn delete_server(&self, tenant_id: &str, server_id: &str) -> Result<()>;
}
