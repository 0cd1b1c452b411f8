//! Wire-level resource model shared by all control-plane clients.

use serde::{Deserialize, Serialize};

/// A Neutron port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub network_id: String,

    /// Compute instance the port is attached to, if any
    #[serde(default)]
    pub device_id: Option<String>,

    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,

    #[serde(default)]
    pub security_groups: Vec<String>,

    #[serde(default)]
    pub allowed_address_pairs: Vec<AddressPair>,
}

impl Port {
    /// First fixed address of the port.
    ///
    /// Appliance ports carry exactly one fixed IP; a port without one is a
    /// control-plane anomaly surfaced as `InvalidResponse` by callers.
    pub fn primary_ip(&self) -> Option<&FixedIp> {
        self.fixed_ips.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedIp {
    pub subnet_id: String,
    pub ip_address: String,
}

/// An additional address permitted to source traffic from a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPair {
    pub ip_address: String,
}

/// A Neutron subnet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub network_id: String,
    pub cidr: String,

    #[serde(default)]
    pub gateway_ip: Option<String>,
}

/// A Neutron security group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,

    #[serde(default, rename = "security_group_rules")]
    pub rules: Vec<SecurityGroupRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub id: String,
    pub direction: Direction,

    #[serde(default)]
    pub protocol: Option<Protocol>,

    #[serde(default)]
    pub port_range_min: Option<u16>,

    #[serde(default)]
    pub port_range_max: Option<u16>,

    #[serde(default)]
    pub remote_ip_prefix: Option<String>,

    #[serde(default)]
    pub remote_group_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// A floating IP bound (or bindable) to a port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    pub floating_ip_address: String,

    #[serde(default)]
    pub port_id: Option<String>,
}

/// A Nova server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: String,

    /// Not present in all compute API responses (e.g. create)
    #[serde(default)]
    pub name: String,

    #[serde(default = "ServerStatus::unknown")]
    pub status: ServerStatus,
}

/// Build state of a server. BUILD is the only non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServerStatus {
    Build,
    Active,
    Error,
    Other(String),
}

impl ServerStatus {
    fn unknown() -> Self {
        ServerStatus::Other(String::new())
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ServerStatus::Build)
    }
}

impl From<String> for ServerStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "BUILD" => ServerStatus::Build,
            "ACTIVE" => ServerStatus::Active,
            "ERROR" => ServerStatus::Error,
            _ => ServerStatus::Other(raw),
        }
    }
}

impl From<ServerStatus> for String {
    fn from(status: ServerStatus) -> Self {
        match status {
            ServerStatus::Build => "BUILD".to_string(),
            ServerStatus::Active => "ACTIVE".to_string(),
            ServerStatus::Error => "ERROR".to_string(),
            ServerStatus::Other(raw) => raw,
        }
    }
}

/// Request to create a port.
#[derive(Debug, Clone, Serialize)]
pub struct PortRequest {
    pub network_id: String,
    pub tenant_id: String,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
}

/// Request to create a security-group rule. Always IPv4.
#[derive(Debug, Clone, Serialize)]
pub struct RuleRequest {
    pub security_group_id: String,
    pub direction: Direction,
    pub protocol: Protocol,
    pub port_range_min: u16,
    pub port_range_max: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_group_id: Option<String>,
}

impl RuleRequest {
    /// Ingress rule opening a single port.
    pub fn ingress(group_id: impl Into<String>, port: u16, protocol: Protocol) -> Self {
        Self {
            security_group_id: group_id.into(),
            direction: Direction::Ingress,
            protocol,
            port_range_min: port,
            port_range_max: port,
            remote_ip_prefix: None,
            remote_group_id: None,
        }
    }

    pub fn from_address(mut self, addr: impl Into<String>) -> Self {
        self.remote_ip_prefix = Some(addr.into());
        self
    }

    pub fn from_group(mut self, group_id: impl Into<String>) -> Self {
        self.remote_group_id = Some(group_id.into());
        self
    }
}

/// Request to create a server.
#[derive(Debug, Clone)]
pub struct ServerRequest {
    pub tenant_id: String,
    pub hostname: String,
    pub image_id: String,
    pub flavor_id: String,

    /// Base64-framed guest bootstrap document
    pub user_data: String,

    pub admin_password: String,

    /// Ports to attach, in interface order
    pub ports: Vec<String>,

    pub config_drive: bool,
}
