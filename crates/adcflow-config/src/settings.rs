//! Deployment-wide settings.
//!
//! One `Settings` value is built at process start and handed by reference to
//! every component constructor; nothing reads configuration ambiently.

use serde::{Deserialize, Serialize};

/// Top-level settings for an adcflow deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Control-plane credentials and endpoints
    pub openstack: OpenStackSettings,

    /// Load-balancer deployment policy
    pub lbaas: LbaasSettings,

    /// Appliance-side configuration baked into the bootstrap payload
    #[serde(default)]
    pub appliance: ApplianceSettings,

    /// Poll intervals and deadlines
    #[serde(default)]
    pub timing: TimingSettings,
}

/// Credentials for the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenStackSettings {
    /// Keystone base URL, e.g. `https://keystone.example.com:5000`
    pub auth_url: String,

    /// Administrative user name
    pub username: String,

    /// Administrative password
    pub password: String,

    /// Project to scope the admin token to
    pub project_name: String,
}

/// How appliances are shared and reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LbaasSettings {
    /// Whether security groups are scoped per loadbalancer or per tenant
    pub deployment_model: DeploymentModel,

    /// How management traffic reaches an appliance
    pub management_mode: ManagementMode,

    /// Network UUID used for floating IPs / management ports
    pub management_network: String,

    /// Glance image UUID of the appliance
    pub image_id: String,

    /// Nova flavor UUID for appliance instances
    pub flavor_id: String,

    /// Administrative servers allowed to reach each appliance's REST API.
    /// Hostnames are resolved at rule-creation time, not at load time.
    pub admin_servers: Vec<String>,
}

/// Scope of security groups and floating IPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentModel {
    PerLoadbalancer,
    PerTenant,
}

/// Network-topology policy for management access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManagementMode {
    /// One data port; a floating IP provides management access
    FloatingIp,
    /// A dedicated management port on a separate management network
    MgmtNet,
}

/// Settings replayed into the appliance on first boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplianceSettings {
    #[serde(default = "defaults::timezone")]
    pub timezone: String,

    #[serde(default)]
    pub nameservers: Vec<String>,

    /// MTU of the primary interface
    #[serde(default = "defaults::mtu")]
    pub mtu: u32,

    /// MTU of the data interface in the dual-interface layout
    #[serde(default = "defaults::data_mtu")]
    pub data_mtu: u32,

    /// Appliance REST API port
    #[serde(default = "defaults::rest_port")]
    pub rest_port: u16,

    /// Appliance admin UI / cluster control port
    #[serde(default = "defaults::admin_port")]
    pub admin_port: u16,

    /// Intra-cluster state sync port
    #[serde(default = "defaults::cluster_port")]
    pub cluster_port: u16,

    /// Whether tenants may reach the appliance GUI directly
    #[serde(default)]
    pub gui_access: bool,

    /// Administrative user on the appliance
    #[serde(default = "defaults::admin_username")]
    pub admin_username: String,
}

impl Default for ApplianceSettings {
    fn default() -> Self {
        Self {
            timezone: defaults::timezone(),
            nameservers: Vec::new(),
            mtu: defaults::mtu(),
            data_mtu: defaults::data_mtu(),
            rest_port: defaults::rest_port(),
            admin_port: defaults::admin_port(),
            cluster_port: defaults::cluster_port(),
            gui_access: false,
            admin_username: defaults::admin_username(),
        }
    }
}

/// Poll intervals and deadlines, all configurable per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Seconds between build-status polls
    #[serde(default = "defaults::build_poll_interval")]
    pub build_poll_interval_secs: u64,

    /// Deadline for an instance to leave the BUILD state
    #[serde(default = "defaults::build_timeout")]
    pub build_timeout_secs: u64,

    /// Seconds between readiness probes of an HA primary
    #[serde(default = "defaults::cluster_ready_interval")]
    pub cluster_ready_interval_secs: u64,

    /// Deadline for an HA primary to answer on its management API
    #[serde(default = "defaults::cluster_ready_timeout")]
    pub cluster_ready_timeout_secs: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            build_poll_interval_secs: defaults::build_poll_interval(),
            build_timeout_secs: defaults::build_timeout(),
            cluster_ready_interval_secs: defaults::cluster_ready_interval(),
            cluster_ready_timeout_secs: defaults::cluster_ready_timeout(),
        }
    }
}

mod defaults {
    pub fn timezone() -> String {
        "UTC".to_string()
    }

    pub fn mtu() -> u32 {
        1500
    }

    pub fn data_mtu() -> u32 {
        1454
    }

    pub fn rest_port() -> u16 {
        9070
    }

    pub fn admin_port() -> u16 {
        9090
    }

    pub fn cluster_port() -> u16 {
        9080
    }

    pub fn admin_username() -> String {
        "admin".to_string()
    }

    pub fn build_poll_interval() -> u64 {
        10
    }

    pub fn build_timeout() -> u64 {
        600
    }

    pub fn cluster_ready_interval() -> u64 {
        10
    }

    pub fn cluster_ready_timeout() -> u64 {
        300
    }
}
