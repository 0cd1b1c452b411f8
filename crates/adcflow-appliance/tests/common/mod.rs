//! Shared test fixtures: an in-memory control plane and settings builders.
#![allow(dead_code)]

use adcflow_appliance::payload::UserData;
use adcflow_appliance::probe::ReadinessProbe;
use adcflow_cloud::{
    CloudError, ComputeApi, FixedIp, FloatingIp, NetworkApi, Port, PortRequest, RuleRequest,
    SecurityGroup, SecurityGroupRule, Server, ServerRequest, ServerStatus, Subnet,
};
use adcflow_config::{
    ApplianceSettings, DeploymentModel, LbaasSettings, ManagementMode, OpenStackSettings,
    Settings, TimingSettings,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

pub const DATA_NET: &str = "net-data";
pub const MGMT_NET: &str = "net-mgmt";
pub const VIP_SUBNET: &str = "subnet-vip";

/// In-memory Neutron + Nova. State lives behind one mutex; each call locks,
/// mutates and unlocks without awaiting while the lock is held.
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    next_id: u32,
    subnets: HashMap<String, Subnet>,
    ports: HashMap<String, Port>,
    groups: HashMap<String, SecurityGroup>,
    floating_ips: HashMap<String, FloatingIp>,
    servers: HashMap<String, Server>,
    server_requests: Vec<ServerRequest>,
    statuses: HashMap<String, VecDeque<ServerStatus>>,
    locked: HashSet<String>,
    group_creates: u32,
    fail_group_delete: bool,
    fail_floating_ip_delete: bool,
}

impl FakeState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn allocate_ip(&mut self, network_id: &str) -> Option<(String, String)> {
        let subnet = self
            .subnets
            .values()
            .find(|subnet| subnet.network_id == network_id)?
            .clone();
        // e.g. 10.1.0.0/24 -> 10.1.0.{10+n}
        let base = subnet.cidr.split('/').next()?.rsplit_once('.')?.0.to_string();
        self.next_id += 1;
        Some((subnet.id, format!("{base}.{}", 10 + self.next_id)))
    }
}

impl FakeCloud {
    /// A cloud with a data network (the VIP subnet) and a management network.
    pub fn new() -> Self {
        let cloud = Self::default();
        {
            let mut state = cloud.state.lock().unwrap();
            state.subnets.insert(
                VIP_SUBNET.to_string(),
                Subnet {
                    id: VIP_SUBNET.to_string(),
                    network_id: DATA_NET.to_string(),
                    cidr: "10.1.0.0/24".to_string(),
                    gateway_ip: Some("10.1.0.1".to_string()),
                },
            );
            state.subnets.insert(
                "subnet-mgmt".to_string(),
                Subnet {
                    id: "subnet-mgmt".to_string(),
                    network_id: MGMT_NET.to_string(),
                    cidr: "10.2.0.0/24".to_string(),
                    gateway_ip: Some("10.2.0.1".to_string()),
                },
            );
        }
        cloud
    }

    /// Seed a port that exists before the orchestrator runs (a VIP port).
    pub fn seed_port(&self, id: &str, network_id: &str, device_id: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        let (subnet_id, ip_address) = state
            .allocate_ip(network_id)
            .unwrap_or_else(|| panic!("no subnet on network {network_id}"));
        state.ports.insert(
            id.to_string(),
            Port {
                id: id.to_string(),
                name: String::new(),
                network_id: network_id.to_string(),
                device_id: device_id.map(str::to_string),
                fixed_ips: vec![FixedIp {
                    subnet_id,
                    ip_address,
                }],
                security_groups: Vec::new(),
                allowed_address_pairs: Vec::new(),
            },
        );
    }

    /// Queue the statuses `get_server` hands out for a hostname. The last
    /// entry repeats once the queue drains.
    pub fn queue_statuses(&self, hostname: &str, statuses: &[ServerStatus]) {
        let mut state = self.state.lock().unwrap();
        state
            .statuses
            .insert(hostname.to_string(), statuses.iter().cloned().collect());
    }

    pub fn fail_group_delete(&self) {
        self.state.lock().unwrap().fail_group_delete = true;
    }

    pub fn fail_floating_ip_delete(&self) {
        self.state.lock().unwrap().fail_floating_ip_delete = true;
    }

    pub fn server_requests(&self) -> Vec<ServerRequest> {
        self.state.lock().unwrap().server_requests.clone()
    }

    pub fn group_creates(&self) -> u32 {
        self.state.lock().unwrap().group_creates
    }

    pub fn group_named(&self, name: &str) -> Option<SecurityGroup> {
        let state = self.state.lock().unwrap();
        state.groups.values().find(|g| g.name == name).cloned()
    }

    pub fn port(&self, id: &str) -> Option<Port> {
        self.state.lock().unwrap().ports.get(id).cloned()
    }

    pub fn port_count(&self) -> usize {
        self.state.lock().unwrap().ports.len()
    }

    pub fn floating_ip_count(&self) -> usize {
        self.state.lock().unwrap().floating_ips.len()
    }

    pub fn group_count(&self) -> usize {
        self.state.lock().unwrap().groups.len()
    }

    pub fn server_count(&self) -> usize {
        self.state.lock().unwrap().servers.len()
    }

    pub fn list_servers_snapshot(&self) -> Vec<Server> {
        self.state.lock().unwrap().servers.values().cloned().collect()
    }

    pub fn is_locked(&self, server_id: &str) -> bool {
        self.state.lock().unwrap().locked.contains(server_id)
    }
}

#[async_trait]
impl NetworkApi for FakeCloud {
    async fn create_port(&self, request: &PortRequest) -> adcflow_cloud::Result<Port> {
        let mut state = self.state.lock().unwrap();
        let (subnet_id, ip_address) =
            state
                .allocate_ip(&request.network_id)
                .ok_or_else(|| CloudError::NotFound(format!("network {}", request.network_id)))?;
        let id = state.next("port");
        let port = Port {
            id: id.clone(),
            name: request.name.clone(),
            network_id: request.network_id.clone(),
            device_id: None,
            fixed_ips: vec![FixedIp {
                subnet_id,
                ip_address,
            }],
            security_groups: request.security_groups.clone().unwrap_or_default(),
            allowed_address_pairs: Vec::new(),
        };
        state.ports.insert(id, port.clone());
        Ok(port)
    }

    async fn show_port(&self, port_id: &str) -> adcflow_cloud::Result<Port> {
        let state = self.state.lock().unwrap();
        state
            .ports
            .get(port_id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound(format!("port {port_id}")))
    }

    async fn update_port_security_groups(
        &self,
        port_id: &str,
        groups: &[String],
    ) -> adcflow_cloud::Result<Port> {
        let mut state = self.state.lock().unwrap();
        let port = state
            .ports
            .get_mut(port_id)
            .ok_or_else(|| CloudError::NotFound(format!("port {port_id}")))?;
        port.security_groups = groups.to_vec();
        Ok(port.clone())
    }

    async fn update_allowed_address_pairs(
        &self,
        port_id: &str,
        addresses: &[String],
    ) -> adcflow_cloud::Result<Port> {
        let mut state = self.state.lock().unwrap();
        let port = state
            .ports
            .get_mut(port_id)
            .ok_or_else(|| CloudError::NotFound(format!("port {port_id}")))?;
        port.allowed_address_pairs = addresses
            .iter()
            .map(|ip| adcflow_cloud::AddressPair {
                ip_address: ip.clone(),
            })
            .collect();
        Ok(port.clone())
    }

    async fn delete_port(&self, port_id: &str) -> adcflow_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .ports
            .remove(port_id)
            .map(|_| ())
            .ok_or_else(|| CloudError::NotFound(format!("port {port_id}")))
    }

    async fn list_ports(&self, device_id: &str) -> adcflow_cloud::Result<Vec<Port>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .ports
            .values()
            .filter(|port| port.device_id.as_deref() == Some(device_id))
            .cloned()
            .collect())
    }

    async fn show_subnet(&self, subnet_id: &str) -> adcflow_cloud::Result<Subnet> {
        let state = self.state.lock().unwrap();
        state
            .subnets
            .get(subnet_id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound(format!("subnet {subnet_id}")))
    }

    async fn create_floating_ip(
        &self,
        _tenant_id: &str,
        _floating_network_id: &str,
        port_id: &str,
    ) -> adcflow_cloud::Result<FloatingIp> {
        let mut state = self.state.lock().unwrap();
        let id = state.next("fip");
        let fip = FloatingIp {
            id: id.clone(),
            floating_ip_address: format!("172.16.0.{}", state.next_id),
            port_id: Some(port_id.to_string()),
        };
        state.floating_ips.insert(id, fip.clone());
        Ok(fip)
    }

    async fn delete_floating_ip(&self, floating_ip_id: &str) -> adcflow_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_floating_ip_delete {
            return Err(CloudError::ApiError("floating IP deletion disabled".to_string()));
        }
        state
            .floating_ips
            .remove(floating_ip_id)
            .map(|_| ())
            .ok_or_else(|| CloudError::NotFound(format!("floating IP {floating_ip_id}")))
    }

    async fn list_floating_ips(&self, port_id: &str) -> adcflow_cloud::Result<Vec<FloatingIp>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .floating_ips
            .values()
            .filter(|fip| fip.port_id.as_deref() == Some(port_id))
            .cloned()
            .collect())
    }

    async fn create_security_group(
        &self,
        _tenant_id: &str,
        name: &str,
    ) -> adcflow_cloud::Result<SecurityGroup> {
        let mut state = self.state.lock().unwrap();
        let id = state.next("group");
        let group = SecurityGroup {
            id: id.clone(),
            name: name.to_string(),
            rules: Vec::new(),
        };
        state.groups.insert(id, group.clone());
        state.group_creates += 1;
        Ok(group)
    }

    async fn delete_security_group(&self, group_id: &str) -> adcflow_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_group_delete {
            return Err(CloudError::ApiError("security group in use".to_string()));
        }
        state
            .groups
            .remove(group_id)
            .map(|_| ())
            .ok_or_else(|| CloudError::NotFound(format!("security group {group_id}")))
    }

    async fn find_security_group(
        &self,
        name: &str,
    ) -> adcflow_cloud::Result<Option<SecurityGroup>> {
        let state = self.state.lock().unwrap();
        Ok(state.groups.values().find(|g| g.name == name).cloned())
    }

    async fn create_rule(&self, request: &RuleRequest) -> adcflow_cloud::Result<String> {
        let mut state = self.state.lock().unwrap();
        let rule_id = state.next("rule");
        let group = state
            .groups
            .get_mut(&request.security_group_id)
            .ok_or_else(|| CloudError::NotFound(format!("security group {}", request.security_group_id)))?;
        let duplicate = group.rules.iter().any(|rule| {
            rule.direction == request.direction
                && rule.protocol == Some(request.protocol)
                && rule.port_range_min == Some(request.port_range_min)
                && rule.port_range_max == Some(request.port_range_max)
                && rule.remote_ip_prefix == request.remote_ip_prefix
                && rule.remote_group_id == request.remote_group_id
        });
        if duplicate {
            return Err(CloudError::AlreadyExists("security group rule".to_string()));
        }
        group.rules.push(SecurityGroupRule {
            id: rule_id.clone(),
            direction: request.direction,
            protocol: Some(request.protocol),
            port_range_min: Some(request.port_range_min),
            port_range_max: Some(request.port_range_max),
            remote_ip_prefix: request.remote_ip_prefix.clone(),
            remote_group_id: request.remote_group_id.clone(),
        });
        Ok(rule_id)
    }

    async fn delete_rule(&self, rule_id: &str) -> adcflow_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        for group in state.groups.values_mut() {
            if let Some(index) = group.rules.iter().position(|rule| rule.id == rule_id) {
                group.rules.remove(index);
                return Ok(());
            }
        }
        Err(CloudError::NotFound(format!("rule {rule_id}")))
    }
}

#[async_trait]
impl ComputeApi for FakeCloud {
    async fn create_server(&self, request: &ServerRequest) -> adcflow_cloud::Result<Server> {
        let mut state = self.state.lock().unwrap();
        let id = state.next("server");
        for port_id in &request.ports {
            if let Some(port) = state.ports.get_mut(port_id) {
                port.device_id = Some(id.clone());
            }
        }
        let server = Server {
            id: id.clone(),
            name: request.hostname.clone(),
            status: ServerStatus::Build,
        };
        state.servers.insert(id, server.clone());
        state.server_requests.push(request.clone());
        Ok(server)
    }

    async fn get_server(&self, _tenant_id: &str, server_id: &str) -> adcflow_cloud::Result<Server> {
        let mut state = self.state.lock().unwrap();
        let mut server = state
            .servers
            .get(server_id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound(format!("server {server_id}")))?;
        if let Some(queue) = state.statuses.get_mut(&server.name) {
            server.status = if queue.len() > 1 {
                queue.pop_front().unwrap_or(ServerStatus::Active)
            } else {
                queue.front().cloned().unwrap_or(ServerStatus::Active)
            };
        } else {
            server.status = ServerStatus::Active;
        }
        Ok(server)
    }

    async fn list_servers(&self, _tenant_id: &str) -> adcflow_cloud::Result<Vec<Server>> {
        let state = self.state.lock().unwrap();
        Ok(state.servers.values().cloned().collect())
    }

    async fn set_lock(
        &self,
        _tenant_id: &str,
        server_id: &str,
        locked: bool,
    ) -> adcflow_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.servers.contains_key(server_id) {
            return Err(CloudError::NotFound(format!("server {server_id}")));
        }
        if locked {
            state.locked.insert(server_id.to_string());
        } else {
            state.locked.remove(server_id);
        }
        Ok(())
    }

    async fn delete_server(&self, _tenant_id: &str, server_id: &str) -> adcflow_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.locked.contains(server_id) {
            return Err(CloudError::ApiError(format!("server {server_id} is locked")));
        }
        state
            .servers
            .remove(server_id)
            .map(|_| ())
            .ok_or_else(|| CloudError::NotFound(format!("server {server_id}")))
    }
}

/// Readiness probe that answers immediately and counts its calls.
#[derive(Default)]
pub struct InstantProbe {
    pub calls: AtomicU32,
}

#[async_trait]
impl ReadinessProbe for InstantProbe {
    async fn wait_ready(&self, _mgmt_ip: &str) -> adcflow_appliance::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Settings wired to the fake cloud's networks. Zero intervals keep the
/// polling loops from sleeping; the loopback admin server keeps DNS out of
/// the tests.
pub fn test_settings(mode: ManagementMode) -> Settings {
    Settings {
        openstack: OpenStackSettings {
            auth_url: "https://keystone.test:5000".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            project_name: "service".to_string(),
        },
        lbaas: LbaasSettings {
            deployment_model: DeploymentModel::PerLoadbalancer,
            management_mode: mode,
            management_network: MGMT_NET.to_string(),
            image_id: "img-1".to_string(),
            flavor_id: "flv-1".to_string(),
            admin_servers: vec!["127.0.0.1".to_string()],
        },
        appliance: ApplianceSettings::default(),
        timing: TimingSettings {
            build_poll_interval_secs: 0,
            build_timeout_secs: 5,
            cluster_ready_interval_secs: 0,
            cluster_ready_timeout_secs: 5,
        },
    }
}

pub fn test_lb(vip_port_id: &str) -> adcflow_appliance::LoadBalancer {
    adcflow_appliance::LoadBalancer {
        id: "lb-1".to_string(),
        tenant_id: "tenant-1".to_string(),
        vip_subnet_id: VIP_SUBNET.to_string(),
        vip_port_id: vip_port_id.to_string(),
    }
}

/// Decode the `UserData` a boot request carried: the outer base64 wraps the
/// cloud-init document, whose first `content:` block is the JSON payload.
pub fn user_data_of(request: &ServerRequest) -> UserData {
    let doc = String::from_utf8(STANDARD.decode(&request.user_data).unwrap()).unwrap();
    let encoded = doc
        .lines()
        .find_map(|line| line.trim().strip_prefix("content: "))
        .expect("no content block in cloud-init document");
    serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap()
}
