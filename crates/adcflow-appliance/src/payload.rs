//! Config payload generation
//!
//! Builds the "replay data" an appliance consumes on first boot: a flat
//! mapping of `!`-namespaced keys to strings, serialized line-oriented as
//! `key<TAB>value`. HA members additionally get a cluster-join document in
//! `key=value` form.

use crate::error::{ApplianceError, Result};
use crate::model::{ClusterInfo, NetworkAllocation};
use crate::network::primary_ip;
use crate::secgroup::resolve_host;
use adcflow_cloud::NetworkApi;
use adcflow_config::Settings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Netmask for a prefix length, by plain 32-bit mask arithmetic.
pub fn netmask_for_prefix(prefix: u8) -> Ipv4Addr {
    let bits = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix.min(32)))
    };
    Ipv4Addr::from(bits)
}

/// Netmask for a CIDR string such as `10.1.0.0/24`.
pub fn netmask_for_cidr(cidr: &str) -> Result<Ipv4Addr> {
    let prefix = cidr
        .split('/')
        .nth(1)
        .and_then(|p| p.parse::<u8>().ok())
        .filter(|p| *p <= 32)
        .ok_or_else(|| ApplianceError::InvalidCidr(cidr.to_string()))?;
    Ok(netmask_for_prefix(prefix))
}

/// Replay data under construction. Keys are kept sorted so the wire form is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct ReplayData {
    entries: BTreeMap<String, String>,
}

impl ReplayData {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Licensing-acceptance flags required before first configuration.
    pub fn accept_licensing(&mut self) -> &mut Self {
        self.set("developer_mode_accepted", "Yes");
        self.set("appliance!licence_agreed", "Yes")
    }

    pub fn admin_password(&mut self, password: &str) -> &mut Self {
        self.set("admin!password", password)
    }

    pub fn hostname(&mut self, hostname: &str) -> &mut Self {
        self.set("appliance!hostname", hostname)
    }

    pub fn timezone(&mut self, timezone: &str) -> &mut Self {
        self.set("appliance!timezone", timezone)
    }

    pub fn rest_api(&mut self, port: u16, bind_ip: &str) -> &mut Self {
        self.set("rest!enabled", "Yes");
        self.set("rest!port", port.to_string());
        self.set("rest!bindips", bind_ip)
    }

    pub fn control_bind(&mut self, bind_ip: &str) -> &mut Self {
        self.set("control!bindip", bind_ip)
    }

    pub fn gateway(&mut self, gateway: &str) -> &mut Self {
        self.set("appliance!gateway", gateway)
    }

    pub fn nameservers(&mut self, servers: &[String]) -> &mut Self {
        self.set("appliance!nameservers", servers.join(" "))
    }

    /// Link-level interface settings.
    pub fn interface(&mut self, name: &str, mtu: u32) -> &mut Self {
        self.set(format!("appliance!if!{name}!autoneg"), "Yes");
        self.set(format!("appliance!if!{name}!mtu"), mtu.to_string())
    }

    /// Address an interface.
    pub fn address(&mut self, name: &str, addr: &str, mask: Ipv4Addr) -> &mut Self {
        self.set(format!("appliance!ip!{name}!isexternal"), "No");
        self.set(format!("appliance!ip!{name}!addr"), addr);
        self.set(format!("appliance!ip!{name}!mask"), mask.to_string())
    }

    /// Static hosts-file entry.
    pub fn host_entry(&mut self, hostname: &str, addr: &str) -> &mut Self {
        self.set(format!("appliance!hosts!{hostname}"), addr)
    }

    /// Addresses allowed to use the REST API.
    pub fn access(&mut self, addresses: &[String]) -> &mut Self {
        self.set("access", addresses.join(" "))
    }

    /// Addresses allowed to use the cluster control channel.
    pub fn control_allow(&mut self, addresses: &[String]) -> &mut Self {
        self.set("controlallow", addresses.join(","))
    }

    /// Fixed read-only GUI credential, installed instead of address
    /// restrictions when tenants get GUI access.
    pub fn monitor_user(&mut self, username: &str, password: &str) -> &mut Self {
        self.set("monitor_user", format!("{username} {password}"))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Line-oriented `key<TAB>value` wire form.
    pub fn to_wire(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}\t{v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Cluster-join document, `key=value` per line.
#[derive(Debug, Clone, Default)]
pub struct ClusterJoinData {
    entries: BTreeMap<String, String>,
}

impl ClusterJoinData {
    fn base() -> Self {
        let mut data = Self::default();
        for (key, value) in [
            ("accept-license", "accept"),
            ("start_at_boot", "y"),
            ("zxtm!group", "nogroup"),
            ("zxtm!license_key", ""),
            ("zxtm!name_useip", "n"),
            ("zxtm!use_invalid_key_license", "y"),
            ("zxtm!user", "nobody"),
            ("zxtm!name_setname", "1"),
            ("zxtm!reconfigure_option", "2"),
        ] {
            data.entries.insert(key.to_string(), value.to_string());
        }
        data
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    /// Join-existing-cluster document, used by the secondary. Clustering is
    /// always initiated from the joining node. `bind_ip` restricts the
    /// member's binding and is only supplied when GUI access is disabled.
    pub fn join_existing(
        peer_addr: &str,
        admin_username: &str,
        admin_port: u16,
        password: &str,
        bind_ip: Option<&str>,
    ) -> Self {
        let mut data = Self::base();
        data.set("zxtm!cluster", "S");
        data.set("zxtm!clustertipjoin", "y");
        data.set("zxtm!fingerprints_ok", "y");
        data.set("zxtm!join_new_cluster", "y");
        data.set("zxtm!unique_bind", "n");
        data.set("zlb!admin_username", admin_username);
        data.set("zlb!admin_port", admin_port.to_string());
        data.set("zlb!admin_hostname", peer_addr);
        data.set("zlb!admin_password", password);
        if let Some(bind_ip) = bind_ip {
            data.set("zxtm!bindip", bind_ip);
        }
        data
    }

    /// Create-and-await-cluster document, used by the primary when GUI
    /// access is disabled (with GUI access the primary issues no join
    /// payload at all; the secondary's join performs the pairing).
    pub fn create_new(bind_ip: &str) -> Self {
        let mut data = Self::base();
        data.set("zxtm!cluster", "C");
        data.set("zxtm!join_new_cluster", "n");
        data.set("zxtm!unique_bind", "y");
        data.set("zxtm!bindip", bind_ip);
        data
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn to_wire(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What the guest bootstrap reads from the config drive. Immutable once
/// built; consumed exactly once on first boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub replay_data: String,
    pub cluster_join_data: Option<String>,
    pub password: String,
    pub hostname: String,
}

fn subnet_of(port: &adcflow_cloud::Port) -> Result<&str> {
    port.fixed_ips
        .first()
        .map(|ip| ip.subnet_id.as_str())
        .ok_or_else(|| ApplianceError::MissingAddress(format!("port {} has no fixed IP", port.id)))
}

/// Builds a [`UserData`] from a network allocation.
pub struct PayloadGenerator {
    network: Arc<dyn NetworkApi>,
    settings: Arc<Settings>,
}

impl PayloadGenerator {
    pub fn new(network: Arc<dyn NetworkApi>, settings: Arc<Settings>) -> Self {
        Self { network, settings }
    }

    pub async fn generate(
        &self,
        hostname: &str,
        password: &str,
        allocation: &NetworkAllocation,
        cluster: Option<&ClusterInfo>,
    ) -> Result<UserData> {
        let appliance = &self.settings.appliance;
        let data_ip = primary_ip(&allocation.data_port)?;
        let data_subnet = self
            .network
            .show_subnet(subnet_of(&allocation.data_port)?)
            .await?;
        let gateway = data_subnet.gateway_ip.as_deref().ok_or_else(|| {
            ApplianceError::MissingAddress(format!("subnet {} has no gateway", data_subnet.id))
        })?;

        // Management services bind to the management port if one exists,
        // otherwise to the data port.
        let bind_ip = match &allocation.mgmt_port {
            Some(port) => primary_ip(port)?,
            None => data_ip,
        };

        let mut replay = ReplayData::new();
        replay
            .accept_licensing()
            .admin_password(password)
            .hostname(hostname)
            .timezone(&appliance.timezone)
            .rest_api(appliance.rest_port, bind_ip)
            .control_bind(if cluster.is_some() { bind_ip } else { "127.0.0.1" })
            .gateway(gateway)
            .interface("eth0", appliance.mtu)
            .nameservers(&appliance.nameservers);

        if appliance.gui_access {
            replay.monitor_user("monitor", "password");
        } else {
            // Deduplicated admin-server addresses, plus the HA peer
            let mut access: BTreeSet<String> = BTreeSet::new();
            for server in &self.settings.lbaas.admin_servers {
                access.insert(resolve_host(server).await?.to_string());
            }
            if let Some(cluster) = cluster {
                access.insert(cluster.peer_addr.clone());
            }
            replay.access(&access.into_iter().collect::<Vec<_>>());
        }

        match &allocation.mgmt_port {
            Some(mgmt_port) => {
                // Dual-interface layout: management first, data second
                let mgmt_ip = primary_ip(mgmt_port)?;
                let mgmt_subnet = self.network.show_subnet(subnet_of(mgmt_port)?).await?;
                replay
                    .host_entry(hostname, mgmt_ip)
                    .address("eth0", mgmt_ip, netmask_for_cidr(&mgmt_subnet.cidr)?)
                    .interface("eth1", appliance.data_mtu)
                    .address("eth1", data_ip, netmask_for_cidr(&data_subnet.cidr)?);
            }
            None => {
                replay
                    .host_entry(hostname, data_ip)
                    .address("eth0", data_ip, netmask_for_cidr(&data_subnet.cidr)?);
            }
        }

        if let Some(cluster) = cluster {
            replay.host_entry(&cluster.peer_name, &cluster.peer_addr);
            replay.control_allow(&[
                "localhost".to_string(),
                bind_ip.to_string(),
                cluster.peer_addr.clone(),
            ]);
        }

        let cluster_join_data = cluster.and_then(|cluster| {
            if !cluster.is_primary {
                let bind = (!appliance.gui_access).then_some(bind_ip);
                Some(
                    ClusterJoinData::join_existing(
                        &cluster.peer_addr,
                        &appliance.admin_username,
                        appliance.admin_port,
                        password,
                        bind,
                    )
                    .to_wire(),
                )
            } else if !appliance.gui_access {
                Some(ClusterJoinData::create_new(bind_ip).to_wire())
            } else {
                None
            }
        });

        Ok(UserData {
            replay_data: replay.to_wire(),
            cluster_join_data,
            password: password.to_string(),
            hostname: hostname.to_string(),
        })
    }
}
