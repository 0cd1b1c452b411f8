//! Network configuration engine
//!
//! Allocates the ports, security groups and (in floating-IP mode) floating
//! IP for one appliance instance. The data port is deliberately created
//! independent of the loadbalancer's VIP port so it survives the
//! loadbalancer object. Allocation is not transactional: any failure aborts
//! the call and already-created resources are left for the decommission
//! workflow to reap.

use crate::error::{ApplianceError, Result};
use crate::model::{LoadBalancer, NetworkAllocation, SecurityGroupPair};
use crate::secgroup::{GroupOptions, SecurityGroupManager};
use adcflow_cloud::{NetworkApi, Port, PortRequest};
use adcflow_config::{ManagementMode, Settings};
use std::sync::Arc;

pub struct NetworkEngine {
    network: Arc<dyn NetworkApi>,
    groups: SecurityGroupManager,
    settings: Arc<Settings>,
}

impl NetworkEngine {
    pub fn new(network: Arc<dyn NetworkApi>, settings: Arc<Settings>) -> Self {
        Self {
            groups: SecurityGroupManager::new(network.clone(), settings.clone()),
            network,
            settings,
        }
    }

    /// Allocate networking for one instance.
    ///
    /// `existing_groups` is passed for the secondary member of an HA pair so
    /// the primary's groups are reused instead of recreated. `cluster`
    /// requests the intra-cluster rule set and an intra-cluster address.
    pub async fn configure(
        &self,
        lb: &LoadBalancer,
        hostname: &str,
        existing_groups: Option<SecurityGroupPair>,
        cluster: bool,
    ) -> Result<NetworkAllocation> {
        let vip_subnet = self.network.show_subnet(&lb.vip_subnet_id).await?;
        let data_port = self
            .network
            .create_port(&PortRequest {
                network_id: vip_subnet.network_id.clone(),
                tenant_id: lb.tenant_id.clone(),
                name: format!("data-{hostname}"),
                security_groups: None,
                admin_state_up: None,
            })
            .await?;

        match self.settings.lbaas.management_mode {
            ManagementMode::FloatingIp => {
                self.configure_floating_ip(lb, data_port, existing_groups, cluster)
                    .await
            }
            ManagementMode::MgmtNet => {
                self.configure_mgmt_net(lb, hostname, data_port, existing_groups, cluster)
                    .await
            }
        }
    }

    /// One data port; management traffic arrives via a floating IP; a single
    /// group covers both service and management rules.
    async fn configure_floating_ip(
        &self,
        lb: &LoadBalancer,
        data_port: Port,
        existing_groups: Option<SecurityGroupPair>,
        cluster: bool,
    ) -> Result<NetworkAllocation> {
        let floating_ip = self
            .network
            .create_floating_ip(
                &lb.tenant_id,
                &self.settings.lbaas.management_network,
                &data_port.id,
            )
            .await?;

        let service_group = match existing_groups {
            Some(pair) => pair.service,
            None => {
                self.groups
                    .create_group(
                        &lb.tenant_id,
                        self.groups.scope_id(lb),
                        GroupOptions {
                            management: true,
                            management_label: false,
                            cluster,
                        },
                    )
                    .await?
                    .id
            }
        };

        let data_port = self
            .network
            .update_port_security_groups(&data_port.id, std::slice::from_ref(&service_group))
            .await?;

        let cluster_addr = if cluster {
            Some(primary_ip(&data_port)?.to_string())
        } else {
            None
        };

        tracing::info!(
            "Configured {} with floating IP {}",
            data_port.name,
            floating_ip.floating_ip_address
        );

        Ok(NetworkAllocation {
            mgmt_ip: floating_ip.floating_ip_address,
            mgmt_port: None,
            cluster_addr,
            security_groups: SecurityGroupPair {
                service: service_group,
                management: None,
            },
            nic_ports: vec![data_port.id.clone()],
            data_port,
        })
    }

    /// Data port plus a dedicated management port on the management network,
    /// each guarded by its own group.
    async fn configure_mgmt_net(
        &self,
        lb: &LoadBalancer,
        hostname: &str,
        data_port: Port,
        existing_groups: Option<SecurityGroupPair>,
        cluster: bool,
    ) -> Result<NetworkAllocation> {
        let (service_group, mgmt_group) = match existing_groups {
            Some(pair) => {
                let mgmt = pair
                    .management
                    .ok_or_else(|| ApplianceError::MissingManagementGroup(hostname.to_string()))?;
                (pair.service, mgmt)
            }
            None => {
                let scope = self.groups.scope_id(lb);
                let service = self
                    .groups
                    .create_group(&lb.tenant_id, scope, GroupOptions::default())
                    .await?;
                let mgmt = self
                    .groups
                    .create_group(
                        &lb.tenant_id,
                        scope,
                        GroupOptions {
                            management: true,
                            management_label: true,
                            cluster,
                        },
                    )
                    .await?;
                (service.id, mgmt.id)
            }
        };

        let data_port = self
            .network
            .update_port_security_groups(&data_port.id, std::slice::from_ref(&service_group))
            .await?;

        let mgmt_port = self
            .network
            .create_port(&PortRequest {
                network_id: self.settings.lbaas.management_network.clone(),
                tenant_id: lb.tenant_id.clone(),
                name: format!("mgmt-{hostname}"),
                security_groups: Some(vec![mgmt_group.clone()]),
                admin_state_up: Some(true),
            })
            .await?;

        let mgmt_ip = primary_ip(&mgmt_port)?.to_string();
        let cluster_addr = cluster.then(|| mgmt_ip.clone());

        tracing::info!("Configured {} with management port {}", hostname, mgmt_ip);

        Ok(NetworkAllocation {
            mgmt_ip,
            cluster_addr,
            security_groups: SecurityGroupPair {
                service: service_group,
                management: Some(mgmt_group),
            },
            nic_ports: vec![mgmt_port.id.clone(), data_port.id.clone()],
            mgmt_port: Some(mgmt_port),
            data_port,
        })
    }

    /// Permit an extra address (a VIP) to source traffic from the given
    /// ports, typically one per cluster member. Already-present addresses
    /// are left untouched.
    pub async fn add_ip_to_ports(&self, ip: &str, port_ids: &[String]) -> Result<()> {
        for port_id in port_ids {
            let port = self.network.show_port(port_id).await?;
            let mut addresses: Vec<String> = port
                .allowed_address_pairs
                .iter()
                .map(|pair| pair.ip_address.clone())
                .collect();
            if !addresses.iter().any(|existing| existing == ip) {
                addresses.push(ip.to_string());
                self.network
                    .update_allowed_address_pairs(port_id, &addresses)
                    .await?;
            }
        }
        Ok(())
    }

    /// Withdraw an address from the given ports' allowed pairs.
    pub async fn remove_ip_from_ports(&self, ip: &str, port_ids: &[String]) -> Result<()> {
        for port_id in port_ids {
            let port = self.network.show_port(port_id).await?;
            if port
                .allowed_address_pairs
                .iter()
                .any(|pair| pair.ip_address == ip)
            {
                let addresses: Vec<String> = port
                    .allowed_address_pairs
                    .iter()
                    .map(|pair| pair.ip_address.clone())
                    .filter(|existing| existing != ip)
                    .collect();
                self.network
                    .update_allowed_address_pairs(port_id, &addresses)
                    .await?;
            }
        }
        Ok(())
    }
}

/// First fixed address of a port, or an error naming the port.
pub(crate) fn primary_ip(port: &Port) -> Result<&str> {
    port.primary_ip()
        .map(|fixed| fixed.ip_address.as_str())
        .ok_or_else(|| ApplianceError::MissingAddress(format!("port {} has no fixed IP", port.id)))
}
