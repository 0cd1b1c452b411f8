//! Security group rule management
//!
//! Groups are named by a fixed convention (`lbaas-<scope>`, scope being the
//! loadbalancer or tenant id depending on the deployment model) so they can
//! be found again without holding state. Rule creation is idempotent: a rule
//! the control plane already holds is success, not failure.

use crate::error::{ApplianceError, Result};
use crate::model::LoadBalancer;
use adcflow_cloud::{Direction, NetworkApi, Protocol, RuleRequest, SecurityGroup};
use adcflow_config::{DeploymentModel, Settings};
use std::net::IpAddr;
use std::sync::Arc;

/// What a group is for; drives which rule sets are installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupOptions {
    /// Install management-API access rules for the admin servers
    pub management: bool,

    /// Group guards a dedicated management port (`mgmt-` name prefix,
    /// no GUI rule)
    pub management_label: bool,

    /// Install the intra-cluster gossip/sync rules
    pub cluster: bool,
}

pub struct SecurityGroupManager {
    network: Arc<dyn NetworkApi>,
    settings: Arc<Settings>,
}

impl SecurityGroupManager {
    pub fn new(network: Arc<dyn NetworkApi>, settings: Arc<Settings>) -> Self {
        Self { network, settings }
    }

    /// Scope id for group naming, per the deployment model.
    pub fn scope_id<'a>(&self, lb: &'a LoadBalancer) -> &'a str {
        match self.settings.lbaas.deployment_model {
            DeploymentModel::PerLoadbalancer => &lb.id,
            DeploymentModel::PerTenant => &lb.tenant_id,
        }
    }

    /// Canonical group name for a loadbalancer.
    pub fn group_name(&self, lb: &LoadBalancer) -> String {
        format!("lbaas-{}", self.scope_id(lb))
    }

    /// Create a group and install its automatic rule sets.
    pub async fn create_group(
        &self,
        tenant_id: &str,
        scope_id: &str,
        options: GroupOptions,
    ) -> Result<SecurityGroup> {
        let prefix = if options.management_label { "mgmt-" } else { "" };
        let name = format!("{prefix}lbaas-{scope_id}");
        tracing::info!("Creating security group {}", name);

        let group = self.network.create_security_group(tenant_id, &name).await?;
        let appliance = &self.settings.appliance;

        // Tenant-facing GUI port, never opened on a management-labelled group
        if appliance.gui_access && !options.management_label {
            self.create_rule(RuleRequest::ingress(
                &group.id,
                appliance.admin_port,
                Protocol::Tcp,
            ))
            .await?;
        }

        // Each admin server may reach the instance's REST API. Addresses are
        // resolved now, at rule-creation time.
        if options.management {
            for server in &self.settings.lbaas.admin_servers {
                let addr = resolve_host(server).await?;
                self.create_rule(
                    RuleRequest::ingress(&group.id, appliance.rest_port, Protocol::Tcp)
                        .from_address(addr.to_string()),
                )
                .await?;
            }
        }

        // Intra-cluster gossip and UI sync between members of the same group
        if options.cluster {
            for port in [appliance.admin_port, appliance.cluster_port] {
                for protocol in [Protocol::Tcp, Protocol::Udp] {
                    self.create_rule(
                        RuleRequest::ingress(&group.id, port, protocol).from_group(&group.id),
                    )
                    .await?;
                }
            }
        }

        Ok(group)
    }

    /// Create a rule, treating "already exists" as success.
    pub async fn create_rule(&self, request: RuleRequest) -> Result<()> {
        match self.network.create_rule(&request).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_already_exists() => {
                tracing::debug!(
                    "Rule for port {} already present in group {}",
                    request.port_range_min,
                    request.security_group_id
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open a service port on the loadbalancer's group.
    pub async fn allow_port(&self, lb: &LoadBalancer, port: u16, protocol: Protocol) -> Result<()> {
        let group = self.find_group(lb).await?;
        self.create_rule(RuleRequest::ingress(&group.id, port, protocol))
            .await
    }

    /// Close a service port: delete exactly the rule matching
    /// (min = max = port, ingress, protocol), leaving every other rule alone.
    pub async fn block_port(&self, lb: &LoadBalancer, port: u16, protocol: Protocol) -> Result<()> {
        let group = self.find_group(lb).await?;
        for rule in &group.rules {
            if rule.port_range_min == Some(port)
                && rule.port_range_max == Some(port)
                && rule.direction == Direction::Ingress
                && rule.protocol == Some(protocol)
            {
                self.network.delete_rule(&rule.id).await?;
                return Ok(());
            }
        }
        Ok(())
    }

    async fn find_group(&self, lb: &LoadBalancer) -> Result<SecurityGroup> {
        let name = self.group_name(lb);
        self.network
            .find_security_group(&name)
            .await?
            .ok_or(ApplianceError::SecurityGroupNotFound(name))
    }
}

/// Resolve a hostname to its current address.
pub(crate) async fn resolve_host(host: &str) -> Result<IpAddr> {
    let mut addrs =
        tokio::net::lookup_host((host, 0))
            .await
            .map_err(|source| ApplianceError::Resolve {
                host: host.to_string(),
                source,
            })?;
    addrs
        .next()
        .map(|sockaddr| sockaddr.ip())
        .ok_or_else(|| ApplianceError::Resolve {
            host: host.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
        })
}
