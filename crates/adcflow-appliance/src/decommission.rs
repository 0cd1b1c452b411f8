//! Appliance decommissioning
//!
//! Tears down one instance and the cloud resources hung off it. The
//! instance itself must go; everything else is cleanup that should not
//! abort the teardown, so failures there come back as warnings. The VIP
//! port always stays because the calling framework owns it; its security
//! groups are cleared instead.

use crate::error::Result;
use crate::lookup::server_for_hostname;
use crate::model::LoadBalancer;
use adcflow_cloud::{CloudError, ComputeApi, NetworkApi};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Resource classes whose deletion is allowed to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupResource {
    FloatingIp,
    SecurityGroup,
}

impl fmt::Display for CleanupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FloatingIp => write!(f, "floating IP"),
            Self::SecurityGroup => write!(f, "security group"),
        }
    }
}

/// A non-fatal failure recorded while tearing down an appliance.
#[derive(Debug)]
pub struct CleanupWarning {
    pub resource: CleanupResource,
    pub id: String,
    pub error: CloudError,
}

pub struct Decommissioner {
    network: Arc<dyn NetworkApi>,
    compute: Arc<dyn ComputeApi>,
}

impl Decommissioner {
    pub fn new(network: Arc<dyn NetworkApi>, compute: Arc<dyn ComputeApi>) -> Self {
        Self { network, compute }
    }

    /// Destroy the instance named `hostname` and reap its networking.
    ///
    /// Ordering matters: resources are inventoried while the instance still
    /// exists, the instance is unlocked and deleted (fatal on failure), and
    /// only then are floating IPs, ports and groups removed. Security groups
    /// go last since ports still reference them until deleted.
    pub async fn destroy(
        &self,
        lb: &LoadBalancer,
        hostname: &str,
    ) -> Result<Vec<CleanupWarning>> {
        let server = server_for_hostname(self.compute.as_ref(), &lb.tenant_id, hostname).await?;
        let ports = self.network.list_ports(&server.id).await?;

        let mut group_ids: BTreeSet<String> = BTreeSet::new();
        let mut floating_ip_ids = Vec::new();
        for port in &ports {
            group_ids.extend(port.security_groups.iter().cloned());
            for fip in self.network.list_floating_ips(&port.id).await? {
                floating_ip_ids.push(fip.id);
            }
        }

        self.compute
            .set_lock(&lb.tenant_id, &server.id, false)
            .await?;
        self.compute.delete_server(&lb.tenant_id, &server.id).await?;
        info!(%hostname, server_id = %server.id, "instance deleted");

        let mut warnings = Vec::new();

        for fip_id in floating_ip_ids {
            if let Err(error) = self.network.delete_floating_ip(&fip_id).await {
                warn!(id = %fip_id, %error, "could not delete floating IP");
                warnings.push(CleanupWarning {
                    resource: CleanupResource::FloatingIp,
                    id: fip_id,
                    error,
                });
            }
        }

        for port in &ports {
            if port.id == lb.vip_port_id {
                // The VIP port belongs to the loadbalancer; detach our
                // groups but leave the port standing.
                self.network
                    .update_port_security_groups(&port.id, &[])
                    .await?;
            } else {
                self.network.delete_port(&port.id).await?;
            }
        }

        for group_id in group_ids {
            if let Err(error) = self.network.delete_security_group(&group_id).await {
                warn!(id = %group_id, %error, "could not delete security group");
                warnings.push(CleanupWarning {
                    resource: CleanupResource::SecurityGroup,
                    id: group_id,
                    error,
                });
            }
        }

        Ok(warnings)
    }
}
