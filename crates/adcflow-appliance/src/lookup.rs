//! Resolving appliances back to cloud resources

use crate::error::{ApplianceError, Result};
use adcflow_cloud::{ComputeApi, NetworkApi, Port, Server};

/// Finds the instance booted for `hostname` within a tenant.
pub async fn server_for_hostname(
    compute: &dyn ComputeApi,
    tenant_id: &str,
    hostname: &str,
) -> Result<Server> {
    let servers = compute.list_servers(tenant_id).await?;
    servers
        .into_iter()
        .find(|server| server.name == hostname)
        .ok_or_else(|| ApplianceError::InstanceNotFound(hostname.to_string()))
}

/// Finds an instance's data port. Management ports are named `mgmt-*`, so
/// the data port is the one that isn't.
pub async fn data_port_for_server(
    network: &dyn NetworkApi,
    server_id: &str,
    hostname: &str,
) -> Result<Port> {
    let ports = network.list_ports(server_id).await?;
    ports
        .into_iter()
        .find(|port| !port.name.starts_with("mgmt"))
        .ok_or_else(|| ApplianceError::DataPortNotFound(hostname.to_string()))
}
