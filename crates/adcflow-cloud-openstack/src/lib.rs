//! OpenStack control-plane clients for adcflow
//!
//! Implements the `adcflow-cloud` traits against Keystone (identity),
//! Neutron (networking) and Nova (compute).

pub mod compute;
pub mod error;
mod http;
pub mod identity;
pub mod network;

pub use compute::NovaClient;
pub use error::{OpenStackError, Result};
pub use identity::{IdentityClient, Session};
pub use network::NeutronClient;

/// Authenticate and build clients for both control planes in one step.
pub async fn connect(
    auth_url: &str,
    username: &str,
    password: &str,
    project_name: &str,
) -> Result<(NeutronClient, NovaClient)> {
    let session = IdentityClient::new(auth_url)
        .authenticate(username, password, project_name)
        .await?;

    tracing::info!(
        "Authenticated against {}; compute={} network={}",
        auth_url,
        session.compute_endpoint,
        session.network_endpoint
    );

    Ok((
        NeutronClient::new(&session.network_endpoint, &session.token),
        NovaClient::new(&session.compute_endpoint, &session.token),
    ))
}
