//! Nova compute client

use crate::http::{expect_json, expect_ok, transport};
use adcflow_cloud::{ComputeApi, Result, Server, ServerRequest};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Nova API client.
///
/// Catalog endpoints for the compute service commonly embed a tenant-id
/// template; it is substituted per request.
pub struct NovaClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl NovaClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Both template spellings occur in the wild.
    fn endpoint_for(&self, tenant_id: &str) -> String {
        self.endpoint
            .replace("$(tenant_id)s", tenant_id)
            .replace("%(tenant_id)s", tenant_id)
    }

    fn url(&self, tenant_id: &str, path: &str) -> String {
        format!("{}/{}", self.endpoint_for(tenant_id), path)
    }
}

#[async_trait]
impl ComputeApi for NovaClient {
    async fn create_server(&self, request: &ServerRequest) -> Result<Server> {
        tracing::info!("Creating server {}", request.hostname);
        let networks: Vec<_> = request
            .ports
            .iter()
            .map(|port_id| json!({ "port": port_id }))
            .collect();
        let body = json!({
            "server": {
                "imageRef": request.image_id,
                "flavorRef": request.flavor_id,
                "name": request.hostname,
                "user_data": request.user_data,
                "adminPass": request.admin_password,
                "networks": networks,
                "config_drive": request.config_drive,
            }
        });

        let response = self
            .client
            .post(self.url(&request.tenant_id, "servers"))
            .header("X-Auth-Token", &self.token)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let envelope: ServerEnvelope =
            expect_json(response, &format!("server {}", request.hostname)).await?;
        Ok(envelope.server)
    }

    async fn get_server(&self, tenant_id: &str, server_id: &str) -> Result<Server> {
        let response = self
            .client
            .get(self.url(tenant_id, &format!("servers/{server_id}")))
            .header("X-Auth-Token", &self.token)
            .send()
            .await
            .map_err(transport)?;
        let envelope: ServerEnvelope =
            expect_json(response, &format!("server {server_id}")).await?;
        Ok(envelope.server)
    }

    async fn list_servers(&self, tenant_id: &str) -> Result<Vec<Server>> {
        let response = self
            .client
            .get(self.url(tenant_id, "servers/detail"))
            .header("X-Auth-Token", &self.token)
            .send()
            .await
            .map_err(transport)?;
        let envelope: ServersEnvelope = expect_json(response, "servers").await?;
        Ok(envelope.servers)
    }

    async fn set_lock(&self, tenant_id: &str, server_id: &str, locked: bool) -> Result<()> {
        let action = if locked { "lock" } else { "unlock" };
        tracing::debug!("Server {}: {}", server_id, action);
        let response = self
            .client
            .post(self.url(tenant_id, &format!("servers/{server_id}/action")))
            .header("X-Auth-Token", &self.token)
            .json(&json!({ action: null }))
            .send()
            .await
            .map_err(transport)?;
        expect_ok(response, &format!("{action} server {server_id}")).await
    }

    async fn delete_server(&self, tenant_id: &str, server_id: &str) -> Result<()> {
        tracing::info!("Deleting server {}", server_id);
        let response = self
            .client
            .delete(self.url(tenant_id, &format!("servers/{server_id}")))
            .header("X-Auth-Token", &self.token)
            .send()
            .await
            .map_err(transport)?;
        expect_ok(response, &format!("server {server_id}")).await
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ServerEnvelope {
    server: Server,
}

#[derive(Debug, Deserialize)]
struct ServersEnvelope {
    servers: Vec<Server>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_template_substitution() {
        let nova = NovaClient::new("https://nova.example.com/v2.1/%(tenant_id)s", "tok");
        assert_eq!(
            nova.endpoint_for("abc123"),
            "https://nova.example.com/v2.1/abc123"
        );

        let nova = NovaClient::new("https://nova.example.com/v2.1/$(tenant_id)s/", "tok");
        assert_eq!(
            nova.endpoint_for("abc123"),
            "https://nova.example.com/v2.1/abc123"
        );
    }
}
