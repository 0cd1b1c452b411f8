//! Neutron networking client

use crate::http::{expect_json, expect_ok, transport};
use adcflow_cloud::{
    FloatingIp, NetworkApi, Port, PortRequest, Result, RuleRequest, SecurityGroup, Subnet,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Neutron v2.0 API client.
pub struct NeutronClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl NeutronClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2.0/{}", self.endpoint, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("X-Auth-Token", &self.token)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("X-Auth-Token", &self.token)
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("X-Auth-Token", &self.token)
    }

    fn delete_req(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("X-Auth-Token", &self.token)
    }

    async fn update_port(&self, port_id: &str, body: serde_json::Value) -> Result<Port> {
        let response = self
            .put(&format!("ports/{port_id}"))
            .json(&json!({ "port": body }))
            .send()
            .await
            .map_err(transport)?;
        let envelope: PortEnvelope = expect_json(response, &format!("port {port_id}")).await?;
        Ok(envelope.port)
    }
}

#[async_trait]
impl NetworkApi for NeutronClient {
    async fn create_port(&self, request: &PortRequest) -> Result<Port> {
        tracing::debug!("Creating port {}", request.name);
        let response = self
            .post("ports")
            .json(&json!({ "port": request }))
            .send()
            .await
            .map_err(transport)?;
        let envelope: PortEnvelope = expect_json(response, &format!("port {}", request.name)).await?;
        Ok(envelope.port)
    }

    async fn show_port(&self, port_id: &str) -> Result<Port> {
        let response = self
            .get(&format!("ports/{port_id}"))
            .send()
            .await
            .map_err(transport)?;
        let envelope: PortEnvelope = expect_json(response, &format!("port {port_id}")).await?;
        Ok(envelope.port)
    }

    async fn update_port_security_groups(&self, port_id: &str, groups: &[String]) -> Result<Port> {
        self.update_port(
            port_id,
            json!({ "security_groups": groups, "admin_state_up": true }),
        )
        .await
    }

    async fn update_allowed_address_pairs(
        &self,
        port_id: &str,
        addresses: &[String],
    ) -> Result<Port> {
        let pairs: Vec<_> = addresses
            .iter()
            .map(|addr| json!({ "ip_address": addr }))
            .collect();
        self.update_port(port_id, json!({ "allowed_address_pairs": pairs }))
            .await
    }

    async fn delete_port(&self, port_id: &str) -> Result<()> {
        tracing::debug!("Deleting port {}", port_id);
        let response = self
            .delete_req(&format!("ports/{port_id}"))
            .send()
            .await
            .map_err(transport)?;
        expect_ok(response, &format!("port {port_id}")).await
    }

    async fn list_ports(&self, device_id: &str) -> Result<Vec<Port>> {
        let response = self
            .get(&format!("ports?device_id={device_id}"))
            .send()
            .await
            .map_err(transport)?;
        let envelope: PortsEnvelope =
            expect_json(response, &format!("ports of {device_id}")).await?;
        Ok(envelope.ports)
    }

    async fn show_subnet(&self, subnet_id: &str) -> Result<Subnet> {
        let response = self
            .get(&format!("subnets/{subnet_id}"))
            .send()
            .await
            .map_err(transport)?;
        let envelope: SubnetEnvelope =
            expect_json(response, &format!("subnet {subnet_id}")).await?;
        Ok(envelope.subnet)
    }

    async fn create_floating_ip(
        &self,
        tenant_id: &str,
        floating_network_id: &str,
        port_id: &str,
    ) -> Result<FloatingIp> {
        tracing::debug!("Creating floating IP for port {}", port_id);
        let response = self
            .post("floatingips")
            .json(&json!({
                "floatingip": {
                    "floating_network_id": floating_network_id,
                    "port_id": port_id,
                    "tenant_id": tenant_id,
                }
            }))
            .send()
            .await
            .map_err(transport)?;
        let envelope: FloatingIpEnvelope =
            expect_json(response, &format!("floating IP for {port_id}")).await?;
        Ok(envelope.floatingip)
    }

    async fn delete_floating_ip(&self, floating_ip_id: &str) -> Result<()> {
        tracing::debug!("Deleting floating IP {}", floating_ip_id);
        let response = self
            .delete_req(&format!("floatingips/{floating_ip_id}"))
            .send()
            .await
            .map_err(transport)?;
        expect_ok(response, &format!("floating IP {floating_ip_id}")).await
    }

    async fn list_floating_ips(&self, port_id: &str) -> Result<Vec<FloatingIp>> {
        let response = self
            .get(&format!("floatingips?port_id={port_id}"))
            .send()
            .await
            .map_err(transport)?;
        let envelope: FloatingIpsEnvelope =
            expect_json(response, &format!("floating IPs of {port_id}")).await?;
        Ok(envelope.floatingips)
    }

    async fn create_security_group(&self, tenant_id: &str, name: &str) -> Result<SecurityGroup> {
        tracing::debug!("Creating security group {}", name);
        let response = self
            .post("security-groups")
            .json(&json!({
                "security_group": { "name": name, "tenant_id": tenant_id }
            }))
            .send()
            .await
            .map_err(transport)?;
        let envelope: SecurityGroupEnvelope =
            expect_json(response, &format!("security group {name}")).await?;
        Ok(envelope.security_group)
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<()> {
        tracing::debug!("Deleting security group {}", group_id);
        let response = self
            .delete_req(&format!("security-groups/{group_id}"))
            .send()
            .await
            .map_err(transport)?;
        expect_ok(response, &format!("security group {group_id}")).await
    }

    async fn find_security_group(&self, name: &str) -> Result<Option<SecurityGroup>> {
        let response = self
            .get(&format!("security-groups?name={name}"))
            .send()
            .await
            .map_err(transport)?;
        let envelope: SecurityGroupsEnvelope =
            expect_json(response, &format!("security group {name}")).await?;
        Ok(envelope.security_groups.into_iter().next())
    }

    async fn create_rule(&self, request: &RuleRequest) -> Result<String> {
        let response = self
            .post("security-group-rules")
            .json(&json!({ "security_group_rule": CreateRule::from(request) }))
            .send()
            .await
            .map_err(transport)?;
        let envelope: RuleEnvelope = expect_json(
            response,
            &format!("rule in group {}", request.security_group_id),
        )
        .await?;
        Ok(envelope.security_group_rule.id)
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<()> {
        let response = self
            .delete_req(&format!("security-group-rules/{rule_id}"))
            .send()
            .await
            .map_err(transport)?;
        expect_ok(response, &format!("rule {rule_id}")).await
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct PortEnvelope {
    port: Port,
}

#[derive(Debug, Deserialize)]
struct PortsEnvelope {
    ports: Vec<Port>,
}

#[derive(Debug, Deserialize)]
struct SubnetEnvelope {
    subnet: Subnet,
}

#[derive(Debug, Deserialize)]
struct FloatingIpEnvelope {
    floatingip: FloatingIp,
}

#[derive(Debug, Deserialize)]
struct FloatingIpsEnvelope {
    floatingips: Vec<FloatingIp>,
}

#[derive(Debug, Deserialize)]
struct SecurityGroupEnvelope {
    security_group: SecurityGroup,
}

#[derive(Debug, Deserialize)]
struct SecurityGroupsEnvelope {
    security_groups: Vec<SecurityGroup>,
}

#[derive(Debug, Deserialize)]
struct RuleEnvelope {
    security_group_rule: CreatedRule,
}

#[derive(Debug, Deserialize)]
struct CreatedRule {
    id: String,
}

/// Rule creation body; Neutron additionally wants an ethertype.
#[derive(Debug, Serialize)]
struct CreateRule<'a> {
    #[serde(flatten)]
    rule: &'a RuleRequest,
    ethertype: &'static str,
}

impl<'a> From<&'a RuleRequest> for CreateRule<'a> {
    fn from(rule: &'a RuleRequest) -> Self {
        Self {
            rule,
            ethertype: "IPv4",
        }
    }
}
