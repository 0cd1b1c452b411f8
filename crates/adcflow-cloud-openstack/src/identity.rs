//! Keystone v3 identity client
//!
//! Resolves an admin token and the service-catalog endpoints for the compute
//! and networking control planes.

use crate::error::{OpenStackError, Result};
use serde::{Deserialize, Serialize};

const TOKEN_HEADER: &str = "X-Subject-Token";

/// An authenticated control-plane session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,

    /// Nova endpoint URL; may carry a `%(tenant_id)s` template
    pub compute_endpoint: String,

    /// Neutron endpoint URL
    pub network_endpoint: String,
}

/// Keystone v3 client.
pub struct IdentityClient {
    client: reqwest::Client,
    auth_url: String,
}

impl IdentityClient {
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth_url: auth_url.into(),
        }
    }

    /// Authenticate with a project-scoped password and resolve the compute
    /// and networking endpoints from the catalog.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        project_name: &str,
    ) -> Result<Session> {
        let url = format!("{}/v3/auth/tokens", self.auth_url.trim_end_matches('/'));
        let body = AuthRequest::password_scoped(username, password, project_name);

        tracing::debug!("Authenticating {} against {}", username, url);

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(OpenStackError::AuthenticationFailed(format!(
                "HTTP {status}: {detail}"
            )));
        }

        let token = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(OpenStackError::MissingToken)?;

        let payload: TokenResponse = response.json().await?;
        let catalog = payload.token.catalog;

        Ok(Session {
            token,
            compute_endpoint: endpoint_for(&catalog, "compute")?,
            network_endpoint: endpoint_for(&catalog, "network")?,
        })
    }
}

/// Pick the admin endpoint of a catalog service, falling back to public.
fn endpoint_for(catalog: &[CatalogService], service_type: &str) -> Result<String> {
    let service = catalog
        .iter()
        .find(|s| s.service_type == service_type)
        .ok_or_else(|| OpenStackError::MissingEndpoint(service_type.to_string()))?;

    for interface in ["admin", "public"] {
        if let Some(endpoint) = service.endpoints.iter().find(|e| e.interface == interface) {
            return Ok(endpoint.url.clone());
        }
    }
    Err(OpenStackError::MissingEndpoint(service_type.to_string()))
}

// ============ API Types ============

#[derive(Debug, Serialize)]
struct AuthRequest {
    auth: Auth,
}

#[derive(Debug, Serialize)]
struct Auth {
    identity: Identity,
    scope: Scope,
}

#[derive(Debug, Serialize)]
struct Identity {
    methods: Vec<&'static str>,
    password: PasswordMethod,
}

#[derive(Debug, Serialize)]
struct PasswordMethod {
    user: User,
}

#[derive(Debug, Serialize)]
struct User {
    name: String,
    domain: Domain,
    password: String,
}

#[derive(Debug, Serialize)]
struct Domain {
    id: &'static str,
}

#[derive(Debug, Serialize)]
struct Scope {
    project: Project,
}

#[derive(Debug, Serialize)]
struct Project {
    name: String,
    domain: Domain,
}

impl AuthRequest {
    fn password_scoped(username: &str, password: &str, project_name: &str) -> Self {
        Self {
            auth: Auth {
                identity: Identity {
                    methods: vec!["password"],
                    password: PasswordMethod {
                        user: User {
                            name: username.to_string(),
                            domain: Domain { id: "default" },
                            password: password.to_string(),
                        },
                    },
                },
                scope: Scope {
                    project: Project {
                        name: project_name.to_string(),
                        domain: Domain { id: "default" },
                    },
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogService>,
}

#[derive(Debug, Deserialize)]
struct CatalogService {
    #[serde(rename = "type")]
    service_type: String,

    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    url: String,
}
