//! Appliance provisioning
//!
//! Boots appliance instances, standalone or as an HA pair. An HA pair is
//! brought up strictly in order: the primary must be answering on its
//! management address before the secondary boots, because the secondary's
//! first-boot configuration joins it to the primary's cluster.

use crate::bootstrap::cloud_init_document;
use crate::error::{ApplianceError, Result};
use crate::lookup::server_for_hostname;
use crate::model::{
    ClusterInfo, HaCluster, HaClusterMember, LoadBalancer, NetworkAllocation,
    ProvisionedAppliance,
};
use crate::network::NetworkEngine;
use crate::payload::PayloadGenerator;
use crate::probe::ReadinessProbe;
use adcflow_cloud::{ComputeApi, NetworkApi, ServerRequest, ServerStatus};
use adcflow_config::Settings;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct Provisioner {
    compute: Arc<dyn ComputeApi>,
    engine: NetworkEngine,
    payloads: PayloadGenerator,
    probe: Arc<dyn ReadinessProbe>,
    settings: Arc<Settings>,
}

impl Provisioner {
    pub fn new(
        network: Arc<dyn NetworkApi>,
        compute: Arc<dyn ComputeApi>,
        probe: Arc<dyn ReadinessProbe>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            engine: NetworkEngine::new(network.clone(), settings.clone()),
            payloads: PayloadGenerator::new(network, settings.clone()),
            compute,
            probe,
            settings,
        }
    }

    pub fn network_engine(&self) -> &NetworkEngine {
        &self.engine
    }

    /// Boot one standalone appliance for a loadbalancer.
    pub async fn create_appliance(
        &self,
        lb: &LoadBalancer,
        hostname: &str,
    ) -> Result<ProvisionedAppliance> {
        let password = generate_password();
        let allocation = self.engine.configure(lb, hostname, None, false).await?;
        let user_data = self
            .payloads
            .generate(hostname, &password, &allocation, None)
            .await?;
        self.boot(lb, hostname, &allocation, cloud_init_document(&user_data)?, &password)
            .await?;
        info!(%hostname, mgmt_ip = %allocation.mgmt_ip, "appliance provisioned");
        Ok(ProvisionedAppliance {
            hostname: hostname.to_string(),
            mgmt_ip: allocation.mgmt_ip,
            password,
        })
    }

    /// Boot an HA pair sharing one admin password. The secondary carries a
    /// join document pointing at the primary, so the primary is booted and
    /// probed for readiness first.
    pub async fn create_ha_pair(
        &self,
        lb: &LoadBalancer,
        primary_name: &str,
        secondary_name: &str,
    ) -> Result<HaCluster> {
        let password = generate_password();

        let primary_alloc = self.engine.configure(lb, primary_name, None, true).await?;
        let secondary_alloc = self
            .engine
            .configure(
                lb,
                secondary_name,
                Some(primary_alloc.security_groups.clone()),
                true,
            )
            .await?;

        let primary_cluster = ClusterInfo {
            is_primary: true,
            peer_name: secondary_name.to_string(),
            peer_addr: cluster_addr(&secondary_alloc, secondary_name)?,
        };
        let secondary_cluster = ClusterInfo {
            is_primary: false,
            peer_name: primary_name.to_string(),
            peer_addr: cluster_addr(&primary_alloc, primary_name)?,
        };

        let primary_data = self
            .payloads
            .generate(primary_name, &password, &primary_alloc, Some(&primary_cluster))
            .await?;
        self.boot(
            lb,
            primary_name,
            &primary_alloc,
            cloud_init_document(&primary_data)?,
            &password,
        )
        .await?;

        self.probe.wait_ready(&primary_alloc.mgmt_ip).await?;

        let secondary_data = self
            .payloads
            .generate(
                secondary_name,
                &password,
                &secondary_alloc,
                Some(&secondary_cluster),
            )
            .await?;
        self.boot(
            lb,
            secondary_name,
            &secondary_alloc,
            cloud_init_document(&secondary_data)?,
            &password,
        )
        .await?;

        info!(
            primary = %primary_name,
            secondary = %secondary_name,
            "HA pair provisioned"
        );
        Ok(HaCluster {
            password,
            members: vec![
                HaClusterMember {
                    hostname: primary_name.to_string(),
                    mgmt_ip: primary_alloc.mgmt_ip,
                },
                HaClusterMember {
                    hostname: secondary_name.to_string(),
                    mgmt_ip: secondary_alloc.mgmt_ip,
                },
            ],
        })
    }

    /// Whether an instance for this hostname already exists.
    pub async fn appliance_exists(&self, lb: &LoadBalancer, hostname: &str) -> Result<bool> {
        match server_for_hostname(self.compute.as_ref(), &lb.tenant_id, hostname).await {
            Ok(_) => Ok(true),
            Err(ApplianceError::InstanceNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Create the instance, lock it against manual deletion, then wait for
    /// the build to settle.
    async fn boot(
        &self,
        lb: &LoadBalancer,
        hostname: &str,
        allocation: &NetworkAllocation,
        cloud_init: String,
        password: &str,
    ) -> Result<()> {
        let server = self
            .compute
            .create_server(&ServerRequest {
                tenant_id: lb.tenant_id.clone(),
                hostname: hostname.to_string(),
                image_id: self.settings.lbaas.image_id.clone(),
                flavor_id: self.settings.lbaas.flavor_id.clone(),
                user_data: STANDARD.encode(cloud_init),
                admin_password: password.to_string(),
                ports: allocation.nic_ports.clone(),
                config_drive: true,
            })
            .await?;
        self.compute.set_lock(&lb.tenant_id, &server.id, true).await?;
        self.await_build(&lb.tenant_id, &server.id, hostname).await
    }

    /// Poll the instance until it leaves BUILD, up to the configured
    /// timeout. Failed or timed-out builds are deleted before erroring.
    async fn await_build(&self, tenant_id: &str, server_id: &str, hostname: &str) -> Result<()> {
        let timing = &self.settings.timing;
        let deadline = Instant::now() + Duration::from_secs(timing.build_timeout_secs);
        let interval = Duration::from_secs(timing.build_poll_interval_secs);

        loop {
            let server = self.compute.get_server(tenant_id, server_id).await?;
            match server.status {
                ServerStatus::Error => {
                    self.force_delete(tenant_id, server_id).await;
                    return Err(ApplianceError::BuildFailed {
                        hostname: hostname.to_string(),
                    });
                }
                ServerStatus::Build => {}
                ServerStatus::Active | ServerStatus::Other(_) => return Ok(()),
            }
            if Instant::now() >= deadline {
                self.force_delete(tenant_id, server_id).await;
                return Err(ApplianceError::BuildTimedOut {
                    hostname: hostname.to_string(),
                    waited_secs: timing.build_timeout_secs,
                });
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Best-effort unlock-and-delete of a dead instance. The build error is
    /// the one worth surfacing, so deletion failures only warn.
    async fn force_delete(&self, tenant_id: &str, server_id: &str) {
        if let Err(err) = self.compute.set_lock(tenant_id, server_id, false).await {
            warn!(%server_id, error = %err, "could not unlock failed instance");
        }
        if let Err(err) = self.compute.delete_server(tenant_id, server_id).await {
            warn!(%server_id, error = %err, "could not delete failed instance");
        }
    }
}

fn cluster_addr(allocation: &NetworkAllocation, hostname: &str) -> Result<String> {
    allocation
        .cluster_addr
        .clone()
        .ok_or_else(|| ApplianceError::MissingAddress(format!("{hostname} has no cluster address")))
}

/// Random alphanumeric admin password, 12 to 16 characters.
pub fn generate_password() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(12..=16);
    (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
