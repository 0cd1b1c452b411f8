mod common;

use adcflow_appliance::{
    ApplianceError, CleanupResource, Decommissioner, Provisioner,
};
use adcflow_cloud::NetworkApi;
use adcflow_config::ManagementMode;
use common::{FakeCloud, InstantProbe, test_lb, test_settings};
use std::sync::Arc;

/// Boot one appliance and attach the VIP port to its instance, the state a
/// teardown normally starts from.
async fn provisioned_cloud() -> (Arc<FakeCloud>, adcflow_appliance::LoadBalancer, String) {
    let cloud = Arc::new(FakeCloud::new());
    let probe = Arc::new(InstantProbe::default());
    let provisioner = Provisioner::new(
        cloud.clone(),
        cloud.clone(),
        probe,
        Arc::new(test_settings(ManagementMode::FloatingIp)),
    );
    let lb = test_lb("port-vip");
    provisioner.create_appliance(&lb, "vtm-1").await.unwrap();

    let server_id = cloud.list_servers_snapshot()[0].id.clone();
    cloud.seed_port("port-vip", common::DATA_NET, Some(&server_id));

    // The VIP port carries the loadbalancer's service group, like it would
    // after the listener ports were opened on it.
    let service_group = cloud.group_named("lbaas-lb-1").unwrap().id;
    cloud
        .update_port_security_groups("port-vip", std::slice::from_ref(&service_group))
        .await
        .unwrap();
    (cloud, lb, server_id)
}

#[tokio::test]
async fn destroy_reaps_everything_but_the_vip_port() {
    let (cloud, lb, server_id) = provisioned_cloud().await;
    let decom = Decommissioner::new(cloud.clone(), cloud.clone());

    let ports_before = cloud.port_count();
    assert_eq!(ports_before, 2);
    assert!(cloud.is_locked(&server_id));

    let warnings = decom.destroy(&lb, "vtm-1").await.unwrap();

    assert!(warnings.is_empty());
    assert_eq!(cloud.server_count(), 0);
    assert_eq!(cloud.floating_ip_count(), 0);
    assert_eq!(cloud.group_count(), 0);

    // The VIP port survives with its groups stripped; the data port is gone
    assert_eq!(cloud.port_count(), 1);
    let vip = cloud.port("port-vip").unwrap();
    assert!(vip.security_groups.is_empty());
}

#[tokio::test]
async fn cleanup_failures_come_back_as_warnings_not_errors() {
    let (cloud, lb, _) = provisioned_cloud().await;
    cloud.fail_group_delete();
    cloud.fail_floating_ip_delete();
    let decom = Decommissioner::new(cloud.clone(), cloud.clone());

    let warnings = decom.destroy(&lb, "vtm-1").await.unwrap();

    // The instance still went away
    assert_eq!(cloud.server_count(), 0);

    assert!(warnings
        .iter()
        .any(|w| w.resource == CleanupResource::FloatingIp));
    assert!(warnings
        .iter()
        .any(|w| w.resource == CleanupResource::SecurityGroup));

    // VIP port handling is unaffected by the warnings
    let vip = cloud.port("port-vip").unwrap();
    assert!(vip.security_groups.is_empty());
}

#[tokio::test]
async fn destroying_an_unknown_hostname_fails_cleanly() {
    let cloud = Arc::new(FakeCloud::new());
    let decom = Decommissioner::new(cloud.clone(), cloud.clone());
    let lb = test_lb("port-vip");

    let result = decom.destroy(&lb, "vtm-ghost").await;
    assert!(matches!(
        result,
        Err(ApplianceError::InstanceNotFound(hostname)) if hostname == "vtm-ghost"
    ));
}
