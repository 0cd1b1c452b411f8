mod common;

use adcflow_appliance::lookup::{data_port_for_server, server_for_hostname};
use adcflow_appliance::{ApplianceError, Provisioner};
use adcflow_appliance::probe::ReadinessProbe;
use adcflow_config::ManagementMode;
use common::{FakeCloud, InstantProbe, test_lb, test_settings};
use std::sync::Arc;

#[tokio::test]
async fn the_data_port_is_the_one_without_a_mgmt_prefix() {
    let cloud = Arc::new(FakeCloud::new());
    let probe: Arc<dyn ReadinessProbe> = Arc::new(InstantProbe::default());
    let provisioner = Provisioner::new(
        cloud.clone(),
        cloud.clone(),
        probe,
        Arc::new(test_settings(ManagementMode::MgmtNet)),
    );
    let lb = test_lb("port-vip");
    provisioner.create_appliance(&lb, "vtm-1").await.unwrap();

    let server = server_for_hostname(cloud.as_ref(), "tenant-1", "vtm-1")
        .await
        .unwrap();
    assert_eq!(server.name, "vtm-1");

    // Both the data and management ports hang off the instance; lookup
    // must pick the data one
    let port = data_port_for_server(cloud.as_ref(), &server.id, "vtm-1")
        .await
        .unwrap();
    assert_eq!(port.name, "data-vtm-1");
}

#[tokio::test]
async fn lookups_fail_loudly_when_nothing_matches() {
    let cloud = Arc::new(FakeCloud::new());

    let result = server_for_hostname(cloud.as_ref(), "tenant-1", "vtm-ghost").await;
    assert!(matches!(result, Err(ApplianceError::InstanceNotFound(_))));

    let result = data_port_for_server(cloud.as_ref(), "server-none", "vtm-ghost").await;
    assert!(matches!(result, Err(ApplianceError::DataPortNotFound(_))));
}
