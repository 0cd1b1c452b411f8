mod common;

use adcflow_appliance::ApplianceError;
use adcflow_appliance::probe::{ReadinessProbe, RestReadinessProbe};
use adcflow_config::ManagementMode;
use common::test_settings;
use std::sync::Arc;

#[tokio::test]
async fn readiness_wait_times_out_when_nothing_answers() {
    let mut settings = test_settings(ManagementMode::FloatingIp);
    settings.timing.cluster_ready_timeout_secs = 0;
    let probe = RestReadinessProbe::new(Arc::new(settings)).unwrap();

    // Nothing serves the appliance REST port on loopback; a zero deadline
    // turns the first failed attempt into the timeout error.
    let result = probe.wait_ready("127.0.0.1").await;
    assert!(matches!(
        result,
        Err(ApplianceError::ClusterReadyTimeout { addr, waited_secs: 0 }) if addr == "127.0.0.1"
    ));
}
