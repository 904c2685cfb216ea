//! Contract Test: Configuration Files and the Registry
//!
//! Constraints verified:
//! - A JSON config file is loaded, defaulted and validated
//! - Invalid files are rejected with a configuration error
//! - The registry builds the configured cloud

mod common;

use cloud_prepare_core::{Cloud, CloudRegistry, Error, PortSpec, PrepareConfig};
use common::*;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn azure_file_is_loaded_with_defaults() {
    let file = write_config(
        r#"{
            "cloud": {
                "type": "azure",
                "subscription_id": "00000000-0000-0000-0000-000000000000",
                "infra_id": "cluster-x7k2p",
                "region": "eastus",
                "resource_group": "cluster-x7k2p-rg",
                "access_token": "eyJ0eXAiOiJKV1Qi"
            },
            "internal_ports": [
                { "port": 4500, "protocol": "udp" },
                { "port": 4490, "protocol": "udp" }
            ]
        }"#,
    );

    let config = PrepareConfig::from_file(file.path()).expect("config loads");

    assert_eq!(config.cloud.type_name(), "azure");
    assert_eq!(
        config.internal_ports,
        vec![PortSpec::udp(4500), PortSpec::udp(4490)]
    );
    assert_eq!(config.operation.timeout_secs, 300);
    assert_eq!(config.operation.poll_interval_secs, 5);
    assert!(!config.operation.dry_run);
}

#[test]
fn file_without_credentials_is_rejected() {
    let file = write_config(
        r#"{
            "cloud": {
                "type": "azure",
                "subscription_id": "sub",
                "infra_id": "infra",
                "region": "eastus",
                "resource_group": "rg"
            }
        }"#,
    );

    let err = PrepareConfig::from_file(file.path()).expect_err("missing credentials");
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn malformed_file_is_a_config_error() {
    let file = write_config("{ not json");
    let err = PrepareConfig::from_file(file.path()).expect_err("malformed");
    assert!(matches!(err, Error::Config(ref m) if m.contains("Failed to parse")));
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = PrepareConfig::from_file(dir.path().join("absent.json")).expect_err("missing");
    assert!(matches!(err, Error::Config(ref m) if m.contains("Failed to read")));
}

#[tokio::test]
async fn registry_builds_configured_cloud() {
    let file = write_config(r#"{ "cloud": { "type": "custom", "factory": "steps", "config": {} } }"#);
    let config = PrepareConfig::from_file(file.path()).expect("config loads");

    let registry = CloudRegistry::new();
    registry.register_cloud("steps", Box::new(StepCloudFactory));

    let cloud = registry.create_cloud(&config).expect("cloud created");
    assert_eq!(cloud.cloud_name(), "steps");

    let reporter = cloud_prepare_core::RecordingReporter::new();
    cloud
        .cleanup_after_submariner(&reporter)
        .await
        .expect("cleanup succeeds");
    assert_eq!(reporter.failure_count(), 0);
}
