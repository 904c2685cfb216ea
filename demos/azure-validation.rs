// # Azure Real Environment Validation Tool
//
// Runs prepare, a second prepare and optionally cleanup against a real
// cluster, reporting each step.
//
// ## Usage
//
// ```bash
// # Dry-run mode (default - safe)
// CLOUD_PREPARE_MODE=dry-run \
// AZURE_SUBSCRIPTION_ID=... AZURE_TENANT_ID=... \
// AZURE_CLIENT_ID=... AZURE_CLIENT_SECRET=... \
// CLOUD_PREPARE_INFRA_ID=mycluster-x7k2p \
// CLOUD_PREPARE_RESOURCE_GROUP=mycluster-x7k2p-rg \
// AZURE_REGION=eastus \
// cargo run -p demos --bin azure_validation
//
// # Live mode (makes actual changes!)
// CLOUD_PREPARE_MODE=live CLOUD_PREPARE_CLEANUP=true ... \
// cargo run -p demos --bin azure_validation
// ```
//
// ## Environment Variables
//
// Required:
// - `AZURE_SUBSCRIPTION_ID`, `CLOUD_PREPARE_INFRA_ID`, `AZURE_REGION`,
//   `CLOUD_PREPARE_RESOURCE_GROUP`
// - `AZURE_ACCESS_TOKEN`, or `AZURE_TENANT_ID` + `AZURE_CLIENT_ID` +
//   `AZURE_CLIENT_SECRET`
//
// Optional:
// - `CLOUD_PREPARE_PORTS`: Ports to open (default: 4500/udp,4490/udp)
// - `CLOUD_PREPARE_MODE`: "dry-run" or "live" (default: dry-run)
// - `CLOUD_PREPARE_CLEANUP`: "true" to clean up afterwards

use cloud_prepare_azure::AzureFactory;
use cloud_prepare_core::{
    CloudConfig, CloudFactory, OperationConfig, PortSpec, PrepareConfig,
    PrepareForSubmarinerInput, TracingReporter,
};
use std::env;

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        tracing::error!("{} environment variable is required", name);
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("=== Azure Real Environment Validation ===");

    let subscription_id = required("AZURE_SUBSCRIPTION_ID");
    let infra_id = required("CLOUD_PREPARE_INFRA_ID");
    let region = required("AZURE_REGION");
    let resource_group = required("CLOUD_PREPARE_RESOURCE_GROUP");

    let ports: Vec<PortSpec> = env::var("CLOUD_PREPARE_PORTS")
        .unwrap_or_else(|_| "4500/udp,4490/udp".to_string())
        .split(',')
        .map(str::parse)
        .collect::<Result<_, _>>()?;

    let mode = env::var("CLOUD_PREPARE_MODE").unwrap_or_else(|_| "dry-run".to_string());
    let dry_run = mode.to_lowercase() == "dry-run";
    let cleanup = env::var("CLOUD_PREPARE_CLEANUP").is_ok_and(|v| v == "true");

    if dry_run {
        tracing::warn!("Running in DRY-RUN mode - no changes will be made");
    } else {
        tracing::warn!("Running in LIVE mode - will make actual network changes!");
    }

    tracing::info!("Configuration:");
    tracing::info!("  Infra ID: {}", infra_id);
    tracing::info!("  Resource group: {}", resource_group);
    tracing::info!("  Region: {}", region);
    tracing::info!("  Ports: {}", cloud_prepare_core::format_ports(&ports));
    tracing::info!("  Mode: {}", mode);

    let config = PrepareConfig::new(CloudConfig::Azure {
        subscription_id,
        infra_id,
        region,
        resource_group,
        tenant_id: env::var("AZURE_TENANT_ID").ok(),
        client_id: env::var("AZURE_CLIENT_ID").ok(),
        client_secret: env::var("AZURE_CLIENT_SECRET").ok(),
        access_token: env::var("AZURE_ACCESS_TOKEN").ok(),
        resource_manager_endpoint: None,
        authority_host: None,
    })
    .with_internal_ports(ports.clone())
    .with_operation(OperationConfig {
        dry_run,
        ..Default::default()
    });
    config.validate()?;

    tracing::info!("--- Step 1: Creating Azure cloud ---");
    let cloud = AzureFactory.create(&config)?;
    tracing::info!("Cloud created (credentials not shown for security)");

    let reporter = TracingReporter::new(cloud.cloud_name());
    let input = PrepareForSubmarinerInput::new(ports);

    tracing::info!("--- Step 2: Preparing ---");
    cloud.prepare_for_submariner(&input, &reporter).await?;

    if dry_run {
        // Nothing was written, so the second pass plans the same writes again
        tracing::info!("--- Step 3: Preparing again (dry-run repeats the planned writes) ---");
    } else {
        tracing::info!("--- Step 3: Preparing again (should make no changes) ---");
    }
    cloud.prepare_for_submariner(&input, &reporter).await?;

    if cleanup {
        tracing::info!("--- Step 4: Cleaning up ---");
        cloud.cleanup_after_submariner(&reporter).await?;
    } else {
        tracing::info!("--- Step 4: Skipped cleanup (set CLOUD_PREPARE_CLEANUP=true) ---");
    }

    tracing::info!("=== Validation Summary ===");
    tracing::info!("✓ Cloud creation: OK");
    tracing::info!("✓ Prepare: OK");
    if dry_run {
        tracing::info!("- Idempotent prepare: not checked in dry-run mode");
    } else {
        tracing::info!("✓ Idempotent prepare: OK");
    }
    if cleanup {
        tracing::info!("✓ Cleanup: OK");
    }

    if dry_run {
        tracing::info!("=== DRY-RUN COMPLETE ===");
        tracing::info!("No changes were made. To make actual changes, set CLOUD_PREPARE_MODE=live");
    }

    Ok(())
}
