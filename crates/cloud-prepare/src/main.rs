// # cloud-prepare - Submariner cloud preparation
//
// This binary is a THIN integration layer:
// - Reads configuration from a JSON file, flags and environment variables
// - Initializes logging and the runtime
// - Registers the built-in clouds and runs `prepare` or `cleanup`
//
// All provisioning logic lives in the cloud crates.
//
// ## Configuration
//
// Flags override values from `--config`. Every flag has an environment
// variable fallback:
//
// ### Cluster
// - `AZURE_SUBSCRIPTION_ID`: Subscription that owns the cluster
// - `CLOUD_PREPARE_INFRA_ID`: Cluster infrastructure ID
// - `AZURE_REGION`: Region new resources are created in
// - `CLOUD_PREPARE_RESOURCE_GROUP`: Resource group of the cluster network
//
// ### Credentials
// - `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`: service principal
// - `AZURE_ACCESS_TOKEN`: pre-acquired ARM token (takes precedence)
//
// ### Operation
// - `CLOUD_PREPARE_PORTS`: Comma-separated ports for `prepare`, e.g. `4500/udp,4490/udp`
// - `CLOUD_PREPARE_TIMEOUT_SECS`: Deadline for each cloud operation
// - `CLOUD_PREPARE_POLL_INTERVAL_SECS`: Delay between operation status checks
// - `CLOUD_PREPARE_DRY_RUN`: Log writes instead of performing them
// - `CLOUD_PREPARE_LOG_LEVEL`: trace, debug, info, warn or error
//
// ## Example
//
// ```bash
// export AZURE_SUBSCRIPTION_ID=00000000-0000-0000-0000-000000000000
// export AZURE_TENANT_ID=... AZURE_CLIENT_ID=... AZURE_CLIENT_SECRET=...
//
// cloud-prepare --infra-id mycluster-x7k2p --region eastus \
//     --resource-group mycluster-x7k2p-rg \
//     prepare --port 4500/udp,4490/udp,8080/tcp
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cloud_prepare_core::{
    CloudConfig, CloudRegistry, PortSpec, PrepareConfig, PrepareForSubmarinerInput,
    TracingReporter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Operation completed
/// - 1: Configuration or startup error
/// - 2: Provisioning failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrepareExitCode {
    /// Operation completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// The cloud operation failed
    RuntimeError = 2,
}

impl From<PrepareExitCode> for ExitCode {
    fn from(code: PrepareExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Prepare a cluster's cloud networking for Submariner
#[derive(Parser)]
#[command(
    name = "cloud-prepare",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true, env = "CLOUD_PREPARE_CONFIG")]
    config: Option<PathBuf>,

    /// Subscription that owns the cluster
    #[arg(long, global = true, env = "AZURE_SUBSCRIPTION_ID")]
    subscription_id: Option<String>,

    /// Cluster infrastructure ID
    #[arg(long, global = true, env = "CLOUD_PREPARE_INFRA_ID")]
    infra_id: Option<String>,

    /// Region new resources are created in
    #[arg(long, global = true, env = "AZURE_REGION")]
    region: Option<String>,

    /// Resource group holding the cluster network
    #[arg(long, global = true, env = "CLOUD_PREPARE_RESOURCE_GROUP")]
    resource_group: Option<String>,

    /// Azure AD tenant of the service principal
    #[arg(long, global = true, env = "AZURE_TENANT_ID")]
    tenant_id: Option<String>,

    /// Service principal application ID
    #[arg(long, global = true, env = "AZURE_CLIENT_ID")]
    client_id: Option<String>,

    /// Service principal secret
    #[arg(long, global = true, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Pre-acquired ARM bearer token
    #[arg(long, global = true, env = "AZURE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Deadline for each cloud operation, in seconds
    #[arg(long, global = true, env = "CLOUD_PREPARE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Delay between status checks of a running operation, in seconds
    #[arg(long, global = true, env = "CLOUD_PREPARE_POLL_INTERVAL_SECS")]
    poll_interval_secs: Option<u64>,

    /// Log the writes that would be made instead of making them
    #[arg(long, global = true, env = "CLOUD_PREPARE_DRY_RUN")]
    dry_run: bool,

    /// Log verbosity
    #[arg(
        long,
        global = true,
        env = "CLOUD_PREPARE_LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the Submariner ports
    Prepare {
        /// Port to open, as `<port>/<tcp|udp>`; repeat or comma-separate
        #[arg(long = "port", env = "CLOUD_PREPARE_PORTS", value_delimiter = ',')]
        ports: Vec<PortSpec>,
    },

    /// Remove everything `prepare` created
    Cleanup,
}

/// Replace `target` when a flag was given
fn override_with(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

/// Replace an optional `target` when a flag was given
fn override_optional(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        *target = value.clone();
    }
}

impl Cli {
    /// Names of the Azure-only flags that were given
    fn azure_flags(&self) -> Vec<&'static str> {
        [
            ("--subscription-id", self.subscription_id.is_some()),
            ("--infra-id", self.infra_id.is_some()),
            ("--region", self.region.is_some()),
            ("--resource-group", self.resource_group.is_some()),
            ("--tenant-id", self.tenant_id.is_some()),
            ("--client-id", self.client_id.is_some()),
            ("--client-secret", self.client_secret.is_some()),
            ("--access-token", self.access_token.is_some()),
        ]
        .into_iter()
        .filter_map(|(flag, given)| given.then_some(flag))
        .collect()
    }

    /// Merge the configuration file (if any) with flags and validate the result
    fn build_config(&self) -> Result<PrepareConfig> {
        let mut config = match &self.config {
            Some(path) => PrepareConfig::load(path)?,
            None => PrepareConfig::new(CloudConfig::Azure {
                subscription_id: String::new(),
                infra_id: String::new(),
                region: String::new(),
                resource_group: String::new(),
                tenant_id: None,
                client_id: None,
                client_secret: None,
                access_token: None,
                resource_manager_endpoint: None,
                authority_host: None,
            }),
        };

        match &mut config.cloud {
            CloudConfig::Azure {
                subscription_id,
                infra_id,
                region,
                resource_group,
                tenant_id,
                client_id,
                client_secret,
                access_token,
                ..
            } => {
                override_with(subscription_id, &self.subscription_id);
                override_with(infra_id, &self.infra_id);
                override_with(region, &self.region);
                override_with(resource_group, &self.resource_group);
                override_optional(tenant_id, &self.tenant_id);
                override_optional(client_id, &self.client_id);
                override_optional(client_secret, &self.client_secret);
                override_optional(access_token, &self.access_token);
            }
            CloudConfig::Custom { factory, .. } => {
                let flags = self.azure_flags();
                if !flags.is_empty() {
                    anyhow::bail!(
                        "Azure flags ({}) cannot be combined with the '{}' cloud from the configuration file",
                        flags.join(", "),
                        factory
                    );
                }
            }
        }

        if let Some(timeout_secs) = self.timeout_secs {
            config.operation.timeout_secs = timeout_secs;
            // A shorter deadline than the configured poll interval is still usable
            if self.poll_interval_secs.is_none() {
                config.operation.poll_interval_secs =
                    config.operation.poll_interval_secs.min(timeout_secs);
            }
        }
        if let Some(poll_interval_secs) = self.poll_interval_secs {
            config.operation.poll_interval_secs = poll_interval_secs;
        }
        if self.dry_run {
            config.operation.dry_run = true;
        }
        if let Command::Prepare { ports } = &self.command
            && !ports.is_empty()
        {
            config.internal_ports = ports.clone();
        }

        config.validate().context("Invalid configuration")?;

        if matches!(self.command, Command::Prepare { .. }) && config.internal_ports.is_empty() {
            anyhow::bail!(
                "No ports to open. Pass --port 4500/udp or set CLOUD_PREPARE_PORTS=4500/udp,4490/udp"
            );
        }

        Ok(config)
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.build_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return PrepareExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&cli.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PrepareExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PrepareExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(&cli.command, config)).into()
}

/// Build the cloud from the configuration and run the requested operation
async fn run(command: &Command, config: PrepareConfig) -> PrepareExitCode {
    let registry = CloudRegistry::new();

    #[cfg(feature = "azure")]
    {
        info!("Registering Azure cloud");
        cloud_prepare_azure::register(&registry);
    }

    let cloud = match registry.create_cloud(&config) {
        Ok(cloud) => cloud,
        Err(e) => {
            error!("Failed to create cloud: {}", e);
            return PrepareExitCode::ConfigError;
        }
    };

    if config.operation.dry_run {
        info!("Dry-run mode: no changes will be made");
    }

    let reporter = TracingReporter::new(cloud.cloud_name());

    let result = match command {
        Command::Prepare { .. } => {
            let input = PrepareForSubmarinerInput::new(config.internal_ports.clone());
            cloud.prepare_for_submariner(&input, &reporter).await
        }
        Command::Cleanup => cloud.cleanup_after_submariner(&reporter).await,
    };

    match result {
        Ok(()) => PrepareExitCode::Success,
        Err(e) => {
            error!("Operation failed: {}", e);
            PrepareExitCode::RuntimeError
        }
    }
}
