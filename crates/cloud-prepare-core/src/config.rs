//! Configuration types for cloud preparation
//!
//! This module defines all configuration structures used throughout the crate.
//! A [`PrepareConfig`] can be built in code or loaded from a JSON file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::ports::PortSpec;

/// Main preparation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    /// Cloud to prepare
    pub cloud: CloudConfig,

    /// Ports to open for intra-cluster communications
    #[serde(default)]
    pub internal_ports: Vec<PortSpec>,

    /// Long-running operation settings
    #[serde(default)]
    pub operation: OperationConfig,
}

impl PrepareConfig {
    /// Create a configuration for the given cloud with default settings
    pub fn new(cloud: CloudConfig) -> Self {
        Self {
            cloud,
            internal_ports: Vec::new(),
            operation: OperationConfig::default(),
        }
    }

    /// Set the ports to open
    pub fn with_internal_ports(mut self, ports: Vec<PortSpec>) -> Self {
        self.internal_ports = ports;
        self
    }

    /// Set the operation settings
    pub fn with_operation(mut self, operation: OperationConfig) -> Self {
        self.operation = operation;
        self
    }

    /// Load and validate a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file without validating it
    ///
    /// Callers that layer overrides on top of the file validate afterwards.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            crate::Error::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.cloud.validate()?;
        self.operation.validate()?;

        let mut seen = HashSet::new();
        for port in &self.internal_ports {
            if port.port == 0 {
                return Err(crate::Error::config("Port 0 cannot be opened"));
            }
            if !seen.insert(*port) {
                return Err(crate::Error::config(format!("Duplicate port {}", port)));
            }
        }

        Ok(())
    }
}

/// Cloud configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CloudConfig {
    /// Microsoft Azure
    Azure {
        /// Subscription that owns the cluster
        subscription_id: String,
        /// Cluster infrastructure ID (prefix of every cluster resource name)
        infra_id: String,
        /// Azure region (e.g., "eastus")
        region: String,
        /// Resource group holding the cluster's network resources
        resource_group: String,
        /// Azure AD tenant (client secret authentication)
        #[serde(default)]
        tenant_id: Option<String>,
        /// Service principal application ID (client secret authentication)
        #[serde(default)]
        client_id: Option<String>,
        /// Service principal secret
        /// ⚠️ NEVER log this value
        #[serde(default)]
        client_secret: Option<String>,
        /// Pre-acquired ARM bearer token, used instead of a service principal
        /// ⚠️ NEVER log this value
        #[serde(default)]
        access_token: Option<String>,
        /// ARM endpoint override (sovereign clouds)
        #[serde(default)]
        resource_manager_endpoint: Option<String>,
        /// Azure AD authority override (sovereign clouds)
        #[serde(default)]
        authority_host: Option<String>,
    },

    /// Custom cloud
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl CloudConfig {
    /// Validate the cloud configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
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
                for (name, value) in [
                    ("subscription_id", subscription_id),
                    ("infra_id", infra_id),
                    ("region", region),
                    ("resource_group", resource_group),
                ] {
                    if value.trim().is_empty() {
                        return Err(crate::Error::config(format!(
                            "Azure {} cannot be empty",
                            name
                        )));
                    }
                }

                let has_token = access_token.as_deref().is_some_and(|t| !t.is_empty());
                let has_principal = [tenant_id, client_id, client_secret]
                    .iter()
                    .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()));

                if !has_token && !has_principal {
                    return Err(crate::Error::config(
                        "Azure credentials missing: set access_token, or tenant_id, client_id and client_secret",
                    ));
                }
                Ok(())
            }
            CloudConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom cloud factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom cloud config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the cloud type name (the registry key)
    pub fn type_name(&self) -> &str {
        match self {
            CloudConfig::Azure { .. } => "azure",
            CloudConfig::Custom { factory, .. } => factory,
        }
    }
}

// Custom Debug implementation that hides credentials
impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudConfig::Azure {
                subscription_id,
                infra_id,
                region,
                resource_group,
                tenant_id,
                client_id,
                client_secret,
                access_token,
                resource_manager_endpoint,
                authority_host,
            } => f
                .debug_struct("Azure")
                .field("subscription_id", subscription_id)
                .field("infra_id", infra_id)
                .field("region", region)
                .field("resource_group", resource_group)
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &client_secret.as_ref().map(|_| "<REDACTED>"))
                .field("access_token", &access_token.as_ref().map(|_| "<REDACTED>"))
                .field("resource_manager_endpoint", resource_manager_endpoint)
                .field("authority_host", authority_host)
                .finish(),
            CloudConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

/// Long-running operation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationConfig {
    /// Deadline for each cloud operation, request plus completion wait (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between completion polls when the cloud gives no hint (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Perform lookups but only log the writes that would be made
    #[serde(default)]
    pub dry_run: bool,
}

impl OperationConfig {
    /// Validate the operation settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Operation timeout must be > 0"));
        }
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.poll_interval_secs > self.timeout_secs {
            return Err(crate::Error::config(format!(
                "Poll interval ({}s) cannot exceed the operation timeout ({}s)",
                self.poll_interval_secs, self.timeout_secs
            )));
        }
        Ok(())
    }
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            dry_run: false,
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    5
}
