// # Azure Cloud Preparation
//
// This crate prepares an OpenShift cluster on Azure for Submariner.
//
// ## What Gets Provisioned
//
// - `<infra>-submariner-external-sg`: inbound rules for the gateway ports
// - Public load balancer `<infra>`: one `Submariner-LB-*` rule per port
// - `<infra>-nsg`: `Submariner-Internal-*` rules, associated with the
//   worker and master subnets. A subnet already associated with another
//   group is never reassigned; prepare fails instead.
//
// Cleanup removes exactly those pieces and leaves everything else untouched.
//
// ## Security Requirements
//
// - Client secrets and tokens NEVER appear in logs
// - Credentials come from configuration or environment variables only
//
// ## API Reference
//
// - Azure Resource Manager network API, version 2021-03-01
// - Azure AD v2.0 token endpoint (client-credentials grant)

pub mod auth;
pub mod client;
pub mod cloud;
pub mod constants;
pub mod gateway;
pub mod models;
pub mod security_groups;

#[cfg(test)]
mod test_support;

use cloud_prepare_core::config::{CloudConfig, PrepareConfig};
use cloud_prepare_core::{Cloud, CloudFactory, Error, Result};
use std::time::Duration;

pub use auth::{Credential, TokenProvider};
pub use client::{ArmClientOptions, ArmNetworkClient, NetworkApi};
pub use cloud::{AzureCloud, CloudInfo};

/// Factory for creating Azure clouds
pub struct AzureFactory;

impl CloudFactory for AzureFactory {
    fn create(&self, config: &PrepareConfig) -> Result<Box<dyn Cloud>> {
        match &config.cloud {
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
            } => {
                let credential = match (access_token, tenant_id, client_id, client_secret) {
                    (Some(token), _, _, _) if !token.is_empty() => {
                        Credential::AccessToken(token.clone())
                    }
                    (_, Some(tenant_id), Some(client_id), Some(client_secret)) => {
                        Credential::ClientSecret {
                            tenant_id: tenant_id.clone(),
                            client_id: client_id.clone(),
                            client_secret: client_secret.clone(),
                            authority_host: authority_host
                                .clone()
                                .unwrap_or_else(|| constants::AUTHORITY_HOST.to_string()),
                        }
                    }
                    _ => {
                        return Err(Error::config(
                            "Azure credentials missing: set access_token, or tenant_id, client_id and client_secret",
                        ));
                    }
                };

                let options = ArmClientOptions {
                    resource_manager_endpoint: resource_manager_endpoint
                        .clone()
                        .unwrap_or_else(|| constants::RESOURCE_MANAGER_ENDPOINT.to_string()),
                    operation_timeout: Duration::from_secs(config.operation.timeout_secs),
                    poll_interval: Duration::from_secs(config.operation.poll_interval_secs),
                    dry_run: config.operation.dry_run,
                };

                let info = CloudInfo {
                    subscription_id: subscription_id.clone(),
                    infra_id: infra_id.clone(),
                    region: region.clone(),
                    base_group_name: resource_group.clone(),
                };

                Ok(Box::new(AzureCloud::new(info, credential, options)?))
            }
            _ => Err(Error::config("Invalid config for Azure cloud")),
        }
    }
}

/// Register the Azure cloud with a registry
///
/// # Example
///
/// ```rust
/// use cloud_prepare_core::CloudRegistry;
///
/// let registry = CloudRegistry::new();
/// cloud_prepare_azure::register(&registry);
/// assert!(registry.has_cloud("azure"));
/// ```
pub fn register(registry: &cloud_prepare_core::CloudRegistry) {
    registry.register_cloud("azure", Box::new(AzureFactory));
}
