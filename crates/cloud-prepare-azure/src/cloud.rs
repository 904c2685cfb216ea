//! Azure implementation of the `Cloud` contract

use async_trait::async_trait;
use cloud_prepare_core::{
    Cloud, Error, PrepareForSubmarinerInput, ReportResult, Reporter, Result, format_ports,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::auth::Credential;
use crate::client::{ArmClientOptions, ArmNetworkClient, NetworkApi};
use crate::constants::{BASE_PRIORITY, FRONTEND_IP_CONFIGURATION_NAME, MAX_PRIORITY};
use crate::{gateway, security_groups};

/// Where the cluster lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudInfo {
    /// Subscription that owns the cluster
    pub subscription_id: String,
    /// Cluster infrastructure ID, the prefix of every cluster resource name
    pub infra_id: String,
    /// Azure region new resources are created in
    pub region: String,
    /// Resource group holding the cluster's network resources
    pub base_group_name: String,
}

/// Prepares an OpenShift-on-Azure cluster for Submariner
///
/// # Prepare
///
/// 1. Gateway security group with inbound rules for the ports
/// 2. Load-balancing rules on the public load balancer
/// 3. Internal security group rules plus subnet associations
///
/// # Cleanup
///
/// The same steps reverted, in the same order.
pub struct AzureCloud {
    info: CloudInfo,
    network: Arc<dyn NetworkApi>,
}

impl std::fmt::Debug for AzureCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCloud").field("info", &self.info).finish()
    }
}

impl AzureCloud {
    /// Create a cloud talking to ARM with the given credential
    pub fn new(info: CloudInfo, credential: Credential, options: ArmClientOptions) -> Result<Self> {
        let client = ArmNetworkClient::new(
            info.subscription_id.clone(),
            info.base_group_name.clone(),
            credential,
            options,
        )?;

        Ok(Self::with_network(info, Arc::new(client)))
    }

    /// Create a cloud on top of an existing network API implementation
    pub fn with_network(info: CloudInfo, network: Arc<dyn NetworkApi>) -> Self {
        Self { info, network }
    }

    /// Cluster location this cloud operates on
    pub fn info(&self) -> &CloudInfo {
        &self.info
    }
}

/// Reject inputs Azure cannot represent before touching any resource
fn validate_input(input: &PrepareForSubmarinerInput) -> Result<()> {
    let ports = &input.internal_ports;

    if ports.is_empty() {
        return Err(Error::invalid_input("no ports to open"));
    }

    let capacity = (MAX_PRIORITY - BASE_PRIORITY + 1) as usize;
    if ports.len() > capacity {
        return Err(Error::invalid_input(format!(
            "{} ports requested, a security group holds at most {} rules in its priority range",
            ports.len(),
            capacity
        )));
    }

    let mut seen = HashSet::new();
    for port in ports {
        if port.port == 0 {
            return Err(Error::invalid_input("port 0 cannot be opened"));
        }
        if !seen.insert(*port) {
            return Err(Error::invalid_input(format!("port {} listed twice", port)));
        }
    }

    Ok(())
}

#[async_trait]
impl Cloud for AzureCloud {
    async fn prepare_for_submariner(
        &self,
        input: &PrepareForSubmarinerInput,
        reporter: &dyn Reporter,
    ) -> Result<()> {
        reporter.started("Opening internal ports for intra-cluster communications on Azure");

        let api = self.network.as_ref();
        let ports = &input.internal_ports;

        validate_input(input).or_report(reporter)?;

        gateway::open_gateway_ports(api, &self.info, ports)
            .await
            .or_report(reporter)?;

        gateway::create_load_balancing_rules(api, &self.info, FRONTEND_IP_CONFIGURATION_NAME, ports)
            .await
            .or_report(reporter)?;

        security_groups::open_internal_ports(api, &self.info, ports)
            .await
            .or_report(reporter)?;

        reporter.succeeded(&format!(
            "Opened internal ports {:?} for intra-cluster communications on Azure",
            format_ports(ports)
        ));

        Ok(())
    }

    async fn cleanup_after_submariner(&self, reporter: &dyn Reporter) -> Result<()> {
        reporter.started("Revoking intra-cluster communication permissions");

        let api = self.network.as_ref();

        gateway::remove_gateway_firewall_rules(api, &self.info)
            .await
            .or_report(reporter)?;

        gateway::delete_load_balancing_rules(api, &self.info)
            .await
            .or_report(reporter)?;

        security_groups::remove_internal_firewall_rules(api, &self.info)
            .await
            .or_report(reporter)?;

        reporter.succeeded("Revoked intra-cluster communication permissions");

        Ok(())
    }

    fn cloud_name(&self) -> &'static str {
        "azure"
    }
}
