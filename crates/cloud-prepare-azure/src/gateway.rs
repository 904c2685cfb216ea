//! Gateway exposure: external security group and public load balancer rules
//!
//! Submariner gateways must be reachable from other clusters. This module
//! keeps a dedicated `<infra>-submariner-external-sg` group with inbound
//! rules for the gateway ports, and forwards those ports through the
//! cluster's public load balancer.

use cloud_prepare_core::{Error, PortSpec, Protocol, Result};

use crate::client::NetworkApi;
use crate::cloud::CloudInfo;
use crate::constants::{
    EXTERNAL_SECURITY_GROUP_SUFFIX, INBOUND_RULE_PREFIX, LB_IDLE_TIMEOUT_MINUTES,
    LOAD_BALANCING_RULE_PREFIX,
};
use crate::models::{
    ChildResource, Extra, LoadBalancingRule, LoadBalancingRuleProperties, SubResource,
    TransportProtocol,
};
use crate::security_groups::{ensure_security_group, rule_name};

/// Name of the gateway security group
pub fn external_security_group_name(infra_id: &str) -> String {
    format!("{}{}", infra_id, EXTERNAL_SECURITY_GROUP_SUFFIX)
}

/// Open `ports` for inbound traffic in the gateway security group
pub async fn open_gateway_ports(api: &dyn NetworkApi, info: &CloudInfo, ports: &[PortSpec]) -> Result<()> {
    let group_name = external_security_group_name(&info.infra_id);
    ensure_security_group(api, &group_name, &info.region, INBOUND_RULE_PREFIX, ports).await
}

/// Delete the gateway security group if it exists
pub async fn remove_gateway_firewall_rules(api: &dyn NetworkApi, info: &CloudInfo) -> Result<()> {
    let group_name = external_security_group_name(&info.infra_id);

    if api.get_security_group(&group_name).await?.is_none() {
        tracing::info!("Security group {} does not exist, nothing to remove", group_name);
        return Ok(());
    }

    api.delete_security_group(&group_name).await
}

/// Resolve a child resource's ID, deriving it from the parent when ARM omitted it
fn child_id(parent_id: &str, collection: &str, child: &ChildResource) -> String {
    child
        .id
        .clone()
        .unwrap_or_else(|| format!("{}/{}/{}", parent_id, collection, child.name))
}

fn transport_protocol(protocol: Protocol) -> TransportProtocol {
    match protocol {
        Protocol::Tcp => TransportProtocol::Tcp,
        Protocol::Udp => TransportProtocol::Udp,
    }
}

/// Build the load-balancing rule forwarding one port
fn load_balancing_rule(port: &PortSpec, frontend_id: &str, backend_pool_id: &str) -> LoadBalancingRule {
    LoadBalancingRule {
        id: None,
        name: rule_name(LOAD_BALANCING_RULE_PREFIX, port),
        properties: LoadBalancingRuleProperties {
            frontend_ip_configuration: Some(SubResource::new(frontend_id)),
            backend_address_pool: Some(SubResource::new(backend_pool_id)),
            protocol: transport_protocol(port.protocol),
            frontend_port: port.port,
            backend_port: Some(port.port),
            enable_floating_ip: Some(false),
            idle_timeout_in_minutes: Some(LB_IDLE_TIMEOUT_MINUTES),
            // The public LB already carries outbound rules for this frontend
            disable_outbound_snat: Some(true),
            extra: Extra::new(),
        },
        extra: Extra::new(),
    }
}

/// Forward `ports` through the cluster's public load balancer
///
/// The load balancer is named after the infrastructure ID and must expose
/// `frontend_name` as a frontend IP configuration and a backend pool named
/// after the infrastructure ID. Missing rules are added; nothing is written
/// when all rules are present.
pub async fn create_load_balancing_rules(
    api: &dyn NetworkApi,
    info: &CloudInfo,
    frontend_name: &str,
    ports: &[PortSpec],
) -> Result<()> {
    let lb_name = &info.infra_id;

    let mut lb = api
        .get_load_balancer(lb_name)
        .await?
        .ok_or_else(|| Error::not_found(format!("load balancer {}", lb_name)))?;

    let lb_id = lb
        .id
        .clone()
        .ok_or_else(|| Error::provider("azure", format!("load balancer {} has no resource ID", lb_name)))?;

    let frontend_id = lb
        .properties
        .frontend_ip_configurations
        .iter()
        .find(|f| f.name == frontend_name)
        .map(|f| child_id(&lb_id, "frontendIPConfigurations", f))
        .ok_or_else(|| {
            Error::not_found(format!(
                "frontend IP configuration {} on load balancer {}",
                frontend_name, lb_name
            ))
        })?;

    let backend_pool_id = lb
        .properties
        .backend_address_pools
        .iter()
        .find(|p| &p.name == lb_name)
        .map(|p| child_id(&lb_id, "backendAddressPools", p))
        .ok_or_else(|| {
            Error::not_found(format!(
                "backend address pool {} on load balancer {}",
                lb_name, lb_name
            ))
        })?;

    let mut added = 0;
    for port in ports {
        let name = rule_name(LOAD_BALANCING_RULE_PREFIX, port);
        let rules = &lb.properties.load_balancing_rules;

        if rules.iter().any(|r| r.name == name) {
            continue;
        }

        let protocol = transport_protocol(port.protocol);
        if let Some(clash) = rules.iter().find(|r| {
            r.properties.frontend_port == port.port
                && (r.properties.protocol == protocol || r.properties.protocol == TransportProtocol::All)
                && r
                    .properties
                    .frontend_ip_configuration
                    .as_ref()
                    .is_some_and(|f| f.refers_to(&frontend_id))
        }) {
            return Err(Error::invalid_input(format!(
                "port {} is already forwarded by rule {} on load balancer {}",
                port, clash.name, lb_name
            )));
        }

        lb.properties
            .load_balancing_rules
            .push(load_balancing_rule(port, &frontend_id, &backend_pool_id));
        added += 1;
    }

    if added == 0 {
        tracing::info!("Load balancer {} already forwards all Submariner ports", lb_name);
        return Ok(());
    }

    tracing::info!("Adding {} Submariner rule(s) to load balancer {}", added, lb_name);
    api.create_or_update_load_balancer(&lb).await
}

/// Remove every Submariner rule from the public load balancer
///
/// A missing load balancer is not an error.
pub async fn delete_load_balancing_rules(api: &dyn NetworkApi, info: &CloudInfo) -> Result<()> {
    let lb_name = &info.infra_id;

    let Some(mut lb) = api.get_load_balancer(lb_name).await? else {
        tracing::info!("Load balancer {} does not exist, nothing to remove", lb_name);
        return Ok(());
    };

    let before = lb.properties.load_balancing_rules.len();
    lb.properties
        .load_balancing_rules
        .retain(|r| !r.name.starts_with(LOAD_BALANCING_RULE_PREFIX));
    let removed = before - lb.properties.load_balancing_rules.len();

    if removed == 0 {
        tracing::info!("Load balancer {} has no Submariner rules", lb_name);
        return Ok(());
    }

    tracing::info!("Removing {} Submariner rule(s) from load balancer {}", removed, lb_name);
    api.create_or_update_load_balancer(&lb).await
}
