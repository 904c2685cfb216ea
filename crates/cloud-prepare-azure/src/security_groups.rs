//! Network security groups for intra-cluster traffic
//!
//! Submariner needs its ports open between cluster nodes. On Azure that means
//! inbound allow rules in the `<infra>-nsg` group, and that group being
//! associated with the cluster's worker and master subnets.

use cloud_prepare_core::{Error, PortSpec, Result};
use std::collections::HashSet;

use crate::client::NetworkApi;
use crate::cloud::CloudInfo;
use crate::constants::{
    ALL_NETWORK_CIDR, BASE_PRIORITY, INTERNAL_SECURITY_GROUP_SUFFIX, INTERNAL_SECURITY_RULE_PREFIX,
    MASTER_SUBNET_SUFFIX, MAX_PRIORITY, VNET_SUFFIX, WORKER_SUBNET_SUFFIX,
};
use crate::models::{
    Access, Direction, Extra, SecurityGroup, SecurityGroupProperties, SecurityRule,
    SecurityRuleProperties, SubResource,
};

/// Name of the cluster's internal security group
pub fn internal_security_group_name(infra_id: &str) -> String {
    format!("{}{}", infra_id, INTERNAL_SECURITY_GROUP_SUFFIX)
}

/// Name of a Submariner rule for a port, e.g. `Submariner-Internal-udp-4500`
pub fn rule_name(prefix: &str, port: &PortSpec) -> String {
    format!("{}{}-{}", prefix, port.protocol, port.port)
}

/// Cluster virtual network and the subnets that carry node traffic
fn cluster_subnets(infra_id: &str) -> (String, [String; 2]) {
    (
        format!("{}{}", infra_id, VNET_SUFFIX),
        [
            format!("{}{}", infra_id, WORKER_SUBNET_SUFFIX),
            format!("{}{}", infra_id, MASTER_SUBNET_SUFFIX),
        ],
    )
}

/// Build an inbound allow rule for a single port
pub fn create_security_rule(
    prefix: &str,
    source_prefix: &str,
    destination_prefix: &str,
    port: &PortSpec,
    priority: i32,
) -> SecurityRule {
    let protocol = match port.protocol {
        cloud_prepare_core::Protocol::Tcp => "Tcp",
        cloud_prepare_core::Protocol::Udp => "Udp",
    };

    SecurityRule {
        id: None,
        name: rule_name(prefix, port),
        properties: SecurityRuleProperties {
            protocol: protocol.to_string(),
            source_port_range: Some("*".to_string()),
            destination_port_range: Some(format!("{}-{}", port.port, port.port)),
            source_address_prefix: Some(source_prefix.to_string()),
            destination_address_prefix: Some(destination_prefix.to_string()),
            access: Access::Allow,
            priority,
            direction: Direction::Inbound,
            extra: Extra::new(),
        },
        extra: Extra::new(),
    }
}

/// Add the rules for `ports` that the group lacks
///
/// New rules take the lowest free inbound priorities starting at 100, so a
/// fresh group gets 100, 101, ... in port order.
///
/// # Returns
///
/// The number of rules added
pub(crate) fn merge_rules(group: &mut SecurityGroup, prefix: &str, ports: &[PortSpec]) -> Result<usize> {
    let rules = &mut group.properties.security_rules;

    let mut names: HashSet<String> = rules.iter().map(|r| r.name.clone()).collect();
    let mut used: HashSet<i32> = rules
        .iter()
        .filter(|r| r.properties.direction == Direction::Inbound)
        .map(|r| r.properties.priority)
        .collect();

    let mut priority = BASE_PRIORITY;
    let mut added = 0;

    for port in ports {
        let name = rule_name(prefix, port);
        if names.contains(&name) {
            continue;
        }

        while used.contains(&priority) {
            priority += 1;
        }
        if priority > MAX_PRIORITY {
            return Err(Error::invalid_input(format!(
                "no free rule priority left in security group {} for port {}",
                group.name, port
            )));
        }

        rules.push(create_security_rule(
            prefix,
            ALL_NETWORK_CIDR,
            ALL_NETWORK_CIDR,
            port,
            priority,
        ));
        used.insert(priority);
        names.insert(name);
        added += 1;
    }

    Ok(added)
}

/// Drop every rule whose name starts with `prefix`
///
/// # Returns
///
/// The number of rules removed
pub(crate) fn remove_rules(group: &mut SecurityGroup, prefix: &str) -> usize {
    let before = group.properties.security_rules.len();
    group
        .properties
        .security_rules
        .retain(|r| !r.name.starts_with(prefix));
    before - group.properties.security_rules.len()
}

/// Make sure a security group exists and holds a rule for every port
///
/// Creates the group when absent. Otherwise adds the missing rules and only
/// writes when something was added.
pub(crate) async fn ensure_security_group(
    api: &dyn NetworkApi,
    name: &str,
    region: &str,
    prefix: &str,
    ports: &[PortSpec],
) -> Result<()> {
    let (mut group, is_new) = match api.get_security_group(name).await? {
        Some(group) => (group, false),
        None => {
            tracing::info!("Security group {} does not exist, creating it", name);
            let group = SecurityGroup {
                name: name.to_string(),
                location: Some(region.to_string()),
                properties: SecurityGroupProperties::default(),
                ..Default::default()
            };
            (group, true)
        }
    };

    let added = merge_rules(&mut group, prefix, ports)?;

    if !is_new && added == 0 {
        tracing::info!("Security group {} already has all Submariner rules", name);
        return Ok(());
    }

    tracing::info!("Writing {} Submariner rule(s) to security group {}", added, name);

    // Subnet associations are read-only on the group
    group.properties.subnets = None;
    api.create_or_update_security_group(&group).await
}

/// Open `ports` between cluster nodes
///
/// 1. Ensure `<infra>-nsg` exists with one rule per port
/// 2. Look up `<infra>-worker-subnet` and `<infra>-master-subnet` in `<infra>-vnet`
/// 3. Associate the group with each subnet not yet associated with it
///
/// A subnet already associated with some other security group is left alone
/// and fails the step before any subnet is written, since cleanup could not
/// restore the group it replaced.
pub async fn open_internal_ports(api: &dyn NetworkApi, info: &CloudInfo, ports: &[PortSpec]) -> Result<()> {
    let group_name = internal_security_group_name(&info.infra_id);

    ensure_security_group(api, &group_name, &info.region, INTERNAL_SECURITY_RULE_PREFIX, ports).await?;

    let group_id = api.security_group_id(&group_name);
    let (vnet, subnet_names) = cluster_subnets(&info.infra_id);

    let mut pending = Vec::with_capacity(subnet_names.len());
    for subnet_name in &subnet_names {
        let subnet = api.get_subnet(&vnet, subnet_name).await?;

        if subnet.is_associated_with(&group_id) {
            tracing::debug!("Subnet {} already uses {}", subnet_name, group_name);
            continue;
        }

        if let Some(current) = &subnet.properties.network_security_group {
            return Err(Error::invalid_input(format!(
                "subnet {} is associated with security group {}, refusing to replace it with {}",
                subnet_name, current.id, group_name
            )));
        }

        pending.push(subnet);
    }

    for mut subnet in pending {
        tracing::info!("Associating security group {} with subnet {}", group_name, subnet.name);
        subnet.properties.network_security_group = Some(SubResource::new(group_id.clone()));
        api.create_or_update_subnet(&vnet, &subnet).await?;
    }

    Ok(())
}

/// Revoke what [`open_internal_ports`] set up
///
/// Submariner rules are removed from `<infra>-nsg`. When that leaves the
/// group empty, the group only ever held Submariner rules: it is dissociated
/// from the cluster subnets and deleted. A missing group is not an error.
pub async fn remove_internal_firewall_rules(api: &dyn NetworkApi, info: &CloudInfo) -> Result<()> {
    let group_name = internal_security_group_name(&info.infra_id);

    let Some(mut group) = api.get_security_group(&group_name).await? else {
        tracing::info!("Security group {} does not exist, nothing to remove", group_name);
        return Ok(());
    };

    let removed = remove_rules(&mut group, INTERNAL_SECURITY_RULE_PREFIX);

    if !group.properties.security_rules.is_empty() {
        if removed > 0 {
            tracing::info!("Removing {} Submariner rule(s) from {}", removed, group_name);
            group.properties.subnets = None;
            api.create_or_update_security_group(&group).await?;
        } else {
            tracing::info!("Security group {} has no Submariner rules", group_name);
        }
        return Ok(());
    }

    let group_id = api.security_group_id(&group_name);
    let (vnet, subnets) = cluster_subnets(&info.infra_id);

    for subnet_name in &subnets {
        let mut subnet = match api.get_subnet(&vnet, subnet_name).await {
            Ok(subnet) => subnet,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        };

        if !subnet.is_associated_with(&group_id) {
            continue;
        }

        tracing::info!("Dissociating security group {} from subnet {}", group_name, subnet_name);
        subnet.properties.network_security_group = None;
        api.create_or_update_subnet(&vnet, &subnet).await?;
    }

    api.delete_security_group(&group_name).await
}
