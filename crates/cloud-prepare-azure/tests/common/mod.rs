//! In-memory network used by the Azure contract tests

#![allow(dead_code)]

use async_trait::async_trait;
use cloud_prepare_azure::client::NetworkApi;
use cloud_prepare_azure::constants::FRONTEND_IP_CONFIGURATION_NAME;
use cloud_prepare_azure::models::{
    Access, ChildResource, Direction, Extra, LoadBalancer, LoadBalancerProperties, SecurityGroup,
    SecurityGroupProperties, SecurityRule, SecurityRuleProperties, Subnet, SubnetProperties,
    SubResource,
};
use cloud_prepare_azure::{AzureCloud, CloudInfo};
use cloud_prepare_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";
pub const INFRA_ID: &str = "infra-x7k2p";
pub const RESOURCE_GROUP: &str = "infra-x7k2p-rg";

pub fn cloud_info() -> CloudInfo {
    CloudInfo {
        subscription_id: SUBSCRIPTION.to_string(),
        infra_id: INFRA_ID.to_string(),
        region: "eastus".to_string(),
        base_group_name: RESOURCE_GROUP.to_string(),
    }
}

fn resource_group_id() -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network",
        SUBSCRIPTION, RESOURCE_GROUP
    )
}

#[derive(Default)]
struct State {
    groups: HashMap<String, SecurityGroup>,
    subnets: HashMap<(String, String), Subnet>,
    load_balancers: HashMap<String, LoadBalancer>,
    writes: Vec<String>,
}

/// Network whose resources live in memory
///
/// Clones share state, so a test can hand one to a cloud and inspect
/// the other afterwards.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    state: Arc<Mutex<State>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A network holding what the installer creates for a cluster:
    /// the vnet subnets and the public load balancer
    pub fn with_cluster() -> Self {
        let network = Self::new();
        network.seed_cluster_subnets();
        network.seed_load_balancer();
        network
    }

    pub fn seed_cluster_subnets(&self) {
        let vnet = format!("{}-vnet", INFRA_ID);
        let mut state = self.state.lock().unwrap();
        for suffix in ["-worker-subnet", "-master-subnet"] {
            let name = format!("{}{}", INFRA_ID, suffix);
            let subnet = Subnet {
                id: Some(format!(
                    "{}/virtualNetworks/{}/subnets/{}",
                    resource_group_id(),
                    vnet,
                    name
                )),
                name: name.clone(),
                properties: SubnetProperties {
                    address_prefix: Some("10.0.0.0/19".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            state.subnets.insert((vnet.clone(), name), subnet);
        }
    }

    pub fn seed_load_balancer(&self) {
        let id = format!("{}/loadBalancers/{}", resource_group_id(), INFRA_ID);
        let lb = LoadBalancer {
            id: Some(id.clone()),
            name: INFRA_ID.to_string(),
            location: Some("eastus".to_string()),
            properties: LoadBalancerProperties {
                frontend_ip_configurations: vec![ChildResource {
                    id: Some(format!(
                        "{}/frontendIPConfigurations/{}",
                        id, FRONTEND_IP_CONFIGURATION_NAME
                    )),
                    name: FRONTEND_IP_CONFIGURATION_NAME.to_string(),
                    extra: Extra::new(),
                }],
                backend_address_pools: vec![ChildResource {
                    id: Some(format!("{}/backendAddressPools/{}", id, INFRA_ID)),
                    name: INFRA_ID.to_string(),
                    extra: Extra::new(),
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        self.state
            .lock()
            .unwrap()
            .load_balancers
            .insert(INFRA_ID.to_string(), lb);
    }

    /// The installer's `<infra>-nsg` with one rule of its own
    pub fn seed_cluster_security_group(&self) {
        let name = format!("{}-nsg", INFRA_ID);
        let group = SecurityGroup {
            id: Some(format!("{}/networkSecurityGroups/{}", resource_group_id(), name)),
            name: name.clone(),
            location: Some("eastus".to_string()),
            properties: SecurityGroupProperties {
                security_rules: vec![SecurityRule {
                    id: None,
                    name: "apiserver_in".to_string(),
                    properties: SecurityRuleProperties {
                        protocol: "Tcp".to_string(),
                        source_port_range: Some("*".to_string()),
                        destination_port_range: Some("6443".to_string()),
                        source_address_prefix: Some("*".to_string()),
                        destination_address_prefix: Some("*".to_string()),
                        access: Access::Allow,
                        priority: 101,
                        direction: Direction::Inbound,
                        extra: Extra::new(),
                    },
                    extra: Extra::new(),
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        self.state.lock().unwrap().groups.insert(name, group);
    }

    /// Associate a cluster subnet with a security group the cluster does not own
    pub fn associate_subnet(&self, name: &str, security_group_id: &str) {
        let key = (format!("{}-vnet", INFRA_ID), name.to_string());
        if let Some(subnet) = self.state.lock().unwrap().subnets.get_mut(&key) {
            subnet.properties.network_security_group = Some(SubResource::new(security_group_id));
        }
    }

    pub fn cloud(&self) -> AzureCloud {
        AzureCloud::with_network(cloud_info(), Arc::new(self.clone()))
    }

    pub fn group(&self, name: &str) -> Option<SecurityGroup> {
        self.state.lock().unwrap().groups.get(name).cloned()
    }

    pub fn group_rule_names(&self, name: &str) -> Vec<String> {
        self.group(name)
            .map(|g| g.properties.security_rules.into_iter().map(|r| r.name).collect())
            .unwrap_or_default()
    }

    pub fn subnet(&self, name: &str) -> Option<Subnet> {
        let key = (format!("{}-vnet", INFRA_ID), name.to_string());
        self.state.lock().unwrap().subnets.get(&key).cloned()
    }

    pub fn load_balancer(&self) -> Option<LoadBalancer> {
        self.state.lock().unwrap().load_balancers.get(INFRA_ID).cloned()
    }

    pub fn lb_rule_names(&self) -> Vec<String> {
        self.load_balancer()
            .map(|lb| {
                lb.properties
                    .load_balancing_rules
                    .into_iter()
                    .map(|r| r.name)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every write performed, in order, e.g. `PUT nsg infra-x7k2p-nsg`
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }
}

#[async_trait]
impl NetworkApi for FakeNetwork {
    async fn get_security_group(&self, name: &str) -> Result<Option<SecurityGroup>> {
        Ok(self.group(name))
    }

    async fn create_or_update_security_group(&self, group: &SecurityGroup) -> Result<()> {
        let mut group = group.clone();
        if group.id.is_none() {
            group.id = Some(self.security_group_id(&group.name));
        }

        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("PUT nsg {}", group.name));
        state.groups.insert(group.name.clone(), group);
        Ok(())
    }

    async fn delete_security_group(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.groups.remove(name).is_some() {
            state.writes.push(format!("DELETE nsg {}", name));
        }
        Ok(())
    }

    async fn get_subnet(&self, virtual_network: &str, name: &str) -> Result<Subnet> {
        let key = (virtual_network.to_string(), name.to_string());
        self.state
            .lock()
            .unwrap()
            .subnets
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("subnet {}/{}", virtual_network, name)))
    }

    async fn create_or_update_subnet(&self, virtual_network: &str, subnet: &Subnet) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("PUT subnet {}", subnet.name));
        state
            .subnets
            .insert((virtual_network.to_string(), subnet.name.clone()), subnet.clone());
        Ok(())
    }

    async fn get_load_balancer(&self, name: &str) -> Result<Option<LoadBalancer>> {
        Ok(self.state.lock().unwrap().load_balancers.get(name).cloned())
    }

    async fn create_or_update_load_balancer(&self, load_balancer: &LoadBalancer) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("PUT lb {}", load_balancer.name));
        state
            .load_balancers
            .insert(load_balancer.name.clone(), load_balancer.clone());
        Ok(())
    }

    fn security_group_id(&self, name: &str) -> String {
        format!("{}/networkSecurityGroups/{}", resource_group_id(), name)
    }
}

/// Security group the given subnet is associated with
pub fn associated_group(subnet: &Subnet) -> Option<SubResource> {
    subnet.properties.network_security_group.clone()
}
