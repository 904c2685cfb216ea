//! Azure Resource Manager network models
//!
//! Only the fields this crate reads or writes are modelled. Everything else
//! lands in the flattened `extra` maps and is sent back untouched, so a
//! GET → modify → PUT round trip never drops data ARM returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unmodelled JSON fields
pub type Extra = Map<String, Value>;

/// Reference to another ARM resource by ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    /// Full ARM resource ID
    pub id: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SubResource {
    /// Create a reference to the given resource ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Extra::new(),
        }
    }

    /// ARM resource IDs compare case-insensitively
    pub fn refers_to(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }
}

/// A named child resource we only need to locate (frontend configs, pools)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResource {
    /// Full ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Child resource name
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Network security group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: SecurityGroupProperties,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Properties of a network security group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupProperties {
    #[serde(default)]
    pub security_rules: Vec<SecurityRule>,
    /// Subnets the group is associated with (read-only in ARM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnets: Option<Vec<SubResource>>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A security rule inside a network security group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub properties: SecurityRuleProperties,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Whether a rule lets traffic through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Allow,
    Deny,
}

/// Direction of traffic a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Properties of a security rule
///
/// `protocol` stays a string: ARM accepts more values (`Icmp`, `Esp`, `Ah`,
/// `*`) than we ever write, and existing rules must survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleProperties {
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_port_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_address_prefix: Option<String>,
    pub access: Access,
    pub priority: i32,
    pub direction: Direction,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Virtual network subnet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub properties: SubnetProperties,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Properties of a subnet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    /// Associated security group; serialized as `null` to dissociate
    #[serde(default)]
    pub network_security_group: Option<SubResource>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Subnet {
    /// Whether the subnet is associated with the given security group
    pub fn is_associated_with(&self, security_group_id: &str) -> bool {
        self.properties
            .network_security_group
            .as_ref()
            .is_some_and(|nsg| nsg.refers_to(security_group_id))
    }
}

/// Load balancer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: LoadBalancerProperties,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Properties of a load balancer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerProperties {
    #[serde(default, rename = "frontendIPConfigurations")]
    pub frontend_ip_configurations: Vec<ChildResource>,
    #[serde(default)]
    pub backend_address_pools: Vec<ChildResource>,
    #[serde(default)]
    pub load_balancing_rules: Vec<LoadBalancingRule>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Transport protocol of a load-balancing rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportProtocol {
    Tcp,
    Udp,
    All,
}

/// A load-balancing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancingRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub properties: LoadBalancingRuleProperties,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Properties of a load-balancing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancingRuleProperties {
    #[serde(default, rename = "frontendIPConfiguration", skip_serializing_if = "Option::is_none")]
    pub frontend_ip_configuration: Option<SubResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_address_pool: Option<SubResource>,
    pub protocol: TransportProtocol,
    pub frontend_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_port: Option<u16>,
    #[serde(default, rename = "enableFloatingIP", skip_serializing_if = "Option::is_none")]
    pub enable_floating_ip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_outbound_snat: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_security_group_round_trip_keeps_unknown_fields() {
        let raw = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkSecurityGroups/infra-nsg",
            "name": "infra-nsg",
            "location": "eastus",
            "etag": "W/\"abc\"",
            "tags": { "kubernetes.io_cluster.infra": "owned" },
            "properties": {
                "provisioningState": "Succeeded",
                "securityRules": [{
                    "name": "apiserver_in",
                    "etag": "W/\"abc\"",
                    "properties": {
                        "protocol": "Tcp",
                        "sourcePortRange": "*",
                        "destinationPortRange": "6443",
                        "sourceAddressPrefix": "*",
                        "destinationAddressPrefix": "*",
                        "access": "Allow",
                        "priority": 101,
                        "direction": "Inbound",
                        "sourcePortRanges": []
                    }
                }],
                "defaultSecurityRules": [{ "name": "AllowVnetInBound" }]
            }
        });

        let group: SecurityGroup = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(group.properties.security_rules.len(), 1);
        assert_eq!(group.properties.security_rules[0].properties.priority, 101);

        assert_eq!(serde_json::to_value(&group).unwrap(), raw);
    }

    #[test]
    fn test_subnet_dissociation_serializes_null() {
        let subnet = Subnet {
            name: "infra-worker-subnet".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&subnet).unwrap();
        assert_eq!(value["properties"]["networkSecurityGroup"], Value::Null);
    }

    #[test]
    fn test_subnet_round_trip_keeps_unknown_reference_fields() {
        let raw = json!({
            "name": "infra-worker-subnet",
            "properties": {
                "addressPrefix": "10.0.128.0/17",
                "networkSecurityGroup": {
                    "id": "/nsg/corp-locked-down",
                    "resourceGuid": "2f4c7e3a"
                },
                "routeTable": { "id": "/routeTables/infra-rt" }
            }
        });

        let subnet: Subnet = serde_json::from_value(raw.clone()).unwrap();
        let nsg = subnet.properties.network_security_group.as_ref().unwrap();
        assert_eq!(nsg.id, "/nsg/corp-locked-down");
        assert_eq!(nsg.extra["resourceGuid"], "2f4c7e3a");

        assert_eq!(serde_json::to_value(&subnet).unwrap(), raw);
    }

    #[test]
    fn test_subnet_association_is_case_insensitive() {
        let subnet = Subnet {
            name: "infra-master-subnet".to_string(),
            properties: SubnetProperties {
                network_security_group: Some(SubResource::new(
                    "/subscriptions/S/resourceGroups/RG/providers/Microsoft.Network/networkSecurityGroups/infra-nsg",
                )),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(subnet.is_associated_with(
            "/subscriptions/s/resourcegroups/rg/providers/microsoft.network/networksecuritygroups/infra-nsg"
        ));
        assert!(!subnet.is_associated_with("/subscriptions/s/other"));
    }

    #[test]
    fn test_load_balancer_field_names() {
        let raw = json!({
            "name": "infra",
            "properties": {
                "frontendIPConfigurations": [{ "id": "/lb/infra/frontendIPConfigurations/public-lb-ip-v4", "name": "public-lb-ip-v4" }],
                "backendAddressPools": [{ "id": "/lb/infra/backendAddressPools/infra", "name": "infra" }],
                "loadBalancingRules": [{
                    "name": "api-v4",
                    "properties": {
                        "frontendIPConfiguration": { "id": "/lb/infra/frontendIPConfigurations/public-lb-ip-v4" },
                        "protocol": "Tcp",
                        "frontendPort": 6443,
                        "backendPort": 6443,
                        "enableFloatingIP": false
                    }
                }],
                "outboundRules": []
            }
        });

        let lb: LoadBalancer = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(lb.properties.frontend_ip_configurations[0].name, "public-lb-ip-v4");
        assert_eq!(lb.properties.load_balancing_rules[0].properties.frontend_port, 6443);
        assert_eq!(
            lb.properties.load_balancing_rules[0].properties.enable_floating_ip,
            Some(false)
        );
        assert_eq!(serde_json::to_value(&lb).unwrap(), raw);
    }
}
