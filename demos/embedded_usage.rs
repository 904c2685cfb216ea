//! Minimal embedding example for cloud-prepare-core
//!
//! This example shows an application driving preparation itself:
//! a custom cloud registered next to Azure, and an Azure cloud running
//! against an in-memory network so nothing leaves the process.

use async_trait::async_trait;
use cloud_prepare_azure::client::NetworkApi;
use cloud_prepare_azure::models::{
    ChildResource, Extra, LoadBalancer, LoadBalancerProperties, SecurityGroup, Subnet,
};
use cloud_prepare_azure::{AzureCloud, CloudInfo};
use cloud_prepare_core::{
    Cloud, CloudConfig, CloudFactory, CloudRegistry, Error, PortSpec, PrepareConfig,
    PrepareForSubmarinerInput, RecordingReporter, ReportEvent, ReportResult, Reporter, Result,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Cloud for an on-premises network where a firewall team opens ports by ticket
struct TicketCloud {
    queue: String,
}

#[async_trait]
impl Cloud for TicketCloud {
    async fn prepare_for_submariner(
        &self,
        input: &PrepareForSubmarinerInput,
        reporter: &dyn Reporter,
    ) -> Result<()> {
        reporter.started("Filing firewall ticket");
        if input.internal_ports.is_empty() {
            return Err(Error::invalid_input("nothing to request")).or_report(reporter);
        }
        println!(
            "[Ticket] {}: open {}",
            self.queue,
            cloud_prepare_core::format_ports(&input.internal_ports)
        );
        reporter.succeeded("Firewall ticket filed");
        Ok(())
    }

    async fn cleanup_after_submariner(&self, reporter: &dyn Reporter) -> Result<()> {
        reporter.started("Filing firewall revocation ticket");
        println!("[Ticket] {}: revoke Submariner ports", self.queue);
        reporter.succeeded("Firewall revocation ticket filed");
        Ok(())
    }

    fn cloud_name(&self) -> &'static str {
        "ticket"
    }
}

struct TicketCloudFactory;

impl CloudFactory for TicketCloudFactory {
    fn create(&self, config: &PrepareConfig) -> Result<Box<dyn Cloud>> {
        match &config.cloud {
            CloudConfig::Custom { factory, config } if factory == "ticket" => {
                let queue = config
                    .get("queue")
                    .and_then(|q| q.as_str())
                    .ok_or_else(|| Error::config("ticket cloud needs a 'queue'"))?;
                Ok(Box::new(TicketCloud {
                    queue: queue.to_string(),
                }))
            }
            _ => Err(Error::config("Invalid config for ticket cloud")),
        }
    }
}

/// Network that keeps resources in memory and prints every write
#[derive(Default)]
struct InMemoryNetwork {
    groups: Mutex<HashMap<String, SecurityGroup>>,
    subnets: Mutex<HashMap<String, Subnet>>,
    load_balancer: Mutex<Option<LoadBalancer>>,
}

impl InMemoryNetwork {
    fn for_cluster(infra_id: &str) -> Self {
        let network = Self::default();
        if let Ok(mut subnets) = network.subnets.lock() {
            for suffix in ["-worker-subnet", "-master-subnet"] {
                let name = format!("{}{}", infra_id, suffix);
                subnets.insert(
                    name.clone(),
                    Subnet {
                        name,
                        ..Default::default()
                    },
                );
            }
        }
        if let Ok(mut lb) = network.load_balancer.lock() {
            let id = format!("/lb/{}", infra_id);
            *lb = Some(LoadBalancer {
                id: Some(id.clone()),
                name: infra_id.to_string(),
                properties: LoadBalancerProperties {
                    frontend_ip_configurations: vec![ChildResource {
                        id: None,
                        name: cloud_prepare_azure::constants::FRONTEND_IP_CONFIGURATION_NAME
                            .to_string(),
                        extra: Extra::new(),
                    }],
                    backend_address_pools: vec![ChildResource {
                        id: None,
                        name: infra_id.to_string(),
                        extra: Extra::new(),
                    }],
                    ..Default::default()
                },
                ..Default::default()
            });
        }
        network
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::other("in-memory network lock poisoned")
}

#[async_trait]
impl NetworkApi for InMemoryNetwork {
    async fn get_security_group(&self, name: &str) -> Result<Option<SecurityGroup>> {
        Ok(self.groups.lock().map_err(poisoned)?.get(name).cloned())
    }

    async fn create_or_update_security_group(&self, group: &SecurityGroup) -> Result<()> {
        println!(
            "[Network] PUT security group {} ({} rules)",
            group.name,
            group.properties.security_rules.len()
        );
        self.groups
            .lock()
            .map_err(poisoned)?
            .insert(group.name.clone(), group.clone());
        Ok(())
    }

    async fn delete_security_group(&self, name: &str) -> Result<()> {
        println!("[Network] DELETE security group {}", name);
        self.groups.lock().map_err(poisoned)?.remove(name);
        Ok(())
    }

    async fn get_subnet(&self, virtual_network: &str, name: &str) -> Result<Subnet> {
        self.subnets
            .lock()
            .map_err(poisoned)?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("subnet {}/{}", virtual_network, name)))
    }

    async fn create_or_update_subnet(&self, virtual_network: &str, subnet: &Subnet) -> Result<()> {
        println!("[Network] PUT subnet {}/{}", virtual_network, subnet.name);
        self.subnets
            .lock()
            .map_err(poisoned)?
            .insert(subnet.name.clone(), subnet.clone());
        Ok(())
    }

    async fn get_load_balancer(&self, _name: &str) -> Result<Option<LoadBalancer>> {
        Ok(self.load_balancer.lock().map_err(poisoned)?.clone())
    }

    async fn create_or_update_load_balancer(&self, load_balancer: &LoadBalancer) -> Result<()> {
        println!(
            "[Network] PUT load balancer {} ({} rules)",
            load_balancer.name,
            load_balancer.properties.load_balancing_rules.len()
        );
        *self.load_balancer.lock().map_err(poisoned)? = Some(load_balancer.clone());
        Ok(())
    }

    fn security_group_id(&self, name: &str) -> String {
        format!("/nsg/{}", name)
    }
}

fn print_events(reporter: &RecordingReporter) {
    for event in reporter.events() {
        match event {
            ReportEvent::Started(m) => println!("  ▶ {}", m),
            ReportEvent::Succeeded(m) => println!("  ✔ {}", m),
            ReportEvent::Failed(m) => println!("  ✘ {}", m),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Embedded cloud-prepare Example ===\n");

    let ports = vec![PortSpec::udp(4500), PortSpec::udp(4490), PortSpec::tcp(8080)];

    // 1. A custom cloud, created through the registry like the built-in ones
    println!("1. Registering clouds...");
    let registry = CloudRegistry::new();
    cloud_prepare_azure::register(&registry);
    registry.register_cloud("ticket", Box::new(TicketCloudFactory));
    println!("   Available: {:?}\n", registry.list_clouds());

    let config = PrepareConfig::new(CloudConfig::Custom {
        factory: "ticket".to_string(),
        config: serde_json::json!({ "queue": "NETOPS" }),
    })
    .with_internal_ports(ports.clone());

    println!("2. Preparing the custom cloud...");
    let cloud = registry.create_cloud(&config)?;
    let reporter = RecordingReporter::new();
    cloud
        .prepare_for_submariner(&PrepareForSubmarinerInput::new(ports.clone()), &reporter)
        .await?;
    print_events(&reporter);

    // 2. Azure against an in-memory network
    println!("\n3. Preparing Azure against an in-memory network...");
    let info = CloudInfo {
        subscription_id: "00000000-0000-0000-0000-000000000000".to_string(),
        infra_id: "demo-x7k2p".to_string(),
        region: "eastus".to_string(),
        base_group_name: "demo-x7k2p-rg".to_string(),
    };
    let network = Arc::new(InMemoryNetwork::for_cluster(&info.infra_id));
    let azure = AzureCloud::with_network(info, network);

    let reporter = RecordingReporter::new();
    azure
        .prepare_for_submariner(&PrepareForSubmarinerInput::new(ports.clone()), &reporter)
        .await?;
    print_events(&reporter);

    println!("\n4. Running prepare again (no writes expected)...");
    let reporter = RecordingReporter::new();
    azure
        .prepare_for_submariner(&PrepareForSubmarinerInput::new(ports), &reporter)
        .await?;
    print_events(&reporter);

    println!("\n5. Cleaning up...");
    let reporter = RecordingReporter::new();
    azure.cleanup_after_submariner(&reporter).await?;
    print_events(&reporter);

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Custom clouds plug into the same registry as Azure");
    println!("- Progress is delivered to any Reporter");
    println!("- The network API is a trait, so Azure runs without credentials here");

    Ok(())
}
