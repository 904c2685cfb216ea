// Azure endpoints
pub const RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub(crate) const NETWORK_API_VERSION: &str = "2021-03-01";

// Resource naming
pub(crate) const INTERNAL_SECURITY_GROUP_SUFFIX: &str = "-nsg";
pub(crate) const EXTERNAL_SECURITY_GROUP_SUFFIX: &str = "-submariner-external-sg";
pub(crate) const INTERNAL_SECURITY_RULE_PREFIX: &str = "Submariner-Internal-";
pub(crate) const INBOUND_RULE_PREFIX: &str = "Submariner-Inbound-";
pub(crate) const LOAD_BALANCING_RULE_PREFIX: &str = "Submariner-LB-";
pub(crate) const VNET_SUFFIX: &str = "-vnet";
pub(crate) const WORKER_SUBNET_SUFFIX: &str = "-worker-subnet";
pub(crate) const MASTER_SUBNET_SUFFIX: &str = "-master-subnet";
pub const FRONTEND_IP_CONFIGURATION_NAME: &str = "public-lb-ip-v4";

// Security rules
pub(crate) const ALL_NETWORK_CIDR: &str = "0.0.0.0/0";
pub(crate) const BASE_PRIORITY: i32 = 100;
pub(crate) const MAX_PRIORITY: i32 = 4096;

// Load-balancing rules
pub(crate) const LB_IDLE_TIMEOUT_MINUTES: u32 = 4;
