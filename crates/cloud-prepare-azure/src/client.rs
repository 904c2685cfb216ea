// # Azure Network API Client
//
// Thin client for the handful of Azure Resource Manager network endpoints
// this crate needs.
//
// ## Scope
//
// - One subscription and one resource group per client
// - Single-shot requests: a failed call is returned, never retried
// - Writes are long-running operations; the client waits for them to finish
//
// ## Long-Running Operations
//
// ARM answers PUT/DELETE with 200/201/202 and, when work is still pending,
// an `Azure-AsyncOperation` or `Location` header. The client polls that URL
// (honouring `Retry-After`) until the operation reaches a terminal state.
// Request plus wait are bounded by the operation timeout.
//
// ## Dry-Run Mode
//
// When `dry_run` is true, the client:
// - Performs all GET requests
// - Logs the intended PUT/DELETE
// - **NOT** actually modify any resource
//
// ## API Reference
//
// - Network security groups: `.../providers/Microsoft.Network/networkSecurityGroups/{name}`
// - Subnets: `.../providers/Microsoft.Network/virtualNetworks/{vnet}/subnets/{name}`
// - Load balancers: `.../providers/Microsoft.Network/loadBalancers/{name}`

use async_trait::async_trait;
use cloud_prepare_core::{Error, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::auth::TokenProvider;
use crate::constants::NETWORK_API_VERSION;
use crate::models::{LoadBalancer, SecurityGroup, Subnet};

/// Default HTTP timeout for a single API request (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";

/// Operations against the network resources of one resource group
///
/// This is the seam between provisioning logic and Azure: the provisioning
/// steps only talk to this trait, so they can be exercised against an
/// in-memory implementation.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// Fetch a security group, `None` if it does not exist
    async fn get_security_group(&self, name: &str) -> Result<Option<SecurityGroup>>;

    /// Create or replace a security group and wait for completion
    async fn create_or_update_security_group(&self, group: &SecurityGroup) -> Result<()>;

    /// Delete a security group and wait for completion (absent is fine)
    async fn delete_security_group(&self, name: &str) -> Result<()>;

    /// Fetch a subnet; a missing subnet is `Error::NotFound`
    async fn get_subnet(&self, virtual_network: &str, name: &str) -> Result<Subnet>;

    /// Create or replace a subnet and wait for completion
    async fn create_or_update_subnet(&self, virtual_network: &str, subnet: &Subnet) -> Result<()>;

    /// Fetch a load balancer, `None` if it does not exist
    async fn get_load_balancer(&self, name: &str) -> Result<Option<LoadBalancer>>;

    /// Create or replace a load balancer and wait for completion
    async fn create_or_update_load_balancer(&self, load_balancer: &LoadBalancer) -> Result<()>;

    /// ARM resource ID of the named security group in this resource group
    fn security_group_id(&self, name: &str) -> String;
}

/// Settings for [`ArmNetworkClient`]
#[derive(Debug, Clone)]
pub struct ArmClientOptions {
    /// ARM endpoint (e.g. `https://management.azure.com`)
    pub resource_manager_endpoint: String,
    /// Deadline for a request plus its completion wait
    pub operation_timeout: Duration,
    /// Poll delay when ARM sends no `Retry-After`
    pub poll_interval: Duration,
    /// Log writes instead of sending them
    pub dry_run: bool,
}

impl Default for ArmClientOptions {
    fn default() -> Self {
        Self {
            resource_manager_endpoint: crate::constants::RESOURCE_MANAGER_ENDPOINT.to_string(),
            operation_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(5),
            dry_run: false,
        }
    }
}

/// State of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
enum OperationStatus {
    InProgress,
    Succeeded,
    Failed(String),
}

/// REST client for ARM network resources
pub struct ArmNetworkClient {
    subscription_id: String,
    resource_group: String,
    endpoint: String,
    tokens: TokenProvider,
    client: reqwest::Client,
    operation_timeout: Duration,
    poll_interval: Duration,
    dry_run: bool,
}

impl std::fmt::Debug for ArmNetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmNetworkClient")
            .field("subscription_id", &self.subscription_id)
            .field("resource_group", &self.resource_group)
            .field("endpoint", &self.endpoint)
            .field("tokens", &self.tokens)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl ArmNetworkClient {
    /// Create a client for one subscription and resource group
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        credential: crate::auth::Credential,
        options: ArmClientOptions,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = options
            .resource_manager_endpoint
            .trim_end_matches('/')
            .to_string();

        if options.dry_run {
            tracing::warn!("Azure client running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            tokens: TokenProvider::new(credential, &endpoint, client.clone()),
            endpoint,
            client,
            operation_timeout: options.operation_timeout,
            poll_interval: options.poll_interval,
            dry_run: options.dry_run,
        })
    }

    fn resource_group_path(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network",
            self.subscription_id, self.resource_group
        )
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{}?api-version={}",
            self.endpoint, path, NETWORK_API_VERSION
        )
    }

    fn security_group_path(&self, name: &str) -> String {
        format!("{}/networkSecurityGroups/{}", self.resource_group_path(), name)
    }

    fn subnet_path(&self, virtual_network: &str, name: &str) -> String {
        format!(
            "{}/virtualNetworks/{}/subnets/{}",
            self.resource_group_path(),
            virtual_network,
            name
        )
    }

    fn load_balancer_path(&self, name: &str) -> String {
        format!("{}/loadBalancers/{}", self.resource_group_path(), name)
    }

    /// Send one authenticated request
    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response> {
        tracing::debug!("{} {}", method, url);

        let token = self.tokens.token().await?;
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| Error::provider("azure", format!("HTTP request failed: {}", e)))
    }

    /// GET a resource; 404 becomes `None`
    async fn get_optional<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<Option<T>> {
        let response = self.send(Method::GET, &self.url(path), None).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("{} does not exist", what);
            return Ok(None);
        }

        let response = check_status(response, what).await?;
        let resource = response
            .json()
            .await
            .map_err(|e| Error::provider("azure", format!("Failed to parse {}: {}", what, e)))?;
        Ok(Some(resource))
    }

    /// PUT a resource and wait for the operation to finish
    async fn put<T: Serialize>(&self, path: &str, resource: &T, what: &str) -> Result<()> {
        let body = serde_json::to_value(resource)?;

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would PUT {} with payload: {}", path, body);
            return Ok(());
        }

        tracing::info!("Creating or updating {}", what);
        let url = self.url(path);
        self.bounded(what, async {
            let response = self.send(Method::PUT, &url, Some(&body)).await?;
            let response = check_status(response, what).await?;
            self.wait_for_completion(response, what).await
        })
        .await
    }

    /// DELETE a resource and wait for the operation to finish
    async fn delete(&self, path: &str, what: &str) -> Result<()> {
        if self.dry_run {
            tracing::info!("[DRY-RUN] Would DELETE {}", path);
            return Ok(());
        }

        tracing::info!("Deleting {}", what);
        let url = self.url(path);
        self.bounded(what, async {
            let response = self.send(Method::DELETE, &url, None).await?;
            match response.status() {
                StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => {
                    tracing::debug!("{} already gone", what);
                    Ok(())
                }
                _ => {
                    let response = check_status(response, what).await?;
                    self.wait_for_completion(response, what).await
                }
            }
        })
        .await
    }

    /// Bound an operation by the operation timeout
    async fn bounded<F>(&self, what: &str, operation: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        tokio::time::timeout(self.operation_timeout, operation)
            .await
            .map_err(|_| {
                Error::timeout(format!(
                    "{} did not complete within {:?}",
                    what, self.operation_timeout
                ))
            })?
    }

    /// Poll a long-running operation until it reaches a terminal state
    async fn wait_for_completion(&self, response: Response, what: &str) -> Result<()> {
        let headers = response.headers();

        let (poll_url, via_async_operation) =
            if let Some(url) = header_str(headers, AZURE_ASYNC_OPERATION) {
                (url.to_string(), true)
            } else if let Some(url) = header_str(headers, LOCATION) {
                (url.to_string(), false)
            } else {
                // Completed synchronously
                return Ok(());
            };

        let mut delay = retry_after(headers).unwrap_or(self.poll_interval);

        loop {
            tokio::time::sleep(delay).await;

            let poll = self.send(Method::GET, &poll_url, None).await?;
            let poll = check_status(poll, what).await?;
            delay = retry_after(poll.headers()).unwrap_or(self.poll_interval);

            let status = if via_async_operation {
                let document: Value = poll.json().await.map_err(|e| {
                    Error::provider("azure", format!("Failed to parse operation status: {}", e))
                })?;
                parse_operation_status(&document)
            } else if poll.status() == StatusCode::ACCEPTED {
                OperationStatus::InProgress
            } else {
                OperationStatus::Succeeded
            };

            match status {
                OperationStatus::InProgress => {
                    tracing::debug!("Waiting for {} to complete", what);
                }
                OperationStatus::Succeeded => {
                    tracing::debug!("{} completed", what);
                    return Ok(());
                }
                OperationStatus::Failed(status) => {
                    return Err(Error::operation_failed(what, status));
                }
            }
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Interpret an `Azure-AsyncOperation` status document
fn parse_operation_status(document: &Value) -> OperationStatus {
    match document["status"].as_str() {
        Some(s) if s.eq_ignore_ascii_case("Succeeded") => OperationStatus::Succeeded,
        Some(s) if s.eq_ignore_ascii_case("Failed") || s.eq_ignore_ascii_case("Canceled") => {
            let detail = document["error"]["message"]
                .as_str()
                .map(|m| format!("{}: {}", s, m))
                .unwrap_or_else(|| s.to_string());
            OperationStatus::Failed(detail)
        }
        _ => OperationStatus::InProgress,
    }
}

/// Map an HTTP status to an error
fn status_error(status: StatusCode, what: &str, error_text: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid credentials or insufficient permissions for {}. Status: {}",
            what, status
        )),
        404 => Error::not_found(what.to_string()),
        409 => Error::provider(
            "azure",
            format!("Conflict: {} is being modified by another operation. Status: {}", what, status),
        ),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded for {}. Please retry later. Status: {}",
            what, status
        )),
        500..=599 => Error::provider(
            "azure",
            format!("Azure server error (transient) for {}: {} - {}", what, status, error_text),
        ),
        _ => Error::provider(
            "azure",
            format!("Request for {} failed: {} - {}", what, status, error_text),
        ),
    }
}

/// Turn a non-success response into an error
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    Err(status_error(status, what, &error_text))
}

#[async_trait]
impl NetworkApi for ArmNetworkClient {
    async fn get_security_group(&self, name: &str) -> Result<Option<SecurityGroup>> {
        self.get_optional(
            &self.security_group_path(name),
            &format!("security group {}", name),
        )
        .await
    }

    async fn create_or_update_security_group(&self, group: &SecurityGroup) -> Result<()> {
        self.put(
            &self.security_group_path(&group.name),
            group,
            &format!("security group {}", group.name),
        )
        .await
    }

    async fn delete_security_group(&self, name: &str) -> Result<()> {
        self.delete(
            &self.security_group_path(name),
            &format!("security group {}", name),
        )
        .await
    }

    async fn get_subnet(&self, virtual_network: &str, name: &str) -> Result<Subnet> {
        let what = format!("subnet {}/{}", virtual_network, name);
        self.get_optional(&self.subnet_path(virtual_network, name), &what)
            .await?
            .ok_or_else(|| Error::not_found(what))
    }

    async fn create_or_update_subnet(&self, virtual_network: &str, subnet: &Subnet) -> Result<()> {
        self.put(
            &self.subnet_path(virtual_network, &subnet.name),
            subnet,
            &format!("subnet {}/{}", virtual_network, subnet.name),
        )
        .await
    }

    async fn get_load_balancer(&self, name: &str) -> Result<Option<LoadBalancer>> {
        self.get_optional(
            &self.load_balancer_path(name),
            &format!("load balancer {}", name),
        )
        .await
    }

    async fn create_or_update_load_balancer(&self, load_balancer: &LoadBalancer) -> Result<()> {
        self.put(
            &self.load_balancer_path(&load_balancer.name),
            load_balancer,
            &format!("load balancer {}", load_balancer.name),
        )
        .await
    }

    fn security_group_id(&self, name: &str) -> String {
        self.security_group_path(name)
    }
}
