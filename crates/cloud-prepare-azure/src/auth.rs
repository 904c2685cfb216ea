// # Azure AD Authentication
//
// Obtains bearer tokens for Azure Resource Manager.
//
// ## Supported Credentials
//
// - Pre-acquired access token (e.g. from `az account get-access-token`)
// - Service principal with client secret (OAuth2 client-credentials grant)
//
// ## Security Requirements
//
// - Tokens and secrets NEVER appear in logs or Debug output
//
// ## API Reference
//
// - Token endpoint: POST `{authority}/{tenant}/oauth2/v2.0/token`

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use cloud_prepare_core::{Error, Result};
use serde::Deserialize;
use tokio::sync::Mutex;

/// Tokens closer than this to expiry are refreshed
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// How to authenticate against Azure AD
#[derive(Clone)]
pub enum Credential {
    /// A bearer token obtained elsewhere; used as is
    AccessToken(String),

    /// Service principal with client secret
    ClientSecret {
        tenant_id: String,
        client_id: String,
        /// ⚠️ NEVER log this value
        client_secret: String,
        authority_host: String,
    },
}

// Custom Debug implementation that hides secrets
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::AccessToken(_) => f
                .debug_tuple("AccessToken")
                .field(&"<REDACTED>")
                .finish(),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                authority_host,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<REDACTED>")
                .field("authority_host", authority_host)
                .finish(),
        }
    }
}

/// A bearer token with its expiry
#[derive(Clone)]
struct AccessToken {
    secret: String,
    expires_on: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_on - now > ChronoDuration::minutes(REFRESH_MARGIN_MINUTES)
    }
}

/// Token endpoint response
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Hands out ARM bearer tokens, caching them until shortly before expiry
pub struct TokenProvider {
    credential: Credential,
    scope: String,
    client: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("credential", &self.credential)
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenProvider {
    /// Create a token provider for the given ARM endpoint
    ///
    /// # Parameters
    ///
    /// - `credential`: How to authenticate
    /// - `resource_manager_endpoint`: ARM endpoint the tokens are for
    /// - `client`: HTTP client shared with the ARM client
    pub fn new(credential: Credential, resource_manager_endpoint: &str, client: reqwest::Client) -> Self {
        Self {
            credential,
            scope: format!("{}/.default", resource_manager_endpoint.trim_end_matches('/')),
            client,
            cached: Mutex::new(None),
        }
    }

    /// Get a bearer token valid for at least the refresh margin
    pub async fn token(&self) -> Result<String> {
        let (tenant_id, client_id, client_secret, authority_host) = match &self.credential {
            Credential::AccessToken(token) => return Ok(token.clone()),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
                authority_host,
            } => (tenant_id, client_id, client_secret, authority_host),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.secret.clone());
        }

        tracing::debug!("Requesting Azure AD token for client {}", client_id);

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            authority_host.trim_end_matches('/'),
            tenant_id
        );

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::http(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::auth(format!(
                "Azure AD rejected client {}: {} - {}",
                client_id, status, error_text
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("Failed to parse token response: {}", e)))?;

        let token = AccessToken {
            secret: body.access_token,
            expires_on: Utc::now() + ChronoDuration::seconds(body.expires_in),
        };

        tracing::debug!("Azure AD token valid until {}", token.expires_on);

        let secret = token.secret.clone();
        *cached = Some(token);
        Ok(secret)
    }
}
