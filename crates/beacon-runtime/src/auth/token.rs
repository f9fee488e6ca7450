use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;

use beacon_core::config::OAuthConfig;
use beacon_core::{BeaconError, Result};

const GRANT_BODY: &str = "grant_type=client_credentials";

/// Bearer credential issued by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    /// Access token value.
    pub access_token: String,
    /// Lifetime in seconds, when the issuer reports one.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl Credential {
    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("bearer {}", self.access_token)
    }
}

/// OAuth2 client-credentials token client.
///
/// Every call performs one round trip; tokens are never cached and
/// failures are never retried here.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl TokenProvider {
    /// Create a new token provider.
    pub fn new(http: reqwest::Client, config: &OAuthConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Fetch a fresh credential.
    pub async fn get_token(&self) -> Result<Credential> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(GRANT_BODY)
            .send()
            .await
            .map_err(|e| BeaconError::Transport(format!("token request: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BeaconError::Transport(format!("read token response: {}", e)))?;

        if status != StatusCode::OK {
            return Err(BeaconError::UnexpectedStatus {
                service: "token issuer",
                status: status.as_u16(),
                body,
            });
        }

        let credential: Credential = serde_json::from_str(&body)
            .map_err(|e| BeaconError::Decode(format!("token response: {}", e)))?;

        tracing::debug!(expires_in = ?credential.expires_in, "Fetched access token");
        Ok(credential)
    }
}
