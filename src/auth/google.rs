//!
//! # Google Identity Provider
//!
//! The outbound half of Google sign-in: building the consent URL and
//! exchanging an authorization code for the account's profile. The token
//! exchange and userinfo fetch run over a client with a bounded timeout;
//! authorization codes are single-use, so the exchange itself is never
//! retried.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use crate::config::GoogleConfig;
use crate::error::AppError;

const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Ceiling for each HTTP call to Google; a timeout surfaces as
/// `AppError::UpstreamAuth`.
const EXCHANGE_TIMEOUT_SECS: u64 = 10;

const NOT_CONFIGURED: &str = "Google OAuth is not configured";

/// The profile claims returned by Google's userinfo endpoint.
///
/// Only `id` (the stable subject identifier) is guaranteed; the reconciler
/// treats a missing email as a hard failure since email is the reconciliation
/// key.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// An external identity provider the reconciler can exchange codes with.
///
/// Injected into handlers as a trait object so tests can substitute a stub.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The consent-screen URL a front end should redirect the user to.
    fn authorize_url(&self) -> Result<String, AppError>;

    /// Exchanges an authorization code for the provider's view of the user.
    async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, AppError>;
}

/// Live Google OAuth client.
pub struct GoogleOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(EXCHANGE_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_endpoint: GOOGLE_AUTH_ENDPOINT.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            userinfo_endpoint: GOOGLE_USERINFO_ENDPOINT.to_string(),
        })
    }

    /// Points the client at alternative endpoints; used by tests to exchange
    /// against a mock server.
    pub fn with_endpoints(mut self, auth: &str, token: &str, userinfo: &str) -> Self {
        self.auth_endpoint = auth.to_string();
        self.token_endpoint = token.to_string();
        self.userinfo_endpoint = userinfo.to_string();
        self
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuth {
    fn authorize_url(&self) -> Result<String, AppError> {
        let mut url = Url::parse(&self.auth_endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid authorization endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, AppError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamAuth(format!(
                "Google token exchange returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;

        let response = self
            .http
            .get(&self.userinfo_endpoint)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamAuth(format!(
                "Google userinfo returned {}",
                response.status()
            )));
        }

        let profile: GoogleProfile = response.json().await?;
        Ok(profile)
    }
}

/// Placeholder provider registered when no Google client is configured; every
/// call reports the not-configured error.
pub struct GoogleDisabled;

#[async_trait]
impl IdentityProvider for GoogleDisabled {
    fn authorize_url(&self) -> Result<String, AppError> {
        Err(AppError::Internal(NOT_CONFIGURED.into()))
    }

    async fn exchange_code(&self, _code: &str) -> Result<GoogleProfile, AppError> {
        Err(AppError::Internal(NOT_CONFIGURED.into()))
    }
}
