use crate::error::{AuthError, Error, Result};
use crate::session::AuthUser;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const IDENTITY_TOOLKIT_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_BASE: &str = "https://securetoken.googleapis.com/v1";
pub const MIN_PASSWORD_LEN: usize = 6;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;
    async fn sign_out(&self, user: &AuthUser) -> Result<()>;
    /// Exchanges the user's refresh token for a new id token.
    async fn refresh(&self, user: &AuthUser) -> Result<AuthUser>;
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::Validation("Please fill in all fields".to_string()));
    }
    Ok(())
}

pub fn validate_sign_up(email: &str, password: &str, confirm: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(Error::Validation("Please fill in all fields".to_string()));
    }
    if password != confirm {
        return Err(Error::Validation("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Email/password accounts through the Firebase Identity Toolkit REST API.
#[derive(Debug, Clone)]
pub struct FirebaseAuthClient {
    client: Client,
    api_key: String,
    base_url: String,
    secure_token_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: Option<String>,
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuthClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut client = Self::with_base_url(IDENTITY_TOOLKIT_BASE, api_key, timeout)?;
        client.secure_token_url = format!("{}/token", SECURE_TOKEN_BASE);
        Ok(client)
    }

    /// Both the account and the token endpoints are served under `base_url`.
    pub fn with_base_url(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to build auth HTTP client: {}", e)))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            api_key: api_key.into(),
            secure_token_url: format!("{}/token", base_url),
            base_url,
        })
    }

    async fn password_call(&self, action: &str, email: &str, password: &str) -> Result<AuthUser> {
        let url = format!("{}/accounts:{}?key={}", self.base_url, action, self.api_key);
        let body = json!({
            "email": email.trim(),
            "password": password,
            "returnSecureToken": true,
        });
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.without_url().to_string()))?;
        let text = read_body(action, res).await?;

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Malformed(format!("auth response: {}", e)))?;
        Ok(AuthUser {
            uid: parsed.local_id,
            email: parsed.email.or_else(|| Some(email.trim().to_string())),
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
        })
    }
}

/// Reads a Firebase response body, mapping error envelopes to [`AuthError`].
async fn read_body(action: &str, res: reqwest::Response) -> Result<String> {
    let status = res.status();
    let text = res
        .text()
        .await
        .map_err(|e| Error::Network(format!("reading body failed: {}", e.without_url())))?;
    if status.is_success() {
        return Ok(text);
    }
    let message = serde_json::from_str::<ErrorEnvelope>(&text)
        .map(|e| e.error.message)
        .map_err(|_| Error::Http {
            status: status.as_u16(),
            body: text.clone(),
        })?;
    warn!("Firebase {} rejected: {}", action, message);
    Err(Error::Auth(AuthError::from_firebase_code(&message)))
}

#[async_trait]
impl AuthProvider for FirebaseAuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let user = self.password_call("signUp", email, password).await?;
        info!("Created account {}", user.uid);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    // Id tokens are bearer tokens; dropping them locally ends the session.
    async fn sign_out(&self, user: &AuthUser) -> Result<()> {
        info!("Discarding tokens for {}", user.uid);
        Ok(())
    }

    async fn refresh(&self, user: &AuthUser) -> Result<AuthUser> {
        let refresh_token = user
            .refresh_token
            .as_deref()
            .ok_or(Error::Auth(AuthError::SessionExpired))?;
        let url = format!("{}?key={}", self.secure_token_url, self.api_key);
        let form = format!(
            "grant_type=refresh_token&refresh_token={}",
            urlencoding::encode(refresh_token)
        );
        let res = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| Error::Network(e.without_url().to_string()))?;
        let text = read_body("token refresh", res).await?;
        let parsed: RefreshResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Malformed(format!("token response: {}", e)))?;
        info!("Refreshed id token for {}", user.uid);
        Ok(AuthUser {
            uid: parsed.user_id.unwrap_or_else(|| user.uid.clone()),
            email: user.email.clone(),
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token.or_else(|| user.refresh_token.clone()),
        })
    }
}
