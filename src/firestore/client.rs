use super::value::{decode_fields, encode_fields};
use super::{DocumentStore, Fields};
use crate::auth::AuthProvider;
use crate::error::{AuthError, Error, Result};
use crate::session::SessionContext;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: u32 = 300;

/// Firestore REST v1 client authenticated with the signed-in user's id token.
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    documents_url: String,
    session: Arc<SessionContext>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl FirestoreClient {
    pub fn new(project_id: &str, session: Arc<SessionContext>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(FIRESTORE_BASE, project_id, session, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        session: Arc<SessionContext>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(format!("cinescope/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("failed to build Firestore HTTP client: {}", e)))?;
        Ok(Self {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                project_id
            ),
            session,
            auth: None,
        })
    }

    /// Lets a rejected id token be refreshed once and the request retried.
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.documents_url, path.trim_matches('/'))
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<(StatusCode, String)> {
        let mut req = self.client.request(method.clone(), url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().await.map_err(|e| {
            let e = e.without_url();
            warn!("Firestore {} failed: {}", method, e);
            Error::Network(e.to_string())
        })?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| Error::Network(format!("reading body failed: {}", e.without_url())))?;
        Ok((status, text))
    }

    /// Swaps the session's id token for a fresh one. `None` when that is not possible.
    async fn refreshed_token(&self, rejected: Option<&str>) -> Result<Option<String>> {
        let (Some(auth), Some(user)) = (&self.auth, self.session.current()) else {
            return Ok(None);
        };
        // Another request already refreshed it.
        if rejected != Some(user.id_token.as_str()) {
            return Ok(Some(user.id_token));
        }
        if user.refresh_token.is_none() {
            return Ok(None);
        }
        let fresh = auth.refresh(&user).await?;
        let token = fresh.id_token.clone();
        self.session.set_user(Some(fresh)).await?;
        info!("Retrying Firestore request with a refreshed id token");
        Ok(Some(token))
    }

    /// Sends the request; `Ok(None)` means 404.
    async fn send(&self, method: Method, url: &str, body: Option<Value>) -> Result<Option<Value>> {
        let token = self.session.id_token();
        let (mut status, mut text) = self
            .attempt(&method, url, token.as_deref(), body.as_ref())
            .await?;
        if status == StatusCode::UNAUTHORIZED {
            if let Some(fresh) = self.refreshed_token(token.as_deref()).await? {
                (status, text) = self.attempt(&method, url, Some(fresh.as_str()), body.as_ref()).await?;
            }
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!("Firestore {} -> {}: {}", method, status, text);
            return Err(match status {
                StatusCode::UNAUTHORIZED => Error::Auth(AuthError::SessionExpired),
                StatusCode::FORBIDDEN => Error::Auth(AuthError::PermissionDenied),
                _ => Error::Http {
                    status: status.as_u16(),
                    body: text,
                },
            });
        }
        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::Malformed(format!("Firestore response: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, path: &str) -> Result<Option<Fields>> {
        debug!(path, "Firestore get");
        match self.send(Method::GET, &self.url(path), None).await? {
            Some(doc) => decode_fields(doc.get("fields")).map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, path: &str, fields: Fields) -> Result<()> {
        debug!(path, "Firestore set");
        let body = json!({ "fields": encode_fields(&fields) });
        self.send(Method::PATCH, &self.url(path), Some(body))
            .await?
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        Ok(())
    }

    async fn merge(&self, path: &str, fields: Fields) -> Result<()> {
        debug!(path, "Firestore merge");
        let mask = fields
            .keys()
            .map(|k| format!("updateMask.fieldPaths={}", urlencoding::encode(k)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}?{}", self.url(path), mask);
        let body = json!({ "fields": encode_fields(&fields) });
        self.send(Method::PATCH, &url, Some(body))
            .await?
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        debug!(path, "Firestore delete");
        self.send(Method::DELETE, &self.url(path), None).await?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Fields>> {
        debug!(collection, "Firestore list");
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = format!("{}?pageSize={}", self.url(collection), LIST_PAGE_SIZE);
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(&urlencoding::encode(token));
            }
            let Some(body) = self.send(Method::GET, &url, None).await? else {
                break;
            };
            if let Some(docs) = body.get("documents").and_then(|d| d.as_array()) {
                for doc in docs {
                    out.push(decode_fields(doc.get("fields"))?);
                }
            }
            page_token = body
                .get("nextPageToken")
                .and_then(|t| t.as_str())
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string());
            if page_token.is_none() {
                break;
            }
        }
        Ok(out)
    }
}
