//! Usage: Backend API client with bearer injection and 401/403 recovery.

use crate::api::auth::{normalize_path, sanitize_body_snippet};
use crate::http::csrf::CsrfRecovery;
use crate::http::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::session::store::TokenStore;
use crate::shared::error::{codes, AppError, AppResult};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One client per backend service. Both instances share the same token store
/// and the same refresh coordinator, so the single-flight guarantee holds
/// across backends.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    refresh: Arc<RefreshCoordinator>,
    csrf: CsrfRecovery,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        store: Arc<dyn TokenStore>,
        refresh: Arc<RefreshCoordinator>,
        csrf_prime_path: &str,
    ) -> AppResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::new(
                codes::INTERNAL_ERROR,
                "backend base url must not be empty",
            ));
        }

        // Cookie jar holds the CSRF cookie between the priming call and the
        // retried request.
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| format!("INTERNAL_ERROR: http client build failed: {e}"))?;

        let csrf = CsrfRecovery::new(&base_url, csrf_prime_path);
        Ok(Self {
            base_url,
            http,
            store,
            refresh,
            csrf,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request through the full recovery policy and returns the raw
    /// response. Only a first 401 and a first 403 are intercepted; any other
    /// status (including a repeated 403) is handed back unmodified.
    pub async fn send(&self, method: Method, path: &str) -> AppResult<reqwest::Response> {
        self.execute(method, path, None).await
    }

    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &impl Serialize,
    ) -> AppResult<reqwest::Response> {
        let body = serde_json::to_value(body)?;
        self.execute(method, path, Some(&body)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self.execute(Method::GET, path, None).await?;
        decode_json(response).await
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> AppResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::POST, path, Some(&body)).await?;
        decode_json(response).await
    }

    pub async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> AppResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::PATCH, path, Some(&body)).await?;
        decode_json(response).await
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        let response = self.execute(Method::DELETE, path, None).await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> AppResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, normalize_path(path));
        let mut bearer = self.store.access_token();
        let mut auth_retried = false;
        let mut csrf_retried = false;

        loop {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(token) = bearer.as_deref() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            // Network-level failures pass through untouched; only 401/403
            // responses are policy business.
            let response = request.send().await?;

            match response.status().as_u16() {
                401 if !auth_retried => {
                    auth_retried = true;
                    match self.refresh.recover_unauthorized().await? {
                        RefreshOutcome::Refreshed(token) => {
                            bearer = Some(token);
                        }
                        RefreshOutcome::SessionGone => {
                            return Err(session_expired("refresh failed"));
                        }
                    }
                }
                401 => {
                    // Fresh token still rejected: terminal. Tear the session
                    // down and let the shell route to sign-in.
                    tracing::warn!(url = %url, "access token rejected after refresh");
                    if let Err(err) = self.store.clear() {
                        tracing::warn!("session store clear failed: {err}");
                    }
                    return Err(session_expired("access token rejected after refresh"));
                }
                403 if !csrf_retried => {
                    csrf_retried = true;
                    self.csrf.prime(&self.http).await?;
                }
                _ => return Ok(response),
            }
        }
    }
}

fn session_expired(detail: &str) -> AppError {
    AppError::new(
        codes::AUTH_SESSION_EXPIRED,
        format!("{detail}; sign-in required"),
    )
}

async fn expect_success(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::new(
        codes::HTTP_STATUS,
        format!(
            "backend returned status={} body={}",
            status.as_u16(),
            sanitize_body_snippet(&body)
        ),
    ))
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let response = expect_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
