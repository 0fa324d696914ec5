//! Usage: Identity service endpoints (login, token refresh, logout).

use crate::session::credentials::SessionCredentials;
use crate::shared::error::{codes, AppError, AppResult};
use crate::shared::security::mask_token;
use serde_json::{json, Value};

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const ERROR_SNIPPET_MAX_CHARS: usize = 500;

/// Thin client for the identity backend. Deliberately built on a bare
/// `reqwest::Client` with no interceptor stack: the refresh call must never
/// carry a stale `Authorization` header and must never re-enter the 401
/// recovery path.
#[derive(Debug, Clone)]
pub struct AuthApi {
    http: reqwest::Client,
    base_url: String,
    refresh_path: String,
}

impl AuthApi {
    pub fn new(base_url: &str, refresh_path: &str) -> AppResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::new(
                codes::INTERNAL_ERROR,
                "auth base url must not be empty",
            ));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| format!("INTERNAL_ERROR: auth http client build failed: {e}"))?;

        Ok(Self {
            http,
            base_url,
            refresh_path: normalize_path(refresh_path),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<SessionCredentials> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, LOGIN_PATH))
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await
            .map_err(|e| format!("AUTH_LOGIN_FAILED: login request failed: {e}"))?;

        let credentials = parse_credentials(response, codes::AUTH_LOGIN_FAILED).await?;
        tracing::debug!(
            access_token = %mask_token(&credentials.access_token),
            manager_id = credentials.manager_id.as_deref().unwrap_or("<none>"),
            "login succeeded"
        );
        Ok(credentials)
    }

    /// Exchanges the refresh token for a new credential pair. Any non-2xx is
    /// refresh failure; the caller owns session teardown.
    pub(crate) async fn refresh(&self, refresh_token: &str) -> AppResult<SessionCredentials> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, self.refresh_path))
            .json(&json!({ "refreshToken": refresh_token.trim() }))
            .send()
            .await
            .map_err(|e| format!("AUTH_REFRESH_FAILED: refresh request failed: {e}"))?;

        parse_credentials(response, codes::AUTH_REFRESH_FAILED).await
    }

    /// Best-effort server-side revoke. The local store is cleared by the
    /// caller regardless of how the backend answers.
    pub async fn logout(&self, access_token: Option<&str>) {
        let mut request = self.http.post(format!("{}{}", self.base_url, LOGOUT_PATH));
        if let Some(token) = access_token.map(str::trim).filter(|v| !v.is_empty()) {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "logout ignored by backend");
            }
            Err(err) => {
                tracing::debug!("logout request failed: {err}");
            }
        }
    }
}

pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    format!("/{trimmed}")
}

async fn parse_credentials(
    response: reqwest::Response,
    failure_code: &'static str,
) -> AppResult<SessionCredentials> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("{failure_code}: token response read failed: {e}"))?;

    if !status.is_success() {
        return Err(AppError::new(
            failure_code,
            format!(
                "token endpoint returned status={} body={}",
                status.as_u16(),
                sanitize_body_snippet(&body)
            ),
        ));
    }

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| format!("{failure_code}: token response json invalid: {e}"))?;

    let access_token = token_field(&value, &["accessToken", "access_token"]).ok_or_else(|| {
        AppError::new(failure_code, "token response missing access token")
    })?;
    let refresh_token = token_field(&value, &["refreshToken", "refresh_token"]).ok_or_else(|| {
        AppError::new(failure_code, "token response missing refresh token")
    })?;
    let manager_id = token_field(&value, &["manager_id", "managerId"]);

    SessionCredentials::new(access_token, refresh_token, manager_id)
}

fn token_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lc = key.trim().to_ascii_lowercase();
    key_lc.contains("token") || key_lc.contains("secret") || key_lc.contains("password")
}

fn redact_sensitive_json_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if is_sensitive_key(key) {
                    if let Some(raw) = nested.as_str() {
                        *nested = Value::String(mask_token(raw));
                        continue;
                    }
                }
                redact_sensitive_json_fields(nested);
            }
        }
        Value::Array(items) => {
            for nested in items {
                redact_sensitive_json_fields(nested);
            }
        }
        _ => {}
    }
}

pub(crate) fn sanitize_body_snippet(body: &str) -> String {
    if let Ok(mut value) = serde_json::from_str::<Value>(body) {
        redact_sensitive_json_fields(&mut value);
        if let Ok(encoded) = serde_json::to_string(&value) {
            return encoded.chars().take(ERROR_SNIPPET_MAX_CHARS).collect();
        }
    }
    body.chars().take(ERROR_SNIPPET_MAX_CHARS).collect()
}
