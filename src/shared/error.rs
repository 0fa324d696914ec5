//! Usage: Unified error model (maps internal failures to `CODE: message` values).

use std::sync::Arc;

pub type AppResult<T> = Result<T, AppError>;

/// Error codes an embedding shell may branch on.
pub mod codes {
    /// Terminal auth failure: the refresh call failed, or a freshly refreshed
    /// access token was still rejected. The stored session has been cleared;
    /// the shell owns the decision to navigate to sign-in.
    pub const AUTH_SESSION_EXPIRED: &str = "AUTH_SESSION_EXPIRED";
    pub const AUTH_LOGIN_FAILED: &str = "AUTH_LOGIN_FAILED";
    pub const AUTH_REFRESH_FAILED: &str = "AUTH_REFRESH_FAILED";
    pub const HTTP_REQUEST_FAILED: &str = "HTTP_REQUEST_FAILED";
    pub const HTTP_STATUS: &str = "HTTP_STATUS";
    pub const BAD_RESPONSE: &str = "BAD_RESPONSE";
    pub const STORE_IO: &str = "STORE_IO";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    code: String,
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_session_expired(&self) -> bool {
        self.code == codes::AUTH_SESSION_EXPIRED
    }
}

fn split_code_message(raw: &str) -> Option<(&str, &str)> {
    let msg = raw.trim();
    if msg.is_empty() {
        return None;
    }

    let (maybe_code, rest) = msg.split_once(':')?;
    let code = maybe_code.trim();
    let mut chars = code.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    if !chars.all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_') {
        return None;
    }
    Some((code, rest.trim()))
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        if let Some((code, rest)) = split_code_message(&value) {
            if !rest.is_empty() {
                return AppError::new(code.to_string(), rest.to_string());
            }
        }
        AppError::new(codes::INTERNAL_ERROR, value)
    }
}

impl From<&'static str> for AppError {
    fn from(value: &'static str) -> Self {
        AppError::from(value.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        let message = if value.is_timeout() {
            "request timed out".to_string()
        } else if value.is_connect() {
            "connection failed".to_string()
        } else {
            value.to_string()
        };
        AppError::with_source(codes::HTTP_REQUEST_FAILED, message, value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::with_source(codes::BAD_RESPONSE, "response json invalid", value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::with_source(codes::STORE_IO, value.to_string(), value)
    }
}
