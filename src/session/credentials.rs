//! Usage: Session credential set held by the token store.

use crate::shared::error::{codes, AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A complete signed-in session. Constructing one requires both tokens, so a
/// stored session is always whole: access and refresh token are either both
/// present or the session is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "manager_id", default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
}

impl SessionCredentials {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        manager_id: Option<String>,
    ) -> AppResult<Self> {
        let access_token = access_token.into().trim().to_string();
        let refresh_token = refresh_token.into().trim().to_string();
        if access_token.is_empty() || refresh_token.is_empty() {
            return Err(AppError::new(
                codes::INTERNAL_ERROR,
                "session credentials require both an access and a refresh token",
            ));
        }

        Ok(Self {
            access_token,
            refresh_token,
            manager_id: manager_id
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        })
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.refresh_token.trim().is_empty()
    }
}
