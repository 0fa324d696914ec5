//! Usage: CSRF cookie re-priming for 403 recovery.

use crate::shared::error::{codes, AppError, AppResult};

/// Re-primes the backend's CSRF cookie by hitting a safe idempotent GET
/// endpoint. The cookie lands in the calling client's jar, so the retried
/// request picks it up automatically.
#[derive(Debug, Clone)]
pub(crate) struct CsrfRecovery {
    prime_url: String,
}

impl CsrfRecovery {
    pub(crate) fn new(base_url: &str, prime_path: &str) -> Self {
        Self {
            prime_url: format!(
                "{}{}",
                base_url.trim_end_matches('/'),
                crate::api::auth::normalize_path(prime_path)
            ),
        }
    }

    pub(crate) async fn prime(&self, http: &reqwest::Client) -> AppResult<()> {
        tracing::debug!(url = %self.prime_url, "re-priming csrf cookie after 403");
        let response = http.get(&self.prime_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::new(
                codes::HTTP_STATUS,
                format!("csrf priming endpoint returned status={}", status.as_u16()),
            ));
        }
        Ok(())
    }
}
