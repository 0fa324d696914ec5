//! Usage: Client configuration and wiring for the two backend services.

use crate::api::auth::AuthApi;
use crate::http::client::ApiClient;
use crate::http::refresh::RefreshCoordinator;
use crate::session::credentials::SessionCredentials;
use crate::session::store::TokenStore;
use crate::shared::error::AppResult;
use std::sync::Arc;

pub const DEFAULT_REFRESH_PATH: &str = "/auth/token/refresh";
pub const DEFAULT_CSRF_PRIME_PATH: &str = "/auth/csrf";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity service (sign-in, token refresh).
    pub auth_base_url: String,
    /// Control-panel service (clients, offers, templates, plans).
    pub panel_base_url: String,
    pub refresh_path: String,
    pub csrf_prime_path: String,
}

impl ClientConfig {
    pub fn new(auth_base_url: impl Into<String>, panel_base_url: impl Into<String>) -> Self {
        Self {
            auth_base_url: auth_base_url.into(),
            panel_base_url: panel_base_url.into(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            csrf_prime_path: DEFAULT_CSRF_PRIME_PATH.to_string(),
        }
    }
}

/// The pair of backend clients plus session-level operations. Both clients
/// share one token store and one refresh coordinator, so concurrent 401s from
/// either backend collapse into a single refresh call.
pub struct Backends {
    pub auth: ApiClient,
    pub panel: ApiClient,
    auth_api: AuthApi,
    store: Arc<dyn TokenStore>,
}

pub fn connect(config: &ClientConfig, store: Arc<dyn TokenStore>) -> AppResult<Backends> {
    let auth_api = AuthApi::new(&config.auth_base_url, &config.refresh_path)?;
    let refresh = Arc::new(RefreshCoordinator::new(auth_api.clone(), Arc::clone(&store)));

    let auth = ApiClient::new(
        &config.auth_base_url,
        Arc::clone(&store),
        Arc::clone(&refresh),
        &config.csrf_prime_path,
    )?;
    let panel = ApiClient::new(
        &config.panel_base_url,
        Arc::clone(&store),
        refresh,
        &config.csrf_prime_path,
    )?;

    Ok(Backends {
        auth,
        panel,
        auth_api,
        store,
    })
}

impl Backends {
    /// Signs in and persists the full credential set. Replaces any previous
    /// session atomically (both tokens plus the manager id land together).
    pub async fn login(&self, email: &str, password: &str) -> AppResult<SessionCredentials> {
        let credentials = self.auth_api.login(email, password).await?;
        self.store.save(credentials.clone())?;
        Ok(credentials)
    }

    /// Best-effort backend revoke; the local session is cleared regardless.
    pub async fn logout(&self) -> AppResult<()> {
        let access_token = self.store.access_token();
        self.auth_api.logout(access_token.as_deref()).await;
        self.store.clear()
    }

    /// Session restored from the durable store, if any.
    pub fn session(&self) -> Option<SessionCredentials> {
        self.store.load()
    }
}
