#![allow(dead_code)]

use offerdesk_client::{
    connect, Backends, ClientConfig, MemoryTokenStore, SessionCredentials, TokenStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub const STALE_ACCESS: &str = "stale-access";
pub const FRESH_ACCESS: &str = "fresh-access";
pub const REFRESH_TOKEN: &str = "refresh-1";
pub const ROTATED_REFRESH: &str = "refresh-2";

/// Backends wired against the mock server with a signed-in (but stale)
/// session already in the store.
pub fn signed_in_backends(server: &MockServer) -> (Backends, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    store
        .save(
            SessionCredentials::new(STALE_ACCESS, REFRESH_TOKEN, Some("m-1".to_string()))
                .expect("seed credentials"),
        )
        .expect("seed store");
    let backends = wire(server, Arc::clone(&store));
    (backends, store)
}

/// Backends with an empty store (signed-out state).
pub fn signed_out_backends(server: &MockServer) -> (Backends, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    let backends = wire(server, Arc::clone(&store));
    (backends, store)
}

fn wire(server: &MockServer, store: Arc<MemoryTokenStore>) -> Backends {
    init_tracing();
    let config = ClientConfig::new(server.uri(), server.uri());
    connect(&config, store as Arc<dyn TokenStore>).expect("wire backends")
}

// RUST_LOG=debug makes the recovery decisions visible when a test misbehaves.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn token_response(access: &str, refresh: &str) -> Value {
    json!({ "accessToken": access, "refreshToken": refresh, "manager_id": "m-1" })
}

/// Matches requests that carry no `Authorization` header at all.
pub struct NoAuthorizationHeader;

impl wiremock::Match for NoAuthorizationHeader {
    fn matches(&self, request: &wiremock::Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}
