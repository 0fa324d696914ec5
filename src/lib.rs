mod api;
mod config;
mod http;
mod session;
mod shared;

pub use api::auth::AuthApi;
pub use config::{connect, Backends, ClientConfig};
pub use http::client::ApiClient;
pub use http::refresh::RefreshCoordinator;
pub use session::credentials::SessionCredentials;
pub use session::store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use shared::error::{codes, AppError, AppResult};
