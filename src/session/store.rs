//! Usage: Durable key-value persistence for session credentials.

use crate::session::credentials::SessionCredentials;
use crate::shared::error::AppResult;
use crate::shared::mutex_ext::MutexExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Shared credential storage. Mutated only by login/logout and by the refresh
/// coordinator when a refresh settles.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<SessionCredentials>;
    fn save(&self, credentials: SessionCredentials) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;

    fn access_token(&self) -> Option<String> {
        self.load().map(|c| c.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().map(|c| c.refresh_token)
    }
}

/// Process-local store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<SessionCredentials>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<SessionCredentials> {
        self.inner.lock_or_recover().clone()
    }

    fn save(&self, credentials: SessionCredentials) -> AppResult<()> {
        *self.inner.lock_or_recover() = Some(credentials);
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.inner.lock_or_recover() = None;
        Ok(())
    }
}

/// JSON file store, the durable analog of the browser's local storage. The
/// session is restored once at open and kept cached; writes go through a
/// sibling temp file plus rename so a crash never leaves a torn session.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: Mutex<Option<SessionCredentials>>,
}

impl FileTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let cached = read_session_file(&path);
        Ok(Self {
            path,
            cached: Mutex::new(cached),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<SessionCredentials> {
        self.cached.lock_or_recover().clone()
    }

    fn save(&self, credentials: SessionCredentials) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let encoded = serde_json::to_string_pretty(&credentials)
            .map_err(|e| format!("STORE_IO: session file encode failed: {e}"))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;

        *self.cached.lock_or_recover() = Some(credentials);
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        *self.cached.lock_or_recover() = None;
        Ok(())
    }
}

// Fail open: an unreadable or partial session file is treated as signed-out
// rather than surfacing an error during construction.
fn read_session_file(path: &Path) -> Option<SessionCredentials> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!(path = %path.display(), "session file unreadable: {err}");
            return None;
        }
    };

    match serde_json::from_str::<SessionCredentials>(&raw) {
        Ok(credentials) if credentials.is_complete() => Some(credentials),
        Ok(_) => {
            tracing::warn!(
                path = %path.display(),
                "session file is missing a token; treating as signed out"
            );
            None
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), "session file invalid: {err}");
            None
        }
    }
}
