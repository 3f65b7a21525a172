use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

// storage key the token lives under, and the only value accepted as a login.
// this is a local toggle, not a credential check.
pub const TOKEN_KEY: &str = "jwtToken";
pub const EXPECTED_TOKEN: &str = "your-jwt-token-here";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read token file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write token file: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove token file: {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

pub trait TokenStore {
    fn load(&self) -> Result<Option<String>, AuthError>;
    fn save(&mut self, value: &str) -> Result<(), AuthError>;
    fn clear(&mut self) -> Result<(), AuthError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    value: Option<String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, AuthError> {
        Ok(self.value.clone())
    }

    fn save(&mut self, value: &str) -> Result<(), AuthError> {
        self.value = Some(value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), AuthError> {
        self.value = None;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, AuthError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw.trim_end_matches(['\r', '\n']).to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::Read {
                path: self.display(),
                source: e,
            }),
        }
    }

    fn save(&mut self, value: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AuthError::Write {
                path: self.display(),
                source: e,
            })?;
        }
        std::fs::write(&self.path, value).map_err(|e| AuthError::Write {
            path: self.display(),
            source: e,
        })
    }

    fn clear(&mut self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Remove {
                path: self.display(),
                source: e,
            }),
        }
    }
}

/// Holds the authentication state derived from a [`TokenStore`].
///
/// The store is read once on construction; afterwards the state only moves
/// through [`AuthGuard::login`] and [`AuthGuard::logout`].
#[derive(Debug)]
pub struct AuthGuard<S: TokenStore> {
    store: S,
    state: AuthState,
}

impl<S: TokenStore> AuthGuard<S> {
    pub fn new(store: S) -> Result<Self, AuthError> {
        let state = match store.load()? {
            Some(token) if token == EXPECTED_TOKEN => AuthState::Authenticated,
            Some(_) => {
                debug!("stored token does not match, treating as logged out");
                AuthState::Unauthenticated
            }
            None => AuthState::Unauthenticated,
        };
        Ok(Self { store, state })
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn login(&mut self) -> Result<AuthState, AuthError> {
        self.store.save(EXPECTED_TOKEN)?;
        self.state = AuthState::Authenticated;
        info!("logged in");
        Ok(self.state)
    }

    pub fn logout(&mut self) -> Result<AuthState, AuthError> {
        self.store.clear()?;
        self.state = AuthState::Unauthenticated;
        info!("logged out");
        Ok(self.state)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
