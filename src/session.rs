//! Session persistence for the car-ads client.
//!
//! The browser original kept three localStorage entries (auth marker, user
//! mobile, JSON-encoded role array) with no expiry. Here the same three keyed
//! entries live in one JSON dotfile next to the working directory, written in
//! a single pass so the caller never observes a partial session.
//!
//! The auth marker is a plain UI-state indicator, not a credential; the
//! backend authenticates via its own session cookie.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Role;

/// Default session file name (same spirit as a `.token` dotfile in cwd)
pub const SESSION_FILE: &str = ".car_ads_session";

/// Marker value stored while logged in. The backend never inspects it; it
/// only gates client-side UI state.
pub const AUTH_MARKER: &str = "true";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Client-side session state.
/// Invariant: `authenticated` is true iff both the auth marker and a mobile
/// number were present when the session was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub user_mobile: Option<String>,
    pub roles: Vec<Role>,
}

impl Session {
    /// The empty, unauthenticated session
    pub fn anonymous() -> Self {
        Session {
            authenticated: false,
            user_mobile: None,
            roles: Vec::new(),
        }
    }

    /// Session for a freshly logged-in user
    pub fn logged_in(mobile: &str, roles: Vec<Role>) -> Self {
        Session {
            authenticated: true,
            user_mobile: Some(mobile.to_string()),
            roles,
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::anonymous()
    }
}

/// Injectable session repository: the view controller and resource client
/// depend on this instead of ambient global state, so tests can swap in the
/// in-memory implementation.
pub trait SessionStore: Send + Sync {
    /// Last saved session, or the anonymous session when nothing valid is stored
    fn load(&self) -> Session;
    fn save(&self, session: &Session) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// On-disk shape: the three keyed entries, nothing else.
/// Roles are stored as a JSON-encoded array string under `user_roles`,
/// mirroring the original storage layout.
#[derive(Serialize, Deserialize, Debug, Default)]
struct StoredSession {
    #[serde(default)]
    auth_token: Option<String>,
    #[serde(default)]
    user_mobile: Option<String>,
    #[serde(default)]
    user_roles: Option<String>,
}

/// File-backed store surviving across CLI invocations
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }

    /// Store at the default dotfile in the current directory
    pub fn default_location() -> Self {
        FileSessionStore::new(SESSION_FILE)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Session {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Session::anonymous(),  // No file yet: not logged in
        };

        let stored: StoredSession = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("malformed session file, treating as logged out: {}", e);
                return Session::anonymous();
            }
        };

        // Authenticated only when the marker is truthy AND a mobile is stored
        let token_present = stored
            .auth_token
            .as_deref()
            .map(|t| !t.is_empty() && t != "false")
            .unwrap_or(false);

        match (token_present, stored.user_mobile) {
            (true, Some(mobile)) => {
                let roles = stored
                    .user_roles
                    .as_deref()
                    .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
                    .unwrap_or_default()
                    .into_iter()
                    .map(Role::from)
                    .collect();
                Session {
                    authenticated: true,
                    user_mobile: Some(mobile),
                    roles,
                }
            }
            _ => Session::anonymous(),
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        let role_names: Vec<String> =
            session.roles.iter().map(|r| r.to_string()).collect();
        let stored = StoredSession {
            auth_token: session.authenticated.then(|| AUTH_MARKER.to_string()),
            user_mobile: session.user_mobile.clone(),
            user_roles: Some(serde_json::to_string(&role_names)?),
        };
        // One write call for all three entries
        fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)?;
        debug!("session saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and one-shot scripts
#[derive(Default)]
pub struct MemorySessionStore {
    current: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Session {
        self.current
            .lock()
            .expect("session store lock poisoned")
            .clone()
            .unwrap_or_else(Session::anonymous)
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.current.lock().expect("session store lock poisoned") =
            Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.current.lock().expect("session store lock poisoned") = None;
        Ok(())
    }
}
