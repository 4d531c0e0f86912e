use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use homefix_core::backend::Credentials;
use homefix_core::{AuthBackend, ClientError, ClientResult, SessionStorage};
use homefix_shared::Session;

pub const LOGIN_FAILED: &str = "Login failed. Please try again.";
pub const NOT_LOGGED_IN: &str = "Please login to continue";

/// The application-wide authenticated identity. Injected into every
/// component that talks to the backend; read-only outside this type.
pub struct SessionStore {
    auth: Arc<dyn AuthBackend>,
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthBackend>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { auth, storage, current: RwLock::new(None) }
    }

    /// Loads any persisted session. Call before handing the store to other
    /// components; an absent session means logged out.
    pub fn restore(&self) -> ClientResult<Option<Session>> {
        let restored = self.storage.load()?;
        match &restored {
            Some(session) => info!(user_id = %session.user_id, role = %session.role, "session restored"),
            None => info!("no persisted session"),
        }
        self.set(restored.clone());
        Ok(restored)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation("All fields are required.".to_string()));
        }

        let session = self
            .auth
            .login(&Credentials::new(email, password))
            .await
            .map_err(|e| match e {
                ClientError::Request { message, .. } => {
                    ClientError::Auth(message.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| LOGIN_FAILED.to_string()))
                }
                ClientError::Network(reason) => {
                    warn!("login request did not complete: {}", reason);
                    ClientError::Auth(LOGIN_FAILED.to_string())
                }
                other => other,
            })?;

        self.storage.save(&session)?;
        self.set(Some(session.clone()));
        info!(user_id = %session.user_id, role = %session.role, "logged in");
        Ok(session)
    }

    /// Clears the persisted session. No backend call.
    pub fn logout(&self) -> ClientResult<()> {
        self.storage.clear()?;
        self.set(None);
        info!("logged out");
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    /// The active session, or `ClientError::Auth` when logged out.
    pub fn require(&self) -> ClientResult<Session> {
        self.current().ok_or_else(|| ClientError::Auth(NOT_LOGGED_IN.to_string()))
    }

    /// Bearer token for authenticated requests.
    pub fn bearer(&self) -> ClientResult<String> {
        self.require().map(|s| s.bearer().to_string())
    }

    /// Applies an edit to the active session and re-persists it.
    pub fn amend(&self, edit: impl FnOnce(&mut Session)) -> ClientResult<Session> {
        let mut session = self.require()?;
        edit(&mut session);
        self.storage.save(&session)?;
        self.set(Some(session.clone()));
        Ok(session)
    }

    pub(crate) fn auth(&self) -> &Arc<dyn AuthBackend> {
        &self.auth
    }

    fn set(&self, session: Option<Session>) {
        if let Ok(mut current) = self.current.write() {
            *current = session;
        }
    }
}
