//! Logged-in and logged-out stores for tests of the crates built on top
//! of the session store.

use std::sync::Arc;

use async_trait::async_trait;

use homefix_core::backend::{Credentials, PasswordChange, ProfileUpdate, Registration, UserProfile};
use homefix_core::{AuthBackend, ClientError, ClientResult};
use homefix_shared::{Role, Session};

use crate::{MemorySessionStorage, SessionStore};

/// An auth backend that is never reachable.
pub struct NoAuth;

#[async_trait]
impl AuthBackend for NoAuth {
    async fn login(&self, _: &Credentials) -> ClientResult<Session> {
        Err(ClientError::Network("offline".to_string()))
    }
    async fn register_customer(&self, _: &Registration) -> ClientResult<String> {
        Err(ClientError::Network("offline".to_string()))
    }
    async fn fetch_me(&self, _: &str) -> ClientResult<UserProfile> {
        Err(ClientError::Network("offline".to_string()))
    }
    async fn update_profile(&self, _: &str, _: &ProfileUpdate) -> ClientResult<UserProfile> {
        Err(ClientError::Network("offline".to_string()))
    }
    async fn change_password(&self, _: &str, _: &PasswordChange) -> ClientResult<()> {
        Err(ClientError::Network("offline".to_string()))
    }
}

/// Session for `user_id` with token `token-<user_id>`.
pub fn session(user_id: &str, role: Role) -> Session {
    Session {
        user_id: user_id.to_string(),
        role,
        token: format!("token-{}", user_id).as_str().into(),
        display_name: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        profile_picture: None,
    }
}

pub fn logged_in_store(user_id: &str, role: Role) -> Arc<SessionStore> {
    let store = SessionStore::new(Arc::new(NoAuth), Arc::new(MemorySessionStorage::with_session(session(user_id, role))));
    store.restore().expect("memory storage restores");
    Arc::new(store)
}

pub fn logged_out_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(Arc::new(NoAuth), Arc::new(MemorySessionStorage::new())))
}
