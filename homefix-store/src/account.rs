use std::sync::Arc;

use tracing::info;

use homefix_core::backend::{PasswordChange, ProfileUpdate, Registration, UserProfile};
use homefix_core::{ClientError, ClientResult};
use homefix_shared::Masked;

use crate::SessionStore;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Registration and profile management on top of the session store.
pub struct AccountService {
    session: Arc<SessionStore>,
}

impl AccountService {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Creates a customer account. Returns the new user id; the caller moves
    /// on to the location-permission step with it.
    pub async fn register_customer(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> ClientResult<String> {
        if [full_name, email, phone].iter().any(|f| f.trim().is_empty()) || password.is_empty() {
            return Err(ClientError::Validation("All fields are required.".to_string()));
        }

        let registration = Registration {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
            phone: phone.trim().to_string(),
            password: Masked::new(password.to_string()),
        };
        let user_id = self.session.auth().register_customer(&registration).await?;
        info!(%user_id, "customer registered");
        Ok(user_id)
    }

    pub async fn fetch_me(&self) -> ClientResult<UserProfile> {
        let token = self.session.bearer()?;
        self.session.auth().fetch_me(&token).await
    }

    /// Saves profile edits and mirrors the new name and email into the
    /// persisted session.
    pub async fn update_profile(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        address: Option<&str>,
    ) -> ClientResult<UserProfile> {
        if [full_name, email, phone].iter().any(|f| f.trim().is_empty()) {
            return Err(ClientError::Validation(
                "Full name, email, and phone are required.".to_string(),
            ));
        }
        let token = self.session.bearer()?;

        let update = ProfileUpdate {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
            phone: phone.trim().to_string(),
            address: address.map(|a| a.trim().to_string()),
        };
        let profile = self.session.auth().update_profile(&token, &update).await?;

        self.session.amend(|s| {
            s.display_name = profile.full_name.clone();
            s.email = profile.email.clone();
        })?;
        info!(user_id = %profile.id, "profile updated");
        Ok(profile)
    }

    pub async fn change_password(&self, current: &str, new: &str) -> ClientResult<()> {
        if current.is_empty() || new.is_empty() {
            return Err(ClientError::Validation(
                "Current password and new password are required.".to_string(),
            ));
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::Validation(format!(
                "New password must be at least {} characters long.",
                MIN_PASSWORD_LEN
            )));
        }
        let token = self.session.bearer()?;

        let change = PasswordChange {
            current_password: Masked::new(current.to_string()),
            new_password: Masked::new(new.to_string()),
        };
        self.session.auth().change_password(&token, &change).await?;
        info!("password changed");
        Ok(())
    }
}
