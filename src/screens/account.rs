use crate::app::AppState;
use crate::auth::{validate_sign_in, validate_sign_up, AuthProvider};
use crate::error::{AuthError, Error, Result};
use crate::session::AuthUser;
use std::sync::Arc;
use tracing::{error, info};

/// Login and sign-up forms. Errors carry a [`Error::user_message`] for the alert.
pub struct AccountScreen {
    state: AppState,
}

impl AccountScreen {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn provider(&self) -> Result<&Arc<dyn AuthProvider>> {
        self.state
            .auth
            .as_ref()
            .ok_or_else(|| Error::Auth(AuthError::Other("accounts are not configured".to_string())))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser> {
        validate_sign_in(email, password)?;
        info!("Attempting to login with {}", email.trim());
        let user = self
            .provider()?
            .sign_in(email.trim(), password)
            .await
            .map_err(|e| {
                error!("Login error: {}", e);
                e
            })?;
        self.state.session.set_user(Some(user.clone())).await?;
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str, confirm: &str) -> Result<AuthUser> {
        validate_sign_up(email, password, confirm)?;
        let user = self
            .provider()?
            .sign_up(email.trim(), password)
            .await
            .map_err(|e| {
                error!("Sign-up error: {}", e);
                e
            })?;
        self.state.session.set_user(Some(user.clone())).await?;
        Ok(user)
    }
}
