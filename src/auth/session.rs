use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    api::{ApiClient, ApiError},
    models::{Credentials, Registration, User},
};

const ENABLE_LOGS: bool = true;
use crate::{log_info, log_warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionStatus {
    /// `restore_session` has not finished yet.
    #[default]
    Unknown,
    SignedOut,
    SignedIn(User),
}

/// Signed-in state for the client. The bearer token itself lives in the
/// [`TokenStore`](super::TokenStore) the API client reads from, so requests
/// pick up sign-in and sign-out without going through this type.
#[derive(Clone)]
pub struct AuthSession {
    api: ApiClient,
    status: Arc<Mutex<SessionStatus>>,
}

impl AuthSession {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            status: Arc::new(Mutex::new(SessionStatus::Unknown)),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.status.lock().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        matches!(*self.status.lock().await, SessionStatus::SignedIn(_))
    }

    pub async fn current_user(&self) -> Option<User> {
        match &*self.status.lock().await {
            SessionStatus::SignedIn(user) => Some(user.clone()),
            _ => None,
        }
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<User> {
        let credentials = Credentials {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(anyhow!("Username and password are required"));
        }

        let (token, user) = self.api.login(&credentials).await?;
        self.api
            .tokens()
            .set_token(&token)
            .context("Failed to store auth token")?;

        let user = user.unwrap_or_else(|| User {
            username: credentials.username.clone(),
            ..User::default()
        });
        log_info!("signed in as {}", user.username);
        *self.status.lock().await = SessionStatus::SignedIn(user.clone());
        Ok(user)
    }

    /// Creates the account. The user still has to sign in afterwards.
    pub async fn sign_up(&self, username: &str, password: &str, fullname: &str) -> Result<()> {
        let registration = Registration {
            username: username.trim().to_string(),
            password: password.to_string(),
            fullname: fullname.trim().to_string(),
        };
        if registration.username.is_empty() || registration.password.is_empty() {
            return Err(anyhow!("Username and password are required"));
        }

        self.api.register(&registration).await?;
        log_info!("registered {}", registration.username);
        Ok(())
    }

    /// Checks a stored token against `/users/me`.
    ///
    /// A token the server rejects is deleted. Transport failures keep it, so
    /// an offline start does not sign the user out.
    pub async fn restore_session(&self) -> Result<SessionStatus> {
        if self.api.tokens().token().is_none() {
            log_info!("no stored token");
            *self.status.lock().await = SessionStatus::SignedOut;
            return Ok(SessionStatus::SignedOut);
        }

        let status = match self.api.current_user().await {
            Ok(user) => SessionStatus::SignedIn(user),
            Err(err) if rejects_token(&err) => {
                log_warn!("stored token rejected ({err}), signing out");
                self.api
                    .tokens()
                    .clear_token()
                    .context("Failed to delete rejected token")?;
                SessionStatus::SignedOut
            }
            Err(err) => {
                log_warn!("could not restore session: {err}");
                *self.status.lock().await = SessionStatus::SignedOut;
                return Err(err.into());
            }
        };

        *self.status.lock().await = status.clone();
        Ok(status)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.api
            .tokens()
            .clear_token()
            .context("Failed to delete auth token")?;
        *self.status.lock().await = SessionStatus::SignedOut;
        log_info!("signed out");
        Ok(())
    }
}

/// Whether the server answered, and the answer means the token is no good.
fn rejects_token(err: &ApiError) -> bool {
    if err.is_retryable() {
        return false;
    }
    match err {
        ApiError::Unauthorized => true,
        ApiError::Status { status, .. } => (400..500).contains(status),
        ApiError::Rejected { .. } | ApiError::MissingData => true,
        _ => false,
    }
}
