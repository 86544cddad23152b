use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::{
    api::{ApiClient, ApiError, ResponseEnvelope},
    models::{Credentials, Registration, User},
};

/// `POST /users/login` answers with the token at the top level rather than
/// inside the usual envelope.
#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    data: Option<User>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    pub async fn login(&self, credentials: &Credentials) -> Result<(String, Option<User>), ApiError> {
        let builder = self.request(Method::POST, "/users/login").json(credentials);
        let (status, body) = self.send_raw(builder).await?;
        login_from_response(status, &body)
    }

    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, "/users/register").json(registration);
        let (status, envelope) = self.send(builder).await?;
        envelope.check(status)
    }

    /// `GET /users/me` for the stored token.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let (status, body) = self.send_raw(self.request(Method::GET, "/users/me")).await?;
        user_from_response(status, &body)
    }
}

fn login_from_response(status: StatusCode, body: &[u8]) -> Result<(String, Option<User>), ApiError> {
    let response: LoginResponse = serde_json::from_slice(body).unwrap_or_default();
    let message = response
        .message
        .clone()
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| "Login failed".to_string());

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    match response.token.filter(|token| !token.is_empty()) {
        Some(token) => Ok((token, response.data)),
        None => Err(ApiError::Rejected {
            status: Some(status.as_u16()),
            message,
        }),
    }
}

fn user_from_response(status: StatusCode, body: &[u8]) -> Result<User, ApiError> {
    let envelope = if status.is_success() {
        ResponseEnvelope::parse(body)?
    } else {
        ResponseEnvelope::parse(body).unwrap_or_default()
    };
    envelope.check(status)?;

    // Either `{ data: user }` or the bare user object.
    if let Some(data) = envelope.data.clone() {
        if let Ok(user) = serde_json::from_value::<User>(data) {
            if !user.username.is_empty() {
                return Ok(user);
            }
        }
    }
    let user: User = serde_json::from_slice(body)?;
    if user.username.is_empty() {
        return Err(ApiError::MissingData);
    }
    Ok(user)
}
