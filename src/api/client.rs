use std::{sync::Arc, time::Duration};

use reqwest::{multipart::Form, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::auth::TokenStore;

use super::{envelope::ResponseEnvelope, ApiError};

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_warn};

/// Header carrying the client-generated key that makes a create retry-safe.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP client for the plant backend.
///
/// Every request is resolved against `{base_url}/api` and, when a token is
/// stored, carries `Authorization: Bearer <token>`. The token is read at send
/// time, so signing in or out takes effect on the next call without rebuilding
/// the client. Errors are handed back to the caller unchanged.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        tokens: TokenStore,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("plantcare/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Image references come back server-relative (`/uploads/x.jpg`).
    pub fn asset_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            format!("{}{}", self.base_url, reference)
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        log_debug!("{} {}", method, path);
        let builder = self.http.request(method, self.endpoint(path));
        match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn send_raw(
        &self,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }

    /// Sends and returns the status with the parsed envelope. Non-2xx bodies
    /// that are not JSON still produce an envelope so the status is not lost.
    pub(crate) async fn send(
        &self,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, ResponseEnvelope), ApiError> {
        let (status, body) = self.send_raw(builder).await?;

        if status.is_success() {
            Ok((status, ResponseEnvelope::parse(&body)?))
        } else {
            log_warn!("request failed with {status}");
            Ok((status, ResponseEnvelope::parse(&body).unwrap_or_default()))
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let (status, envelope) = self.send(self.request(Method::GET, path)).await?;
        envelope.into_data(status)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (status, envelope) = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        envelope.into_data(status)
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (status, envelope) = self
            .send(self.request(Method::PUT, path).json(body))
            .await?;
        envelope.into_optional_data(status)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let (status, envelope) = self.send(self.request(Method::DELETE, path)).await?;
        envelope.check(status)
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: Form,
    ) -> Result<(StatusCode, ResponseEnvelope), ApiError> {
        self.send(self.request(Method::POST, path).multipart(form))
            .await
    }
}
