use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use super::ApiError;

const ENABLE_LOGS: bool = true;
use crate::log_warn;

/// The `{ status, message, data }` wrapper every plant endpoint answers with.
///
/// A reply only counts as a success when the HTTP status is 2xx, the envelope
/// status (if the server sent one) is a success, and the payload is present.
/// A parseable error body is never mistaken for data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// What the envelope's `status` field says, when it says anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStatus {
    Absent,
    Success(Option<u16>),
    Failure(Option<u16>),
}

impl ResponseEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }

    pub fn envelope_status(&self) -> EnvelopeStatus {
        match &self.status {
            None | Some(Value::Null) => EnvelopeStatus::Absent,
            Some(Value::Number(number)) => classify_code(number.as_u64()),
            Some(Value::Bool(true)) => EnvelopeStatus::Success(None),
            Some(Value::Bool(false)) => EnvelopeStatus::Failure(None),
            Some(Value::String(text)) => {
                let text = text.trim();
                if let Ok(code) = text.parse::<u64>() {
                    return classify_code(Some(code));
                }
                match text.to_ascii_lowercase().as_str() {
                    "ok" | "success" | "succeeded" | "created" => EnvelopeStatus::Success(None),
                    _ => EnvelopeStatus::Failure(None),
                }
            }
            Some(_) => EnvelopeStatus::Failure(None),
        }
    }

    /// Fails unless HTTP and envelope both report success.
    pub fn check(&self, http: StatusCode) -> Result<(), ApiError> {
        if http == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !http.is_success() {
            return Err(ApiError::Status {
                status: http.as_u16(),
                message: self.message_or(http.canonical_reason().unwrap_or("request failed")),
            });
        }
        match self.envelope_status() {
            EnvelopeStatus::Failure(status) => Err(ApiError::Rejected {
                status,
                message: self.message_or("request was rejected"),
            }),
            EnvelopeStatus::Absent | EnvelopeStatus::Success(_) => Ok(()),
        }
    }

    /// Checked payload, decoded into `T`.
    pub fn into_data<T: DeserializeOwned>(self, http: StatusCode) -> Result<T, ApiError> {
        self.check(http)?;
        match self.data {
            None | Some(Value::Null) => Err(ApiError::MissingData),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// Checked payload for endpoints where the body may legitimately be empty.
    pub fn into_optional_data<T: DeserializeOwned>(
        self,
        http: StatusCode,
    ) -> Result<Option<T>, ApiError> {
        self.check(http)?;
        match self.data {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => Ok(Some(data)),
                Err(err) => {
                    log_warn!("ignoring undecodable payload: {err}");
                    Ok(None)
                }
            },
        }
    }

    /// Like [`into_optional_data`](Self::into_optional_data), but the envelope
    /// must state success itself. A body without a `status` is rejected with
    /// the server's message, or `fallback` when it sent none.
    pub fn into_confirmed_data<T: DeserializeOwned>(
        self,
        http: StatusCode,
        fallback: &str,
    ) -> Result<Option<T>, ApiError> {
        self.check(http)?;
        if self.envelope_status() == EnvelopeStatus::Absent {
            return Err(ApiError::Rejected {
                status: None,
                message: self.message_or(fallback),
            });
        }
        self.into_optional_data(http)
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

fn classify_code(code: Option<u64>) -> EnvelopeStatus {
    match code.and_then(|code| u16::try_from(code).ok()) {
        Some(code) if (200..300).contains(&code) => EnvelopeStatus::Success(Some(code)),
        other => EnvelopeStatus::Failure(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> ResponseEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn error_body_with_data_is_not_success() {
        let env = envelope(json!({"status": 500, "message": "model offline", "data": {"name": "x"}}));
        let err = env.into_data::<Value>(StatusCode::OK).unwrap_err();
        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "model offline");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn http_failure_wins_over_body() {
        let env = envelope(json!({"status": 200, "data": {}}));
        let err = env.check(StatusCode::BAD_GATEWAY).unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.is_retryable());
    }

    #[test]
    fn unauthorized_is_distinct() {
        let err = ResponseEnvelope::default()
            .check(StatusCode::UNAUTHORIZED)
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn missing_data_is_an_error() {
        let env = envelope(json!({"status": 200, "message": "ok"}));
        assert!(matches!(
            env.into_data::<Value>(StatusCode::OK),
            Err(ApiError::MissingData)
        ));
    }

    #[test]
    fn optional_data_allows_empty_payload() {
        let env = envelope(json!({"status": "200"}));
        let data: Option<Value> = env.into_optional_data(StatusCode::OK).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn confirmed_data_needs_an_explicit_status() {
        let env = ResponseEnvelope::parse(br#"{"message": "Gemini quota exceeded"}"#).unwrap();
        match env.into_confirmed_data::<Value>(StatusCode::OK, "upload not confirmed") {
            Err(ApiError::Rejected { status, message }) => {
                assert_eq!(status, None);
                assert_eq!(message, "Gemini quota exceeded");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = ResponseEnvelope::default()
            .into_confirmed_data::<Value>(StatusCode::OK, "upload not confirmed")
            .unwrap_err();
        assert_eq!(err.to_string(), "upload not confirmed");

        let ok = envelope(json!({"status": 200, "data": {"id": 1}}))
            .into_confirmed_data::<Value>(StatusCode::OK, "upload not confirmed")
            .unwrap();
        assert_eq!(ok, Some(json!({"id": 1})));
    }

    #[test]
    fn undecodable_optional_payload_is_dropped() {
        let env = envelope(json!({"status": 200, "data": "not a number"}));
        let data: Option<u32> = env.into_optional_data(StatusCode::OK).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn textual_statuses_are_understood() {
        assert_eq!(
            envelope(json!({"status": "success"})).envelope_status(),
            EnvelopeStatus::Success(None)
        );
        assert_eq!(
            envelope(json!({"status": "error"})).envelope_status(),
            EnvelopeStatus::Failure(None)
        );
        assert_eq!(envelope(json!({})).envelope_status(), EnvelopeStatus::Absent);
    }

    #[test]
    fn empty_body_parses_to_default() {
        let env = ResponseEnvelope::parse(b"  ").unwrap();
        assert_eq!(env.envelope_status(), EnvelopeStatus::Absent);
        assert!(ResponseEnvelope::parse(b"<html>").is_err());
    }
}
