//! Every exchange call ends in exactly one of two shapes: the expected payload or
//! the exchange's error envelope. Anything else is a protocol error.

use {
    crate::error::ExchangeError,
    serde::{Deserialize, de::DeserializeOwned},
    std::{collections::BTreeMap, fmt},
};

/// The exchange's error envelope, normalised.
///
/// On the wire `reason` is either a plain string or a map of field names to one or
/// more messages (`{"__all__": ["..."]}`). Both forms land in `reasons`; the plain
/// string is stored under [`ApiError::GENERAL`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawApiError")]
pub struct ApiError {
    pub message: String,
    pub status: Option<String>,
    pub code: Option<String>,
    pub reasons: BTreeMap<String, Vec<String>>,
}

impl ApiError {
    pub const GENERAL: &'static str = "__all__";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some("error".to_string()),
            code: None,
            reasons: BTreeMap::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawApiError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<RawReason>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReason {
    Text(String),
    Fields(BTreeMap<String, OneOrMany>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<RawApiError> for ApiError {
    type Error = String;

    fn try_from(raw: RawApiError) -> Result<Self, Self::Error> {
        if raw.error.is_none() && raw.status.is_none() && raw.reason.is_none() {
            return Err("not an error envelope".to_string());
        }
        // A success payload that happens to carry a `status` is not an error.
        if raw.error.is_none()
            && raw.reason.is_none()
            && !raw.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("error"))
        {
            return Err("status is not an error".to_string());
        }

        let reasons: BTreeMap<String, Vec<String>> = match raw.reason {
            None => BTreeMap::new(),
            Some(RawReason::Text(text)) => BTreeMap::from([(Self::GENERAL.to_string(), vec![text])]),
            Some(RawReason::Fields(fields)) => fields
                .into_iter()
                .map(|(field, messages)| {
                    let messages = match messages {
                        OneOrMany::One(m) => vec![m],
                        OneOrMany::Many(ms) => ms,
                    };
                    (field, messages)
                })
                .collect(),
        };

        let joined_reasons = reasons
            .iter()
            .flat_map(|(field, messages)| {
                messages.iter().map(move |m| {
                    if field == Self::GENERAL {
                        m.clone()
                    } else {
                        format!("{}: {}", field, m)
                    }
                })
            })
            .collect::<Vec<_>>()
            .join("; ");

        let message = raw
            .error
            .filter(|e| !e.trim().is_empty())
            .or_else(|| (!joined_reasons.is_empty()).then_some(joined_reasons))
            .or_else(|| raw.status.clone())
            .unwrap_or_else(|| "unknown error".to_string());

        Ok(Self {
            message,
            status: raw.status,
            code: raw.code,
            reasons,
        })
    }
}

/// Outcome of a call that reached the exchange and got a well-formed answer.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Success(T),
    Error(ApiError),
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Decodes the expected payload first, then the error envelope.
    pub fn decode(body: &str) -> Result<Self, ExchangeError> {
        let payload_err = match serde_json::from_str::<T>(body) {
            Ok(payload) => return Ok(Self::Success(payload)),
            Err(e) => e,
        };
        match serde_json::from_str::<ApiError>(body) {
            Ok(api_error) => Ok(Self::Error(api_error)),
            Err(_) => Err(ExchangeError::protocol(
                format!("unexpected response shape: {}", payload_err),
                body,
            )),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            Self::Success(payload) => ApiResponse::Success(f(payload)),
            Self::Error(e) => ApiResponse::Error(e),
        }
    }

    /// Turns the envelope into [`ExchangeError::Business`].
    pub fn into_result(self) -> Result<T, ExchangeError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Error(e) => Err(ExchangeError::Business(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::exchange::wire::OhlcEnvelope;

    #[test]
    fn success_payload_wins() {
        let body = r#"{"data": {"pair": "BTC/USD", "ohlc": []}}"#;
        let response = ApiResponse::<OhlcEnvelope>::decode(body).unwrap();
        assert!(response.is_success());
    }

    #[test]
    fn plain_reason_is_normalised() {
        let body = r#"{"status": "error", "reason": "Invalid nonce", "code": "API0004"}"#;
        let ApiResponse::Error(err) = ApiResponse::<OhlcEnvelope>::decode(body).unwrap() else {
            panic!("expected error envelope");
        };
        assert_eq!(err.message, "Invalid nonce");
        assert_eq!(err.code.as_deref(), Some("API0004"));
        assert_eq!(err.reasons[ApiError::GENERAL], vec!["Invalid nonce".to_string()]);
        assert_eq!(err.to_string(), "Invalid nonce [API0004]");
    }

    #[test]
    fn field_reasons_accept_one_or_many() {
        let body = r#"{"status": "error", "reason": {"__all__": ["Too many requests"], "amount": "Required"}}"#;
        let ApiResponse::Error(err) = ApiResponse::<OhlcEnvelope>::decode(body).unwrap() else {
            panic!("expected error envelope");
        };
        assert_eq!(err.reasons.len(), 2);
        assert_eq!(err.message, "Too many requests; amount: Required");
    }

    #[test]
    fn bare_error_field_is_enough() {
        let body = r#"{"error": "Missing key, signature and nonce parameters"}"#;
        let response = ApiResponse::<OhlcEnvelope>::decode(body).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(err.is_business());
    }

    #[test]
    fn unknown_shapes_are_protocol_errors() {
        for body in ["<html>502</html>", r#"{"foo": 1}"#, r#"{"status": "ok"}"#, ""] {
            let err = ApiResponse::<OhlcEnvelope>::decode(body).unwrap_err();
            assert!(matches!(err, ExchangeError::Protocol { .. }), "{}", body);
        }
    }

    #[test]
    fn map_keeps_the_error_branch() {
        let response: ApiResponse<u32> = ApiResponse::Error(ApiError::new("nope"));
        assert_eq!(response.map(|v| v + 1), ApiResponse::Error(ApiError::new("nope")));
    }
}
