//! HMAC-SHA256 request signing for private endpoints.

use {
    crate::{config::EXCHANGE, error::ExchangeError},
    hmac::{Hmac, Mac},
    sha2::Sha256,
    std::fmt,
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Everything that goes into one signature.
#[derive(Debug, Clone)]
pub struct SigningInput<'a> {
    pub method: &'a str,
    /// Host only, e.g. `www.bitstamp.net`.
    pub host: &'a str,
    /// Absolute path including the API prefix, e.g. `/api/v2/buy/btcusd/`.
    pub path: &'a str,
    /// Raw query without the leading `?`; empty when there is none.
    pub query: &'a str,
    /// Form body; empty when the request has no body.
    pub body: &'a str,
    pub nonce: &'a str,
    /// Unix milliseconds.
    pub timestamp_ms: i64,
}

impl SigningInput<'_> {
    /// Content type is only part of the message when a body is sent.
    pub fn content_type(&self) -> &'static str {
        if self.body.is_empty() {
            ""
        } else {
            EXCHANGE.auth.form_content_type
        }
    }
}

/// `PREFIX key METHOD host path query content-type nonce timestamp version body`,
/// concatenated without separators except the space after the prefix.
pub fn canonical_message(api_key: &str, input: &SigningInput) -> String {
    format!(
        "{} {}{}{}{}{}{}{}{}{}{}",
        EXCHANGE.auth.prefix,
        api_key,
        input.method.to_uppercase(),
        input.host,
        input.path,
        input.query,
        input.content_type(),
        input.nonce,
        input.timestamp_ms,
        EXCHANGE.auth.version,
        input.body,
    )
}

/// Uppercase hex HMAC-SHA256 of the canonical message, keyed with the secret.
pub fn sign(credentials: &Credentials, input: &SigningInput) -> Result<String, ExchangeError> {
    let message = canonical_message(&credentials.key, input);
    let mut mac = HmacSha256::new_from_slice(credentials.secret.as_bytes())
        .map_err(|e| ExchangeError::Signing(format!("invalid secret: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}

/// Fresh lowercase hyphenated UUID v4.
pub fn new_nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: &str = "f93c979d-b00d-43a9-9b9c-fd4cd9547fa6";

    fn buy_input<'a>() -> SigningInput<'a> {
        SigningInput {
            method: "post",
            host: "www.bitstamp.net",
            path: "/api/v2/buy/btcusd/",
            query: "",
            body: "amount=0.5&price=30000.00",
            nonce: NONCE,
            timestamp_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn message_layout_with_body() {
        assert_eq!(
            canonical_message("abc123", &buy_input()),
            "BITSTAMP abc123POSTwww.bitstamp.net/api/v2/buy/btcusd/\
             application/x-www-form-urlencodedf93c979d-b00d-43a9-9b9c-fd4cd9547fa6\
             1700000000000v2amount=0.5&price=30000.00"
        );
    }

    #[test]
    fn known_signature_with_body() {
        let credentials = Credentials::new("abc123", "secret");
        assert_eq!(
            sign(&credentials, &buy_input()).unwrap(),
            "6B2A0FE902D5C76EEE2EF9B38E119CFA9D3DD91D9777CC7BEC241F06D47F1BDD"
        );
    }

    #[test]
    fn every_field_changes_the_signature() {
        const KNOWN: &str = "6B2A0FE902D5C76EEE2EF9B38E119CFA9D3DD91D9777CC7BEC241F06D47F1BDD";
        let credentials = Credentials::new("abc123", "secret");
        let base = buy_input();

        let variants = [
            ("method", SigningInput { method: "get", ..base.clone() }),
            ("host", SigningInput { host: "api.bitstamp.net", ..base.clone() }),
            ("path", SigningInput { path: "/api/v2/sell/btcusd/", ..base.clone() }),
            ("query", SigningInput { query: "a=1", ..base.clone() }),
            ("body", SigningInput { body: "amount=0.6&price=30000.00", ..base.clone() }),
            // an empty body also drops the content type from the message
            ("content type", SigningInput { body: "", ..base.clone() }),
            ("nonce", SigningInput { nonce: "f93c979d-b00d-43a9-9b9c-fd4cd9547fa7", ..base.clone() }),
            ("timestamp", SigningInput { timestamp_ms: base.timestamp_ms + 1, ..base.clone() }),
        ];
        for (field, input) in &variants {
            assert_ne!(sign(&credentials, input).unwrap(), KNOWN, "{} ignored", field);
        }

        let other_key = Credentials::new("abc124", "secret");
        assert_ne!(sign(&other_key, &base).unwrap(), KNOWN, "key ignored");
        let other_secret = Credentials::new("abc123", "secreT");
        assert_ne!(sign(&other_secret, &base).unwrap(), KNOWN, "secret ignored");

        // and the unchanged tuple is stable
        assert_eq!(sign(&credentials, &base).unwrap(), KNOWN);
    }

    #[test]
    fn bodyless_request_omits_content_type() {
        let input = SigningInput {
            path: "/api/v2/fees/trading/",
            body: "",
            ..buy_input()
        };
        assert_eq!(input.content_type(), "");
        let credentials = Credentials::new("abc123", "secret");
        assert_eq!(
            sign(&credentials, &input).unwrap(),
            "0947EC635C7E2B3D1029BF6EEF9825FF8E670268AC9B677A860ACA1433E113EF"
        );
    }

    #[test]
    fn nonces_are_unique_lowercase_uuids() {
        let a = new_nonce();
        let b = new_nonce();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(a, a.to_lowercase());
    }

    #[test]
    fn debug_hides_secret() {
        let credentials = Credentials::new("key", "hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
