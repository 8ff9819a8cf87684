//! Error taxonomy shared by the exchange client, the indicator engine and the scheduler.

use thiserror::Error;

use crate::data::exchange::ApiError;

/// Failures talking to the exchange.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Network failure or timeout.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body matched neither the success payload nor the error envelope.
    #[error("Protocol error: {reason} (body: {body})")]
    Protocol { reason: String, body: String },

    /// Well-formed error envelope returned by the exchange.
    #[error("Exchange rejected request: {0}")]
    Business(ApiError),

    /// Request rejected locally before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl ExchangeError {
    pub fn is_business(&self) -> bool {
        matches!(self, Self::Business(_))
    }

    /// Caps the body quoted in protocol errors.
    pub(crate) fn protocol(reason: impl Into<String>, body: &str) -> Self {
        const MAX_BODY: usize = 256;
        let body = match body.char_indices().nth(MAX_BODY) {
            Some((idx, _)) => format!("{}…", &body[..idx]),
            None => body.to_string(),
        };
        Self::Protocol {
            reason: reason.into(),
            body,
        }
    }
}

/// Why an individual indicator could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("{indicator} needs {required} candles, got {available}")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        available: usize,
    },

    #[error("{indicator}: {reason}")]
    InvalidParameter {
        indicator: &'static str,
        reason: String,
    },

    #[error("{indicator}: decimal overflow")]
    Overflow { indicator: &'static str },
}

/// Reasons the scheduling loop gives up and the process exits with code 1.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Store unreachable for more than {waited_secs}s")]
    StoreUnreachable { waited_secs: u64 },

    #[error("{failures} consecutive cycles failed, last error: {last_error:#}")]
    TooManyFailures {
        failures: u32,
        last_error: anyhow::Error,
    },
}
