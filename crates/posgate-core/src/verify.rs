//! Verification contract for `POST /verify-pin`

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GateError, Result};

/// Result of one verification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Server answered 2xx with `{"ok": true}`
    Accepted,
    /// Any other readable response, with the server's `error` message if it
    /// sent a non-empty one
    Rejected { reason: Option<String> },
    /// The request failed or the response could not be read
    TransportError,
}

impl VerificationOutcome {
    /// Classify a response. The body is parsed leniently: anything that is
    /// not a JSON object counts as `{}`.
    pub fn from_response(success: bool, body: &[u8]) -> Self {
        let response = VerifyPinResponse::parse_lenient(body);
        if success && response.ok {
            Self::Accepted
        } else {
            Self::Rejected {
                reason: response.error.filter(|e| !e.is_empty()),
            }
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Request body
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPinRequest<'a> {
    pub pin: &'a str,
}

/// Response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPinResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyPinResponse {
    pub fn accepted() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }

    /// Read `ok` and `error` field by field so that a wrongly typed or
    /// missing field never fails the whole body. Only a literal `true`
    /// counts as ok. Only a string `error` is kept as the rejection reason;
    /// any other type falls back to the default message.
    pub fn parse_lenient(body: &[u8]) -> Self {
        let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        Self {
            ok: value.get("ok").and_then(Value::as_bool) == Some(true),
            error: value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }
}

/// Something that can check a PIN
#[async_trait]
pub trait PinVerifier: Send + Sync + 'static {
    /// Verify a complete PIN. Failures are folded into
    /// [`VerificationOutcome::TransportError`]; this never errors.
    async fn verify(&self, pin: &str) -> VerificationOutcome;
}

/// Verifier that talks to the `/verify-pin` endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpPinVerifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpPinVerifier {
    /// Create a verifier for `path` on the server at `base_url`
    pub fn new(base_url: &str, path: &str) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Self::with_client(client, base_url, path)
    }

    /// Create a verifier reusing an existing client
    pub fn with_client(client: reqwest::Client, base_url: &str, path: &str) -> Result<Self> {
        let invalid = |reason: String| GateError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        let endpoint = base.join(path).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    /// Full URL requests are sent to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PinVerifier for HttpPinVerifier {
    async fn verify(&self, pin: &str) -> VerificationOutcome {
        debug!(endpoint = %self.endpoint, "Sending PIN verification request");

        let response = match self
            .client
            .post(self.endpoint.clone())
            .json(&VerifyPinRequest { pin })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("PIN verification request failed: {}", e);
                return VerificationOutcome::TransportError;
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read PIN verification response: {}", e);
                return VerificationOutcome::TransportError;
            }
        };

        let outcome = VerificationOutcome::from_response(status.is_success(), &body);
        debug!(%status, accepted = outcome.is_accepted(), "PIN verification response");
        outcome
    }
}
