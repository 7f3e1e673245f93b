//! Firebase anonymous authentication over the Identity Toolkit REST API

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{IdentityError, IdentityProvider, Principal};

/// Identity Toolkit base URL
pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";

/// Web client configuration of the backend project.
///
/// These are public client identifiers, not secrets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
    /// Override for the Identity Toolkit host (emulators, tests)
    #[serde(default = "default_identity_endpoint")]
    pub identity_endpoint: String,
}

fn default_identity_endpoint() -> String {
    DEFAULT_IDENTITY_ENDPOINT.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Auth handle for one Firebase project
pub struct FirebaseAuth {
    config: FirebaseConfig,
    client: reqwest::Client,
    sign_up_url: Url,
    state: watch::Sender<Option<Principal>>,
}

impl FirebaseAuth {
    /// Set up auth for the configured project
    pub fn initialize(config: FirebaseConfig) -> Result<Self, IdentityError> {
        if config.api_key.trim().is_empty() {
            return Err(IdentityError::Provider("Firebase apiKey is empty".to_string()));
        }

        let mut sign_up_url = Url::parse(&config.identity_endpoint)
            .and_then(|base| base.join("/v1/accounts:signUp"))
            .map_err(|e| {
                IdentityError::Provider(format!(
                    "Invalid identity endpoint '{}': {}",
                    config.identity_endpoint, e
                ))
            })?;
        sign_up_url
            .query_pairs_mut()
            .append_pair("key", &config.api_key);

        let client = reqwest::Client::builder().build()?;
        let (state, _) = watch::channel(None);

        Ok(Self {
            config,
            client,
            sign_up_url,
            state,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    fn current_principal(&self) -> Option<Principal> {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.state.subscribe()
    }

    async fn sign_in_anonymously(&self) -> Result<(), IdentityError> {
        debug!(project = %self.config.project_id, "Requesting anonymous sign-in");

        let response = self
            .client
            .post(self.sign_up_url.clone())
            .json(&serde_json::json!({ "returnSecureToken": true }))
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            warn!("Anonymous sign-in rejected: {}", message);
            return Err(IdentityError::Provider(message));
        }

        let sign_up: SignUpResponse = serde_json::from_slice(&body)
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;
        debug!(expires_in = ?sign_up.expires_in, "Anonymous account created");

        self.state
            .send_replace(Some(Principal::anonymous(sign_up.local_id, sign_up.id_token)));
        Ok(())
    }
}
