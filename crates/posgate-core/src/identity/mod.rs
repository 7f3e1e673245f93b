//! Anonymous identity bootstrap
//!
//! [`IdentityBootstrap::ensure_anonymous_identity`] resolves once the
//! identity provider reports a signed-in principal, signing in anonymously
//! if nobody is. The first principal is cached for the life of the
//! bootstrap, so later calls never touch the network.

mod firebase;

pub use firebase::{FirebaseAuth, FirebaseConfig, DEFAULT_IDENTITY_ENDPOINT};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info};

/// Identity bootstrap errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Identity HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed identity provider response: {0}")]
    MalformedResponse(String),

    #[error("Identity state listener closed before a principal was reported")]
    ListenerClosed,
}

/// Signed-in identity handle
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    uid: String,
    id_token: Option<String>,
    anonymous: bool,
}

impl Principal {
    /// Create an anonymous principal
    pub fn anonymous(uid: impl Into<String>, id_token: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            id_token,
            anonymous: true,
        }
    }

    /// Stable unique identifier
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Bearer token for authenticated calls, if the provider issued one
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("uid", &self.uid)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("anonymous", &self.anonymous)
            .finish()
    }
}

/// Backend identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Principal currently signed in, if any
    fn current_principal(&self) -> Option<Principal>;

    /// Identity state changes; the current value is the signed-in principal
    fn subscribe(&self) -> watch::Receiver<Option<Principal>>;

    /// Start an anonymous sign-in. Success is reported through
    /// [`IdentityProvider::subscribe`], not through the return value.
    async fn sign_in_anonymously(&self) -> Result<(), IdentityError>;
}

/// Resolves and caches the anonymous principal
pub struct IdentityBootstrap<P: IdentityProvider + ?Sized> {
    provider: Arc<P>,
    principal: OnceCell<Principal>,
}

impl<P: IdentityProvider + ?Sized> IdentityBootstrap<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            principal: OnceCell::new(),
        }
    }

    /// Principal resolved so far, without waiting
    pub fn cached(&self) -> Option<&Principal> {
        self.principal.get()
    }

    /// Return the signed-in principal, signing in anonymously if needed
    pub async fn ensure_anonymous_identity(&self) -> Result<Principal, IdentityError> {
        let principal = self
            .principal
            .get_or_try_init(|| async {
                if let Some(current) = self.provider.current_principal() {
                    debug!(uid = %current.uid(), "Reusing signed-in principal");
                    return Ok(current);
                }
                let principal = self.sign_in_and_wait().await?;
                info!(uid = %principal.uid(), "Anonymous identity established");
                Ok::<_, IdentityError>(principal)
            })
            .await?;
        Ok(principal.clone())
    }

    async fn sign_in_and_wait(&self) -> Result<Principal, IdentityError> {
        let mut changes = self.provider.subscribe();
        let sign_in = self.provider.sign_in_anonymously();
        tokio::pin!(sign_in);
        let mut sign_in_done = false;

        loop {
            tokio::select! {
                biased;
                principal = next_principal(&mut changes) => return principal,
                result = &mut sign_in, if !sign_in_done => {
                    result?;
                    sign_in_done = true;
                    debug!("Anonymous sign-in accepted, waiting for identity state");
                }
            }
        }
    }
}

/// Wait until the watched state holds a principal
async fn next_principal(
    changes: &mut watch::Receiver<Option<Principal>>,
) -> Result<Principal, IdentityError> {
    loop {
        if let Some(principal) = changes.borrow_and_update().clone() {
            return Ok(principal);
        }
        changes
            .changed()
            .await
            .map_err(|_| IdentityError::ListenerClosed)?;
    }
}
