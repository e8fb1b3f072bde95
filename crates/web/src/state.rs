//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::WebConfig;
use crate::identity::IdentityBackend;
use crate::identity::federated::GoogleOAuthClient;
use crate::middleware::session::SESSION_IDLE;
use crate::observer::SessionHub;

/// Timeout for calls to the identity provider and Google.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// identity provider, the per-client session observers and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    identity: IdentityBackend,
    sessions: SessionHub,
    google: Option<GoogleOAuthClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: WebConfig) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .user_agent(concat!("SkillSwap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let identity = IdentityBackend::from_config(&config.identity, http.clone());
        let google = config
            .google
            .as_ref()
            .map(|google| GoogleOAuthClient::new(google, &config.base_url, http));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                identity,
                sessions: SessionHub::new(SESSION_IDLE),
                google,
                config,
            }),
        })
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the identity provider.
    #[must_use]
    pub fn identity(&self) -> &IdentityBackend {
        &self.inner.identity
    }

    /// Get a reference to the per-client session observers.
    #[must_use]
    pub fn sessions(&self) -> &SessionHub {
        &self.inner.sessions
    }

    /// Google OAuth client, when federated login is configured.
    #[must_use]
    pub fn google(&self) -> Option<&GoogleOAuthClient> {
        self.inner.google.as_ref()
    }
}
