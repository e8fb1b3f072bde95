//! Integration tests for SkillSwap.
//!
//! Each test starts the real application on an ephemeral port with the
//! in-memory identity provider and drives it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p skillswap-integration-tests
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;

use reqwest::{Client, Response, redirect};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use skillswap_web::config::WebConfig;
use skillswap_web::identity::{IdentityBackend, MemoryProvider};
use skillswap_web::state::AppState;

/// Password that satisfies the signup strength rule.
pub const STRONG_PASSWORD: &str = "Secret1";

/// A running application.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start with development defaults.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start after adjusting the development configuration.
    pub async fn start_with(configure: impl FnOnce(&mut WebConfig)) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let base_url = format!("http://{addr}");

        let mut config = WebConfig::development(base_url.clone());
        configure(&mut config);
        let state = AppState::new(config).expect("Failed to build application state");

        let app = skillswap_web::app(state.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A fresh browser: own cookie jar, redirects not followed.
    #[must_use]
    pub fn browser(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// The in-memory provider behind the server.
    #[must_use]
    pub fn memory_provider(&self) -> &MemoryProvider {
        match self.state.identity() {
            IdentityBackend::Memory(provider) => provider,
            IdentityBackend::Firebase(_) => panic!("test server uses the memory backend"),
        }
    }

    pub async fn get(&self, browser: &Client, path: &str) -> Response {
        browser
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, browser: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        browser
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Create an account; the browser ends up signed in.
    pub async fn sign_up(&self, browser: &Client, name: &str, email: &str) -> Response {
        self.post(
            browser,
            "/signup",
            &[
                ("name", name),
                ("photo_url", ""),
                ("email", email),
                ("password", STRONG_PASSWORD),
            ],
        )
        .await
    }

    /// Log in with `intent` (the nonce from a guard redirect), if any.
    pub async fn log_in(&self, browser: &Client, email: &str, intent: Option<&str>) -> Response {
        let mut form = vec![("email", email), ("password", STRONG_PASSWORD)];
        if let Some(nonce) = intent {
            form.push(("intent", nonce));
        }
        self.post(browser, "/login", &form).await
    }

    /// Create an account from a throwaway browser, leaving it signed out.
    pub async fn register(&self, email: &str) {
        let browser = self.browser();
        let response = self.sign_up(&browser, "", email).await;
        assert_eq!(response.status(), 303, "signup for {email} failed");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get("location")
        .expect("response is not a redirect")
        .to_str()
        .expect("non-ASCII location")
        .to_string()
}

/// The intent nonce carried by a `/login?intent=` redirect.
#[must_use]
pub fn intent_nonce(login_location: &str) -> String {
    login_location
        .strip_prefix("/login?intent=")
        .expect("not a login redirect with intent")
        .to_string()
}

/// Response body as text.
pub async fn body(response: Response) -> String {
    response.text().await.expect("Failed to read body")
}
