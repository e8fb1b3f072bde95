//! Server-Sent Events stream of session transitions.
//!
//! Open pages subscribe here and reload when the session changes, so a page
//! rendered while signed in cannot linger after a sign-out in another tab.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Serialize;

use skillswap_core::SessionState;

use crate::middleware::auth::AuthClient;

/// Payload of a `session` event.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct SessionEvent {
    signed_in: bool,
}

fn event_for(state: &SessionState) -> Event {
    let payload = SessionEvent {
        signed_in: state.is_signed_in(),
    };
    let json = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
    Event::default().event("session").data(json)
}

/// Stream this client's session transitions.
///
/// The subscription lives as long as the stream; it is dropped when the
/// client disconnects.
pub async fn session_events(
    auth: AuthClient,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = auth.subscribe();
    let client_id = auth.client_id();
    tracing::debug!(%client_id, "Session event stream opened");

    let stream = async_stream::stream! {
        while let Some(state) = subscription.recv().await {
            yield Ok(event_for(&state));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_string(&SessionEvent { signed_in: true });
        assert_eq!(json.ok().as_deref(), Some(r#"{"signed_in":true}"#));
    }
}
