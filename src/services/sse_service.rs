use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    state::{SharedState, game::PlayerId},
};

const EVENT_HANDSHAKE: &str = "handshake";

/// What a connected client wants to see.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Scope to follow.
    pub scope: String,
    /// Identity whose direct notifications are included.
    pub player_id: Option<PlayerId>,
}

impl Subscription {
    fn accepts(&self, event: &ServerEvent) -> bool {
        event.is_visible_to(&self.scope, self.player_id.as_deref())
    }
}

/// Subscribe to the notifications of an existing session.
pub fn subscribe(
    state: &SharedState,
    subscription: &Subscription,
) -> Result<broadcast::Receiver<ServerEvent>, ServiceError> {
    state.session(&subscription.scope)?;
    Ok(state.events().subscribe())
}

/// Handshake sent as the first event of every stream.
pub fn handshake(subscription: &Subscription) -> Event {
    let payload = Handshake {
        scope: subscription.scope.clone(),
        player_id: subscription.player_id.clone(),
        message: format!("following `{}`", subscription.scope),
    };
    Event::default()
        .event(EVENT_HANDSHAKE)
        .json_data(&payload)
        .unwrap_or_else(|err| {
            warn!(scope = %subscription.scope, error = %err, "failed to encode handshake");
            Event::default()
                .event(EVENT_HANDSHAKE)
                .data(payload.message.clone())
        })
}

/// Convert a broadcast receiver into an SSE response, forwarding the events
/// the subscription accepts until the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    subscription: Subscription,
    first: Event,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(first)).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if !subscription.accepts(&payload) {
                                continue;
                            }
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(scope = %subscription.scope, skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!(
            scope = %subscription.scope,
            player = ?subscription.player_id,
            "SSE stream disconnected"
        );
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
