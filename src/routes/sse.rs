use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::{
    error::AppError,
    services::sse_service::{self, Subscription},
    state::{SharedState, game::PlayerId},
};

/// Optional identity for direct notifications.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Player whose private notifications should be included.
    pub player_id: Option<PlayerId>,
}

#[utoipa::path(
    get,
    path = "/games/{scope}/events",
    tag = "sse",
    params(
        ("scope" = String, Path, description = "Channel or group the game lives in"),
        EventsQuery
    ),
    responses(
        (status = 200, description = "Notification stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "No game in the scope")
    )
)]
/// Stream channel notifications of a scope, plus the caller's direct ones.
pub async fn game_events(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let subscription = Subscription {
        scope,
        player_id: query.player_id.filter(|id| !id.is_empty()),
    };
    let receiver = sse_service::subscribe(&state, &subscription)?;
    info!(
        scope = %subscription.scope,
        player = ?subscription.player_id,
        "New SSE connection"
    );
    let first = sse_service::handshake(&subscription);
    Ok(sse_service::to_sse_stream(receiver, subscription, first))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/games/{scope}/events", get(game_events))
}
