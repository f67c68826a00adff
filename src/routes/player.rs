//! Scope-less commands, the equivalent of direct messages to the bot.

use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::game::{AbilityRequest, ActionResponse, ChoiceRequest},
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Direct command routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/choices", post(submit_choice))
        .route("/abilities", post(invoke_ability))
}

/// Submit a choice to the running game the caller plays in.
#[utoipa::path(
    post,
    path = "/choices",
    tag = "player",
    operation_id = "submit_direct_choice",
    request_body = ChoiceRequest,
    responses(
        (status = 200, description = "Choice recorded", body = ActionResponse),
        (status = 404, description = "Caller is not in a running game")
    )
)]
pub async fn submit_choice(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ChoiceRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        game_service::submit_direct_choice(&state, payload).await?,
    ))
}

/// Use the caller's ability in the running game they play in.
#[utoipa::path(
    post,
    path = "/abilities",
    tag = "player",
    operation_id = "invoke_direct_ability",
    request_body = AbilityRequest,
    responses(
        (status = 200, description = "Ability applied", body = ActionResponse),
        (status = 404, description = "Caller is not in a running game")
    )
)]
pub async fn invoke_ability(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AbilityRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        game_service::invoke_direct_ability(&state, payload).await?,
    ))
}
