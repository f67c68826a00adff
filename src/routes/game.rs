use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dto::game::{
        AbilityRequest, ActionResponse, ChoiceRequest, CreateGameRequest, GameSummary,
        JoinRequest, PlayerRequest,
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes addressing one scope's session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/games/{scope}",
            post(create_game).get(game_status).delete(delete_game),
        )
        .route("/games/{scope}/join", post(join_game))
        .route("/games/{scope}/start", post(start_game))
        .route("/games/{scope}/choices", post(submit_choice))
        .route("/games/{scope}/abilities", post(invoke_ability))
        .route("/games/{scope}/resolve", post(force_resolve))
}

/// Open a lobby in the scope.
#[utoipa::path(
    post,
    path = "/games/{scope}",
    tag = "game",
    params(("scope" = String, Path, description = "Channel or group the game lives in")),
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Lobby opened", body = GameSummary),
        (status = 409, description = "A game already exists in the scope")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::create_game(&state, &scope, payload).await?;
    Ok(Json(summary))
}

/// Current status of the scope's game.
#[utoipa::path(
    get,
    path = "/games/{scope}",
    tag = "game",
    params(("scope" = String, Path, description = "Channel or group the game lives in")),
    responses(
        (status = 200, description = "Game status", body = GameSummary),
        (status = 404, description = "No game in the scope")
    )
)]
pub async fn game_status(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::game_status(&state, &scope).await?))
}

/// Close the scope's game.
#[utoipa::path(
    delete,
    path = "/games/{scope}",
    tag = "game",
    params(("scope" = String, Path, description = "Channel or group the game lives in")),
    request_body = PlayerRequest,
    responses(
        (status = 200, description = "Game removed", body = ActionResponse),
        (status = 403, description = "Only the host can close a running game")
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
    Valid(Json(payload)): Valid<Json<PlayerRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(game_service::delete_game(&state, &scope, payload).await?))
}

/// Join the lobby.
#[utoipa::path(
    post,
    path = "/games/{scope}/join",
    tag = "game",
    params(("scope" = String, Path, description = "Channel or group the game lives in")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Joined", body = GameSummary),
        (status = 409, description = "Lobby closed, full, or already joined")
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::join_game(&state, &scope, payload).await?))
}

/// Start the game; host only.
#[utoipa::path(
    post,
    path = "/games/{scope}/start",
    tag = "game",
    params(("scope" = String, Path, description = "Channel or group the game lives in")),
    request_body = PlayerRequest,
    responses(
        (status = 200, description = "Round 1 opened", body = GameSummary),
        (status = 403, description = "Requester is not the host"),
        (status = 409, description = "Already started or not enough players")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
    Valid(Json(payload)): Valid<Json<PlayerRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::start_game(&state, &scope, payload).await?))
}

/// Submit a choice for the current round.
#[utoipa::path(
    post,
    path = "/games/{scope}/choices",
    tag = "game",
    params(("scope" = String, Path, description = "Channel or group the game lives in")),
    request_body = ChoiceRequest,
    responses(
        (status = 200, description = "Choice recorded", body = ActionResponse),
        (status = 409, description = "No round in progress or wrong round")
    )
)]
pub async fn submit_choice(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
    Valid(Json(payload)): Valid<Json<ChoiceRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        game_service::submit_choice(&state, &scope, payload).await?,
    ))
}

/// Use the caller's ability.
#[utoipa::path(
    post,
    path = "/games/{scope}/abilities",
    tag = "game",
    params(("scope" = String, Path, description = "Channel or group the game lives in")),
    request_body = AbilityRequest,
    responses(
        (status = 200, description = "Ability applied", body = ActionResponse),
        (status = 400, description = "Missing target or value"),
        (status = 409, description = "Wrong ability, already used, or locked")
    )
)]
pub async fn invoke_ability(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
    Valid(Json(payload)): Valid<Json<AbilityRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        game_service::invoke_ability(&state, &scope, payload).await?,
    ))
}

/// Close the current round now; host only.
#[utoipa::path(
    post,
    path = "/games/{scope}/resolve",
    tag = "game",
    params(("scope" = String, Path, description = "Channel or group the game lives in")),
    request_body = PlayerRequest,
    responses(
        (status = 200, description = "Round resolved", body = GameSummary),
        (status = 403, description = "Requester is not the host"),
        (status = 409, description = "No round in progress")
    )
)]
pub async fn force_resolve(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
    Valid(Json(payload)): Valid<Json<PlayerRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(
        game_service::force_resolve(&state, &scope, payload).await?,
    ))
}
