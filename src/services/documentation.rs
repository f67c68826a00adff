use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the MISALIGN game server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::game_events,
        crate::routes::game::create_game,
        crate::routes::game::game_status,
        crate::routes::game::delete_game,
        crate::routes::game::join_game,
        crate::routes::game::start_game,
        crate::routes::game::submit_choice,
        crate::routes::game::invoke_ability,
        crate::routes::game::force_resolve,
        crate::routes::player::submit_choice,
        crate::routes::player::invoke_ability,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::JoinRequest,
            crate::dto::game::PlayerRequest,
            crate::dto::game::ChoiceRequest,
            crate::dto::game::AbilityRequest,
            crate::dto::game::GameSummary,
            crate::dto::game::GameStatus,
            crate::dto::game::PlayerSummary,
            crate::dto::game::StandingSummary,
            crate::dto::game::RaceSummary,
            crate::dto::game::ActionResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::GameCreatedEvent,
            crate::dto::sse::PlayerJoinedEvent,
            crate::dto::sse::GameStartedEvent,
            crate::dto::sse::AbilityAssignedEvent,
            crate::dto::sse::RoundStartedEvent,
            crate::dto::sse::RoundGuideEvent,
            crate::dto::sse::ChoiceAcceptedEvent,
            crate::dto::sse::RoundResolvedEvent,
            crate::dto::sse::AbilityUsedEvent,
            crate::dto::sse::LockReportEvent,
            crate::dto::sse::ScanReportEvent,
            crate::dto::sse::SharedLogEvent,
            crate::dto::sse::MetaViewEvent,
            crate::dto::sse::GameFinishedEvent,
            crate::dto::sse::GameRemovedEvent,
            crate::state::game::Minigame,
            crate::state::game::Ability,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Commands addressed to a scope's game"),
        (name = "player", description = "Direct commands routed to the caller's running game"),
        (name = "sse", description = "Server-sent notification streams"),
    )
)]
pub struct ApiDoc;
