use tracing::{debug, info};

use crate::{
    dto::game::{
        AbilityRequest, ActionResponse, ChoiceRequest, CreateGameRequest, GameSummary,
        JoinRequest, PlayerRequest,
    },
    error::ServiceError,
    services::{
        notifications::{self, Audience},
        round_scheduler,
    },
    state::{
        SessionHandle, SharedState,
        announcement::{Announcement, Outcome},
    },
};

/// Open a lobby in `scope` hosted by the requester.
pub async fn create_game(
    state: &SharedState,
    scope: &str,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    let handle = state.create_session(scope, &request.host_id)?;
    let summary = GameSummary::from(&*handle.lock().await);

    info!(scope = %scope, host = %request.host_id, "game created");
    dispatch(
        state,
        scope,
        &handle,
        Outcome::announce(Announcement::GameCreated {
            host_id: request.host_id,
        }),
    );
    Ok(summary)
}

/// Add the requester to the lobby of `scope`.
pub async fn join_game(
    state: &SharedState,
    scope: &str,
    request: JoinRequest,
) -> Result<GameSummary, ServiceError> {
    let handle = state.session(scope)?;
    let (outcome, summary) = {
        let mut session = handle.lock().await;
        let outcome = session.join(&request.player_id, &request.name)?;
        (outcome, GameSummary::from(&*session))
    };

    info!(
        scope = %scope,
        player = %request.player_id,
        count = summary.players.len(),
        "player joined"
    );
    dispatch(state, scope, &handle, outcome);
    Ok(summary)
}

/// Start the game in `scope`; host only.
pub async fn start_game(
    state: &SharedState,
    scope: &str,
    request: PlayerRequest,
) -> Result<GameSummary, ServiceError> {
    let handle = state.session(scope)?;
    let (outcome, summary) = {
        let mut session = handle.lock().await;
        let outcome = session.start(&request.player_id, &mut rand::rng())?;
        (outcome, GameSummary::from(&*session))
    };

    info!(
        scope = %scope,
        players = summary.players.len(),
        "game started"
    );
    dispatch(state, scope, &handle, outcome);
    Ok(summary)
}

/// Record a choice for the current round of `scope`.
pub async fn submit_choice(
    state: &SharedState,
    scope: &str,
    request: ChoiceRequest,
) -> Result<ActionResponse, ServiceError> {
    let handle = state.session(scope)?;
    submit_to(state, scope, &handle, request).await
}

/// Record a choice sent without a scope, routed to the player's running game.
pub async fn submit_direct_choice(
    state: &SharedState,
    request: ChoiceRequest,
) -> Result<ActionResponse, ServiceError> {
    let (scope, handle) = state.find_running_session_for(&request.player_id).await?;
    submit_to(state, &scope, &handle, request).await
}

/// Spend the requester's ability in `scope`.
pub async fn invoke_ability(
    state: &SharedState,
    scope: &str,
    request: AbilityRequest,
) -> Result<ActionResponse, ServiceError> {
    let handle = state.session(scope)?;
    invoke_on(state, scope, &handle, request).await
}

/// Spend an ability sent without a scope, routed to the player's running game.
pub async fn invoke_direct_ability(
    state: &SharedState,
    request: AbilityRequest,
) -> Result<ActionResponse, ServiceError> {
    let (scope, handle) = state.find_running_session_for(&request.player_id).await?;
    invoke_on(state, &scope, &handle, request).await
}

/// Close the current round of `scope` early; host only.
pub async fn force_resolve(
    state: &SharedState,
    scope: &str,
    request: PlayerRequest,
) -> Result<GameSummary, ServiceError> {
    let handle = state.session(scope)?;
    let (outcome, summary) = {
        let mut session = handle.lock().await;
        let round = session.round();
        let outcome = session.force_resolve(&request.player_id)?;
        info!(scope = %scope, round, "round closed by host");
        (outcome, GameSummary::from(&*session))
    };

    dispatch(state, scope, &handle, outcome);
    Ok(summary)
}

/// Status snapshot of `scope`.
pub async fn game_status(state: &SharedState, scope: &str) -> Result<GameSummary, ServiceError> {
    let handle = state.session(scope)?;
    let session = handle.lock().await;
    Ok(GameSummary::from(&*session))
}

/// Remove the session of `scope`: the host may do so at any time, anyone once the game is over.
pub async fn delete_game(
    state: &SharedState,
    scope: &str,
    request: PlayerRequest,
) -> Result<ActionResponse, ServiceError> {
    let handle = state.session(scope)?;
    {
        let session = handle.lock().await;
        if session.host_id() != request.player_id && !session.is_finished() {
            return Err(ServiceError::AuthorizationDenied(
                "only the host can close a game in progress".into(),
            ));
        }
    }

    if !state.remove_session(scope, &handle) {
        return Err(ServiceError::NotFound(format!("no game in `{scope}`")));
    }

    info!(scope = %scope, by = %request.player_id, "game removed");
    notifications::publish(state.events(), scope, &[Announcement::GameRemoved]);
    Ok(ActionResponse::new(format!("game in `{scope}` closed")))
}

/// Publish an outcome's announcements, then arm the deadline it asks for.
///
/// Must be called after the session lock is released.
pub fn dispatch(state: &SharedState, scope: &str, handle: &SessionHandle, outcome: Outcome) {
    debug!(
        scope = %scope,
        announcements = outcome.announcements.len(),
        armed_round = ?outcome.armed_round,
        "dispatching outcome"
    );
    notifications::publish(state.events(), scope, &outcome.announcements);

    if outcome
        .announcements
        .iter()
        .any(|announcement| matches!(announcement, Announcement::GameFinished { .. }))
    {
        info!(scope = %scope, "game finished");
    }

    if let Some(round) = outcome.armed_round {
        round_scheduler::arm(state.clone(), scope.to_string(), handle.clone(), round);
    }
}

async fn submit_to(
    state: &SharedState,
    scope: &str,
    handle: &SessionHandle,
    request: ChoiceRequest,
) -> Result<ActionResponse, ServiceError> {
    let outcome = {
        let mut session = handle.lock().await;
        session.submit_choice(&request.player_id, request.round, &request.value)?
    };

    debug!(scope = %scope, player = %request.player_id, "choice recorded");
    let response = caller_response(&outcome, &request.player_id, "choice recorded");
    dispatch(state, scope, handle, outcome);
    Ok(response)
}

async fn invoke_on(
    state: &SharedState,
    scope: &str,
    handle: &SessionHandle,
    request: AbilityRequest,
) -> Result<ActionResponse, ServiceError> {
    let (caster, invocation) = request.into_parts();
    let ability = invocation.ability;
    let outcome = {
        let mut session = handle.lock().await;
        session.invoke_ability(&caster, invocation)?
    };

    info!(scope = %scope, player = %caster, ability = %ability, "ability used");
    let response = caller_response(&outcome, &caster, "ability used");
    dispatch(state, scope, handle, outcome);
    Ok(response)
}

/// Messages addressed privately to `caller`, joined for the command response.
fn caller_response(outcome: &Outcome, caller: &str, fallback: &str) -> ActionResponse {
    let lines: Vec<String> = outcome
        .announcements
        .iter()
        .filter(|announcement| {
            notifications::audience(announcement) == Audience::Direct(caller.to_string())
        })
        .map(notifications::message)
        .collect();

    if lines.is_empty() {
        ActionResponse::new(fallback)
    } else {
        ActionResponse::new(lines.join("\n"))
    }
}
