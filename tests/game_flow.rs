use std::time::Duration;

use misalign::{
    config::AppConfig,
    dto::{
        game::{
            AbilityRequest, ChoiceRequest, CreateGameRequest, GameStatus, JoinRequest,
            PlayerRequest,
        },
        sse::ServerEvent,
    },
    services::game_service,
    state::{AppState, SharedState},
};
use tokio::sync::broadcast;

const SCOPE: &str = "general";
const HOST: &str = "host";
const PLAYERS: [&str; 3] = ["p0", "p1", "p2"];
const ROUND_SECS: u64 = 30;

fn app() -> SharedState {
    AppState::new(AppConfig::new(Duration::from_secs(ROUND_SECS), 256))
}

fn player(id: &str) -> PlayerRequest {
    PlayerRequest {
        player_id: id.to_string(),
    }
}

fn choice(id: &str, value: &str) -> ChoiceRequest {
    ChoiceRequest {
        player_id: id.to_string(),
        round: None,
        value: value.to_string(),
    }
}

async fn started_game(state: &SharedState) {
    game_service::create_game(
        state,
        SCOPE,
        CreateGameRequest {
            host_id: HOST.to_string(),
        },
    )
    .await
    .unwrap();
    for id in PLAYERS {
        game_service::join_game(
            state,
            SCOPE,
            JoinRequest {
                player_id: id.to_string(),
                name: id.to_uppercase(),
            },
        )
        .await
        .unwrap();
    }
    game_service::start_game(state, SCOPE, player(HOST))
        .await
        .unwrap();
}

fn drain(receiver: &mut broadcast::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

fn named<'a>(events: &'a [ServerEvent], name: &str) -> Vec<&'a ServerEvent> {
    events
        .iter()
        .filter(|event| event.event.as_deref() == Some(name))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn deadline_closes_an_idle_round() {
    let state = app();
    started_game(&state).await;
    let mut receiver = state.events().subscribe();

    tokio::time::sleep(Duration::from_secs(ROUND_SECS + 1)).await;

    let summary = game_service::game_status(&state, SCOPE).await.unwrap();
    assert_eq!(summary.round, 2);
    assert!(summary.players.iter().all(|p| !p.submitted));

    let events = drain(&mut receiver);
    let resolved = named(&events, "round.resolved");
    assert_eq!(resolved.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&resolved[0].data).unwrap();
    assert_eq!(body["round"], 1);
    assert_eq!(body["forced"], false);
    assert_eq!(named(&events, "round.started").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_deadline_does_not_resolve_twice() {
    let state = app();
    started_game(&state).await;

    // Round 1 closes by deadline at t=30; round 2 is armed for t=60.
    tokio::time::sleep(Duration::from_secs(ROUND_SECS + 1)).await;
    assert_eq!(
        game_service::game_status(&state, SCOPE).await.unwrap().round,
        2
    );

    // Everyone answers round 2 early, so round 3 opens at t=31 with a deadline at t=61.
    for id in PLAYERS {
        game_service::submit_choice(&state, SCOPE, choice(id, "1"))
            .await
            .unwrap();
    }
    assert_eq!(
        game_service::game_status(&state, SCOPE).await.unwrap().round,
        3
    );

    // The round 2 deadline fires at t=60 and must be ignored; round 3 closes at t=61.
    tokio::time::sleep(Duration::from_secs(ROUND_SECS + 4)).await;

    let handle = state.session(SCOPE).unwrap();
    let session = handle.lock().await;
    assert_eq!(session.round(), 4);
    for id in PLAYERS {
        let rounds: Vec<u8> = session.round_log(id).iter().map(|e| e.round).collect();
        assert_eq!(rounds, vec![1, 2, 3]);
    }
}

#[tokio::test(start_paused = true)]
async fn forced_rounds_finish_the_game_once() {
    let state = app();
    started_game(&state).await;
    let mut receiver = state.events().subscribe();

    let err = game_service::force_resolve(&state, SCOPE, player("p0"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "authorization_denied");

    for _ in 0..6 {
        game_service::force_resolve(&state, SCOPE, player(HOST))
            .await
            .unwrap();
    }

    let summary = game_service::game_status(&state, SCOPE).await.unwrap();
    assert_eq!(summary.status, GameStatus::Finished);
    assert_eq!(summary.round, 6);
    assert!(summary.players.iter().all(|p| p.ability.is_some()));

    let events = drain(&mut receiver);
    assert_eq!(named(&events, "round.resolved").len(), 6);
    assert_eq!(named(&events, "game.finished").len(), 1);

    let err = game_service::force_resolve(&state, SCOPE, player(HOST))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_transition");

    // Deadlines armed before the finish must not disturb the final state.
    tokio::time::sleep(Duration::from_secs(ROUND_SECS * 3)).await;
    assert_eq!(
        game_service::game_status(&state, SCOPE)
            .await
            .unwrap()
            .status,
        GameStatus::Finished
    );
}

#[tokio::test(start_paused = true)]
async fn private_notifications_only_reach_their_recipient() {
    let state = app();
    let mut receiver = state.events().subscribe();
    started_game(&state).await;

    let events = drain(&mut receiver);
    let assigned = named(&events, "ability.assigned");
    assert_eq!(assigned.len(), 3);

    let seen_by_p0: Vec<&ServerEvent> = assigned
        .iter()
        .copied()
        .filter(|event| event.is_visible_to(SCOPE, Some("p0")))
        .collect();
    assert_eq!(seen_by_p0.len(), 1);
    assert_eq!(seen_by_p0[0].recipient.as_deref(), Some("p0"));

    let guides = named(&events, "round.guide");
    assert_eq!(guides.len(), 3);
    assert!(guides.iter().all(|event| !event.is_visible_to(SCOPE, None)));

    let started = named(&events, "round.started");
    assert_eq!(started.len(), 1);
    assert!(started[0].is_visible_to(SCOPE, None));
    assert!(!started[0].is_visible_to("elsewhere", None));
}

#[tokio::test(start_paused = true)]
async fn direct_commands_reach_the_running_game() {
    let state = app();
    started_game(&state).await;

    let response = game_service::submit_direct_choice(&state, choice("p1", "2"))
        .await
        .unwrap();
    assert!(response.message.contains("round 1"));

    let summary = game_service::game_status(&state, SCOPE).await.unwrap();
    let p1 = summary
        .players
        .iter()
        .find(|p| p.player_id == "p1")
        .unwrap();
    assert!(p1.submitted);

    let err = game_service::submit_direct_choice(&state, choice("stranger", "2"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test(start_paused = true)]
async fn ability_is_spent_once_through_the_service() {
    let state = app();
    started_game(&state).await;

    let ability = {
        let handle = state.session(SCOPE).unwrap();
        let session = handle.lock().await;
        session.player("p0").unwrap().ability.unwrap()
    };
    let request = || AbilityRequest {
        player_id: "p0".to_string(),
        ability,
        target: Some("p1".to_string()),
        value: Some("1".to_string()),
    };

    let response = game_service::invoke_direct_ability(&state, request())
        .await
        .unwrap();
    assert!(response.message.contains("used in round 1"));

    let err = game_service::invoke_ability(&state, SCOPE, request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ability_violation");
}

#[tokio::test]
async fn scope_holds_one_game_until_removed() {
    let state = app();
    let create = || CreateGameRequest {
        host_id: HOST.to_string(),
    };
    game_service::create_game(&state, SCOPE, create())
        .await
        .unwrap();

    let err = game_service::create_game(&state, SCOPE, create())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "scope_conflict");

    let err = game_service::delete_game(&state, SCOPE, player("p0"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "authorization_denied");

    game_service::delete_game(&state, SCOPE, player(HOST))
        .await
        .unwrap();
    assert_eq!(state.session_count(), 0);
    game_service::create_game(&state, SCOPE, create())
        .await
        .unwrap();
}

#[tokio::test]
async fn lobby_rules_surface_as_errors() {
    let state = app();
    game_service::create_game(
        &state,
        SCOPE,
        CreateGameRequest {
            host_id: HOST.to_string(),
        },
    )
    .await
    .unwrap();

    let err = game_service::start_game(&state, SCOPE, player(HOST))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "roster_constraint_violation");

    let err = game_service::join_game(
        &state,
        "nowhere",
        JoinRequest {
            player_id: "p0".to_string(),
            name: String::new(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let summary = game_service::join_game(
        &state,
        SCOPE,
        JoinRequest {
            player_id: "p0".to_string(),
            name: "  ".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(summary.players[0].name, "p0");
    assert_eq!(summary.status, GameStatus::Lobby);
}
