use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_identity},
    services::abilities::Invocation,
    state::{
        game::{Ability, Minigame, Player, PlayerId, Standing, TOTAL_ROUNDS},
        session::GameSession,
        state_machine::GamePhase,
    },
};

/// Payload used to open a lobby in a scope.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    /// Identity of the host.
    #[validate(custom(function = "validate_identity"))]
    pub host_id: PlayerId,
}

/// Payload used to join a lobby.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    #[validate(custom(function = "validate_identity"))]
    pub player_id: PlayerId,
    /// Display name; the identity is used when blank.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub name: String,
}

/// Payload for commands that only need the caller's identity (start, resolve, delete).
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayerRequest {
    #[validate(custom(function = "validate_identity"))]
    pub player_id: PlayerId,
}

/// A choice for the current round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChoiceRequest {
    #[validate(custom(function = "validate_identity"))]
    pub player_id: PlayerId,
    /// Round the choice is meant for; rejected when it is not the current one.
    #[serde(default)]
    #[validate(range(min = 1, max = 6))]
    pub round: Option<u8>,
    #[validate(length(min = 1, max = 200))]
    pub value: String,
}

/// An ability invocation.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AbilityRequest {
    #[validate(custom(function = "validate_identity"))]
    pub player_id: PlayerId,
    pub ability: Ability,
    /// Target player for Intervention, Assimilation, Lock, Share and Scan.
    #[serde(default)]
    pub target: Option<PlayerId>,
    /// Forced choice for Intervention.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub value: Option<String>,
}

impl AbilityRequest {
    /// Split the caller from the invocation itself.
    pub fn into_parts(self) -> (PlayerId, Invocation) {
        (
            self.player_id,
            Invocation {
                ability: self.ability,
                target: self.target,
                value: self.value,
            },
        )
    }
}

/// Lifecycle status reported in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Lobby,
    Running,
    Finished,
}

impl From<GamePhase> for GameStatus {
    fn from(phase: GamePhase) -> Self {
        match phase {
            GamePhase::Lobby => GameStatus::Lobby,
            GamePhase::Running { .. } => GameStatus::Running,
            GamePhase::Finished => GameStatus::Finished,
        }
    }
}

/// Roster row in a status summary.
///
/// The ability kind stays hidden until the game is over.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub player_id: PlayerId,
    pub name: String,
    pub score: i32,
    pub ability_used: bool,
    pub submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ability: Option<Ability>,
}

/// Scoreboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StandingSummary {
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub score: i32,
}

impl StandingSummary {
    /// Number a ranked list from 1.
    pub fn ranked(standings: &[Standing]) -> Vec<Self> {
        standings
            .iter()
            .enumerate()
            .map(|(index, standing)| Self {
                rank: index + 1,
                player_id: standing.player_id.clone(),
                name: standing.name.clone(),
                score: standing.score,
            })
            .collect()
    }
}

/// Horse positions and the constant track lengths.
#[derive(Debug, Serialize, ToSchema)]
pub struct RaceSummary {
    pub positions: Vec<u32>,
    pub lengths: Vec<u32>,
}

/// Status snapshot of a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub scope: String,
    pub host_id: PlayerId,
    pub status: GameStatus,
    pub round: u8,
    pub total_rounds: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minigame: Option<Minigame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_guide: Option<String>,
    /// RFC 3339 timestamp of the running round's start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_started_at: Option<String>,
    pub players: Vec<PlayerSummary>,
    pub race: RaceSummary,
}

impl From<&GameSession> for GameSummary {
    fn from(session: &GameSession) -> Self {
        let finished = session.is_finished();
        let running = session.is_running();
        let minigame = session.current_minigame().filter(|_| running);
        let players = session
            .players()
            .values()
            .map(|player: &Player| PlayerSummary {
                player_id: player.id.clone(),
                name: player.name.clone(),
                score: player.score,
                ability_used: player.ability_used,
                submitted: running && session.has_submitted(&player.id),
                ability: player.ability.filter(|_| finished),
            })
            .collect();

        Self {
            id: session.id(),
            scope: session.scope().to_string(),
            host_id: session.host_id().to_string(),
            status: session.phase().into(),
            round: session.round(),
            total_rounds: TOTAL_ROUNDS,
            minigame,
            choice_guide: minigame.map(|game| game.choice_guide().to_string()),
            round_started_at: session
                .round_started_at()
                .filter(|_| running)
                .map(format_system_time),
            players,
            race: RaceSummary {
                positions: session.table().horse_positions.to_vec(),
                lengths: session.table().horse_lengths.to_vec(),
            },
        }
    }
}

/// Generic acknowledgement returned by command routes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn choice_request_rejects_bad_round_and_empty_value() {
        let request = ChoiceRequest {
            player_id: "p1".into(),
            round: Some(7),
            value: "1".into(),
        };
        assert!(request.validate().is_err());

        let request = ChoiceRequest {
            player_id: "p1".into(),
            round: None,
            value: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_request_rejects_blank_host() {
        let request = CreateGameRequest {
            host_id: "  ".into(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn summary_hides_abilities_while_running() {
        let mut session = GameSession::new("chan", "host", Duration::from_secs(60));
        for id in ["a", "b", "c"] {
            session.join(id, id).unwrap();
        }
        session
            .start("host", &mut StdRng::seed_from_u64(3))
            .unwrap();
        session.submit_choice("a", None, "1").unwrap();

        let summary = GameSummary::from(&session);
        assert_eq!(summary.status, GameStatus::Running);
        assert_eq!(summary.round, 1);
        assert!(summary.minigame.is_some());
        assert!(summary.round_started_at.is_some());
        assert!(summary.players.iter().all(|p| p.ability.is_none()));
        assert!(summary.players[0].submitted);
        assert!(!summary.players[1].submitted);
        assert_eq!(summary.race.lengths, vec![9, 8, 7]);
    }

    #[test]
    fn ranked_standings_start_at_one() {
        let standings = vec![
            Standing {
                player_id: "b".into(),
                name: "B".into(),
                score: 4,
            },
            Standing {
                player_id: "a".into(),
                name: "A".into(),
                score: 1,
            },
        ];
        let ranked = StandingSummary::ranked(&standings);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].player_id, "a");
    }
}
