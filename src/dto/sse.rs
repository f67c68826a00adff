use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::game::StandingSummary,
    state::game::{Ability, Minigame, PlayerId},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the notification hub.
pub struct ServerEvent {
    /// Scope the notification belongs to.
    pub scope: String,
    /// Addressee of a direct notification; `None` for channel-level ones.
    pub recipient: Option<PlayerId>,
    /// SSE event name.
    pub event: Option<String>,
    /// Serialised JSON body.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<T>(
        scope: &str,
        recipient: Option<PlayerId>,
        event: &str,
        payload: &T,
    ) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            scope: scope.to_string(),
            recipient,
            event: Some(event.to_string()),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Whether a subscriber of `scope`, identified as `player`, should receive this event.
    pub fn is_visible_to(&self, scope: &str, player: Option<&str>) -> bool {
        if self.scope != scope {
            return false;
        }
        match &self.recipient {
            None => true,
            Some(recipient) => player == Some(recipient.as_str()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Scope of the stream.
    pub scope: String,
    /// Player the direct notifications are filtered for, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    /// Human-readable message confirming the subscription.
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// A lobby was opened.
pub struct GameCreatedEvent {
    pub host_id: PlayerId,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Someone joined the lobby.
pub struct PlayerJoinedEvent {
    pub name: String,
    pub count: usize,
    pub capacity: usize,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// The game started with this roster.
pub struct GameStartedEvent {
    pub players: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Direct: the ability dealt to the recipient.
pub struct AbilityAssignedEvent {
    pub ability: Ability,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// A round opened.
pub struct RoundStartedEvent {
    pub round: u8,
    pub total: u8,
    pub minigame: Minigame,
    pub deadline_secs: u64,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Direct: how to answer the current minigame.
pub struct RoundGuideEvent {
    pub round: u8,
    pub minigame: Minigame,
    pub guide: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Direct: a choice was recorded.
pub struct ChoiceAcceptedEvent {
    pub round: u8,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// A round was scored.
pub struct RoundResolvedEvent {
    pub round: u8,
    pub minigame: Minigame,
    pub forced: bool,
    /// Absent when the scoreboard was blacked out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoreboard: Option<Vec<StandingSummary>>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Direct: confirmation that an ability went through.
pub struct AbilityUsedEvent {
    pub ability: Ability,
    pub round: u8,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Direct: Lock landed.
pub struct LockReportEvent {
    pub target_name: String,
    pub target_used: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Direct: Scan result.
pub struct ScanReportEvent {
    pub target_name: String,
    pub unused: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Direct: another player's round log.
pub struct SharedLogEvent {
    pub from_name: String,
    pub entries: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Ability kinds in play.
pub struct MetaViewEvent {
    pub kinds: Vec<Ability>,
    pub player_count: usize,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Final ranking.
pub struct GameFinishedEvent {
    pub ranking: Vec<StandingSummary>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// The session was closed.
pub struct GameRemovedEvent {
    pub message: String,
}
