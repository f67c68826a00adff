//! Render session announcements into text notifications and publish them.

use tracing::warn;

use crate::{
    dto::{
        game::StandingSummary,
        sse::{
            AbilityAssignedEvent, AbilityUsedEvent, ChoiceAcceptedEvent, GameCreatedEvent,
            GameFinishedEvent, GameRemovedEvent, GameStartedEvent, LockReportEvent, MetaViewEvent,
            PlayerJoinedEvent, RoundGuideEvent, RoundResolvedEvent, RoundStartedEvent,
            ScanReportEvent, ServerEvent, SharedLogEvent,
        },
    },
    state::{
        SseHub,
        announcement::Announcement,
        game::{PlayerId, Standing},
    },
};

const EVENT_GAME_CREATED: &str = "game.created";
const EVENT_PLAYER_JOINED: &str = "player.joined";
const EVENT_GAME_STARTED: &str = "game.started";
const EVENT_ABILITY_ASSIGNED: &str = "ability.assigned";
const EVENT_ROUND_STARTED: &str = "round.started";
const EVENT_ROUND_GUIDE: &str = "round.guide";
const EVENT_CHOICE_ACCEPTED: &str = "choice.accepted";
const EVENT_ROUND_RESOLVED: &str = "round.resolved";
const EVENT_ABILITY_USED: &str = "ability.used";
const EVENT_LOCK_REPORT: &str = "ability.lock_report";
const EVENT_SCAN_REPORT: &str = "ability.scan_report";
const EVENT_SHARED_LOG: &str = "ability.shared_log";
const EVENT_METAVIEW: &str = "ability.metaview";
const EVENT_GAME_FINISHED: &str = "game.finished";
const EVENT_GAME_REMOVED: &str = "game.removed";

/// Who a notification is delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Everyone following the scope.
    Channel,
    /// A single participant.
    Direct(PlayerId),
}

impl Audience {
    fn recipient(&self) -> Option<PlayerId> {
        match self {
            Audience::Channel => None,
            Audience::Direct(player) => Some(player.clone()),
        }
    }
}

/// Delivery target of `announcement`.
pub fn audience(announcement: &Announcement) -> Audience {
    match announcement {
        Announcement::AbilityAssigned { player, .. }
        | Announcement::ChoiceGuide { player, .. }
        | Announcement::ChoiceAccepted { player, .. }
        | Announcement::AbilityUsed { player, .. }
        | Announcement::LockReport { player, .. }
        | Announcement::ScanReport { player, .. } => Audience::Direct(player.clone()),
        Announcement::SharedLog { recipient, .. } => Audience::Direct(recipient.clone()),
        Announcement::GameCreated { .. }
        | Announcement::PlayerJoined { .. }
        | Announcement::GameStarted { .. }
        | Announcement::RoundStarted { .. }
        | Announcement::RoundResolved { .. }
        | Announcement::MetaView { .. }
        | Announcement::GameFinished { .. }
        | Announcement::GameRemoved => Audience::Channel,
    }
}

/// Human-readable text for `announcement`.
pub fn message(announcement: &Announcement) -> String {
    match announcement {
        Announcement::GameCreated { host_id } => {
            format!("MISALIGN lobby opened by {host_id}. Join now, 3 to 4 players.")
        }
        Announcement::PlayerJoined {
            name,
            count,
            capacity,
        } => format!("{name} joined ({count}/{capacity})."),
        Announcement::GameStarted { players } => format!(
            "The game begins with {}. Six rounds, one secret ability each.",
            players.join(", ")
        ),
        Announcement::AbilityAssigned { ability, .. } => {
            format!("Your ability is {ability}. You can use it once per game.")
        }
        Announcement::RoundStarted {
            round,
            total,
            minigame,
            deadline_secs,
        } => format!(
            "Round {round}/{total}: {minigame}. Submit your choice by direct message within {deadline_secs}s."
        ),
        Announcement::ChoiceGuide {
            round, minigame, ..
        } => format!(
            "Round {round} ({minigame}): submit {}.",
            minigame.choice_guide()
        ),
        Announcement::ChoiceAccepted { round, .. } => {
            format!("Choice recorded for round {round}.")
        }
        Announcement::RoundResolved {
            round,
            minigame,
            forced,
            scoreboard,
        } => {
            let marker = if *forced { " (host forced)" } else { "" };
            let mut lines = vec![format!("Round {round} {minigame} resolved{marker}.")];
            match scoreboard {
                Some(standings) => lines.extend(ranking_lines(standings)),
                None => lines.push("The scoreboard is hidden this round.".to_string()),
            }
            lines.join("\n")
        }
        Announcement::AbilityUsed { ability, round, .. } => {
            format!("{ability} used in round {round}.")
        }
        Announcement::LockReport {
            target_name,
            target_used,
            ..
        } => {
            let state = if *target_used {
                "had already used"
            } else {
                "had not used"
            };
            format!("{target_name} is locked for the rest of the game. They {state} their ability.")
        }
        Announcement::ScanReport {
            target_name,
            unused,
            ..
        } => {
            let state = if *unused { "still unused" } else { "already used" };
            format!("{target_name}'s ability is {state}.")
        }
        Announcement::SharedLog {
            from_name, entries, ..
        } => {
            let mut lines = vec![format!("{from_name} shared their round log:")];
            if entries.is_empty() {
                lines.push("(no rounds played yet)".to_string());
            }
            lines.extend(entries.iter().map(ToString::to_string));
            lines.join("\n")
        }
        Announcement::MetaView {
            kinds,
            player_count,
        } => {
            let kinds: Vec<&str> = kinds.iter().map(|ability| ability.keyword()).collect();
            format!(
                "Abilities in play among {player_count} players: {}.",
                kinds.join(", ")
            )
        }
        Announcement::GameFinished { ranking } => {
            let mut lines = vec!["Game over. Final ranking:".to_string()];
            lines.extend(ranking_lines(ranking));
            lines.join("\n")
        }
        Announcement::GameRemoved => "The game was closed.".to_string(),
    }
}

/// Serialise `announcement` for delivery within `scope`.
pub fn to_server_event(
    scope: &str,
    announcement: &Announcement,
) -> serde_json::Result<ServerEvent> {
    let recipient = audience(announcement).recipient();
    let message = message(announcement);

    match announcement {
        Announcement::GameCreated { host_id } => ServerEvent::json(
            scope,
            recipient,
            EVENT_GAME_CREATED,
            &GameCreatedEvent {
                host_id: host_id.clone(),
                message,
            },
        ),
        Announcement::PlayerJoined {
            name,
            count,
            capacity,
        } => ServerEvent::json(
            scope,
            recipient,
            EVENT_PLAYER_JOINED,
            &PlayerJoinedEvent {
                name: name.clone(),
                count: *count,
                capacity: *capacity,
                message,
            },
        ),
        Announcement::GameStarted { players } => ServerEvent::json(
            scope,
            recipient,
            EVENT_GAME_STARTED,
            &GameStartedEvent {
                players: players.clone(),
                message,
            },
        ),
        Announcement::AbilityAssigned { ability, .. } => ServerEvent::json(
            scope,
            recipient,
            EVENT_ABILITY_ASSIGNED,
            &AbilityAssignedEvent {
                ability: *ability,
                message,
            },
        ),
        Announcement::RoundStarted {
            round,
            total,
            minigame,
            deadline_secs,
        } => ServerEvent::json(
            scope,
            recipient,
            EVENT_ROUND_STARTED,
            &RoundStartedEvent {
                round: *round,
                total: *total,
                minigame: *minigame,
                deadline_secs: *deadline_secs,
                message,
            },
        ),
        Announcement::ChoiceGuide {
            round, minigame, ..
        } => ServerEvent::json(
            scope,
            recipient,
            EVENT_ROUND_GUIDE,
            &RoundGuideEvent {
                round: *round,
                minigame: *minigame,
                guide: minigame.choice_guide().to_string(),
                message,
            },
        ),
        Announcement::ChoiceAccepted { round, .. } => ServerEvent::json(
            scope,
            recipient,
            EVENT_CHOICE_ACCEPTED,
            &ChoiceAcceptedEvent {
                round: *round,
                message,
            },
        ),
        Announcement::RoundResolved {
            round,
            minigame,
            forced,
            scoreboard,
        } => ServerEvent::json(
            scope,
            recipient,
            EVENT_ROUND_RESOLVED,
            &RoundResolvedEvent {
                round: *round,
                minigame: *minigame,
                forced: *forced,
                scoreboard: scoreboard.as_deref().map(StandingSummary::ranked),
                message,
            },
        ),
        Announcement::AbilityUsed { ability, round, .. } => ServerEvent::json(
            scope,
            recipient,
            EVENT_ABILITY_USED,
            &AbilityUsedEvent {
                ability: *ability,
                round: *round,
                message,
            },
        ),
        Announcement::LockReport {
            target_name,
            target_used,
            ..
        } => ServerEvent::json(
            scope,
            recipient,
            EVENT_LOCK_REPORT,
            &LockReportEvent {
                target_name: target_name.clone(),
                target_used: *target_used,
                message,
            },
        ),
        Announcement::ScanReport {
            target_name,
            unused,
            ..
        } => ServerEvent::json(
            scope,
            recipient,
            EVENT_SCAN_REPORT,
            &ScanReportEvent {
                target_name: target_name.clone(),
                unused: *unused,
                message,
            },
        ),
        Announcement::SharedLog {
            from_name, entries, ..
        } => ServerEvent::json(
            scope,
            recipient,
            EVENT_SHARED_LOG,
            &SharedLogEvent {
                from_name: from_name.clone(),
                entries: entries.iter().map(ToString::to_string).collect(),
                message,
            },
        ),
        Announcement::MetaView {
            kinds,
            player_count,
        } => ServerEvent::json(
            scope,
            recipient,
            EVENT_METAVIEW,
            &MetaViewEvent {
                kinds: kinds.clone(),
                player_count: *player_count,
                message,
            },
        ),
        Announcement::GameFinished { ranking } => ServerEvent::json(
            scope,
            recipient,
            EVENT_GAME_FINISHED,
            &GameFinishedEvent {
                ranking: StandingSummary::ranked(ranking),
                message,
            },
        ),
        Announcement::GameRemoved => ServerEvent::json(
            scope,
            recipient,
            EVENT_GAME_REMOVED,
            &GameRemovedEvent { message },
        ),
    }
}

/// Publish `announcements` on the hub in order.
pub fn publish<'a, I>(hub: &SseHub, scope: &str, announcements: I)
where
    I: IntoIterator<Item = &'a Announcement>,
{
    for announcement in announcements {
        match to_server_event(scope, announcement) {
            Ok(event) => hub.broadcast(event),
            Err(err) => warn!(
                scope = %scope,
                audience = ?audience(announcement),
                error = %err,
                "failed to serialise notification"
            ),
        }
    }
}

fn ranking_lines(standings: &[Standing]) -> impl Iterator<Item = String> + '_ {
    standings
        .iter()
        .enumerate()
        .map(|(index, standing)| format!("{}. {} ({})", index + 1, standing.name, standing.score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{Ability, Minigame, RoundLogEntry};

    fn standings() -> Vec<Standing> {
        vec![
            Standing {
                player_id: "b".into(),
                name: "Bo".into(),
                score: 6,
            },
            Standing {
                player_id: "a".into(),
                name: "Al".into(),
                score: -3,
            },
        ]
    }

    #[test]
    fn private_announcements_are_direct() {
        let scan = Announcement::ScanReport {
            player: "a".into(),
            target_name: "Bo".into(),
            unused: true,
        };
        assert_eq!(audience(&scan), Audience::Direct("a".into()));

        let share = Announcement::SharedLog {
            recipient: "b".into(),
            from_name: "Al".into(),
            entries: Vec::new(),
        };
        assert_eq!(audience(&share), Audience::Direct("b".into()));

        let metaview = Announcement::MetaView {
            kinds: vec![Ability::Lock],
            player_count: 3,
        };
        assert_eq!(audience(&metaview), Audience::Channel);
    }

    #[test]
    fn forced_round_result_is_marked() {
        let text = message(&Announcement::RoundResolved {
            round: 2,
            minigame: Minigame::SecretAuction,
            forced: true,
            scoreboard: Some(standings()),
        });
        assert!(text.starts_with("Round 2 Secret Auction resolved (host forced)."));
        assert!(text.contains("1. Bo (6)"));
        assert!(text.contains("2. Al (-3)"));
    }

    #[test]
    fn blackout_hides_scores() {
        let text = message(&Announcement::RoundResolved {
            round: 1,
            minigame: Minigame::Race,
            forced: false,
            scoreboard: None,
        });
        assert!(text.contains("hidden"));
        assert!(!text.contains("Bo"));
    }

    #[test]
    fn shared_log_renders_entries() {
        let text = message(&Announcement::SharedLog {
            recipient: "b".into(),
            from_name: "Al".into(),
            entries: vec![RoundLogEntry {
                round: 1,
                minigame: Minigame::TimingButton,
                choice: Some("click".into()),
                delta: 1,
                total: 1,
            }],
        });
        assert!(text.contains("R1 Timing Button choice=click delta=1 total=1"));
    }

    #[test]
    fn server_event_carries_name_and_recipient() {
        let event = to_server_event(
            "chan",
            &Announcement::ChoiceAccepted {
                player: "a".into(),
                round: 3,
            },
        )
        .unwrap();
        assert_eq!(event.event.as_deref(), Some("choice.accepted"));
        assert_eq!(event.recipient.as_deref(), Some("a"));
        let body: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(body["round"], 3);
    }

    #[test]
    fn blackout_event_omits_scoreboard_field() {
        let event = to_server_event(
            "chan",
            &Announcement::RoundResolved {
                round: 1,
                minigame: Minigame::Nunchi,
                forced: false,
                scoreboard: None,
            },
        )
        .unwrap();
        let body: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert!(body.get("scoreboard").is_none());
    }
}
