use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque identity handle issued by the chat transport.
pub type PlayerId = String;

/// Smallest roster that can start a game.
pub const MIN_PLAYERS: usize = 3;
/// Largest roster a session accepts.
pub const MAX_PLAYERS: usize = 4;
/// Number of rounds (and therefore minigames) played per game.
pub const TOTAL_ROUNDS: u8 = 6;

/// The eight minigames a round can be drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Minigame {
    /// Cooperate or betray; traitors split six points.
    TraitorSplit,
    /// Pick 1, 2 or 3 and hope exactly one other player matches.
    Match123,
    /// Sealed bids from 0 to 5; the highest unique bid wins.
    SecretAuction,
    /// Majority move around a nine-step loop.
    CircularTrack,
    /// Boost or sabotage one of three horses and bet on it.
    Race,
    /// Click or pass; the parity of the clicker count decides the sign.
    TimingButton,
    /// Five O/X answers. Currently scores nothing.
    OxPsychology,
    /// Say yes only if nobody else will.
    Nunchi,
}

impl Minigame {
    /// Every minigame, in catalogue order.
    pub const ALL: [Minigame; 8] = [
        Minigame::TraitorSplit,
        Minigame::Match123,
        Minigame::SecretAuction,
        Minigame::CircularTrack,
        Minigame::Race,
        Minigame::TimingButton,
        Minigame::OxPsychology,
        Minigame::Nunchi,
    ];

    /// Display title used in announcements.
    pub fn title(self) -> &'static str {
        match self {
            Minigame::TraitorSplit => "Traitor Split",
            Minigame::Match123 => "1-2-3 Match",
            Minigame::SecretAuction => "Secret Auction",
            Minigame::CircularTrack => "Circular Track",
            Minigame::Race => "Race",
            Minigame::TimingButton => "Timing Button",
            Minigame::OxPsychology => "OX Psychology",
            Minigame::Nunchi => "Nunchi Challenge",
        }
    }

    /// Short reminder of the accepted choice format.
    pub fn choice_guide(self) -> &'static str {
        match self {
            Minigame::TraitorSplit => "cooperate or betray (협력 / 배신)",
            Minigame::Match123 => "1, 2 or 3",
            Minigame::SecretAuction => "a bid from 0 to 5",
            Minigame::CircularTrack => "a move from 0 to 3",
            Minigame::Race => "horse1, horse2 or horse3 followed by boost or sabotage (e.g. `horse2 boost`)",
            Minigame::TimingButton => "click or pass",
            Minigame::OxPsychology => "five O/X answers (e.g. OXOXO)",
            Minigame::Nunchi => "yes or no (예 / 아니오)",
        }
    }
}

impl fmt::Display for Minigame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Single-use hidden abilities handed out at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    /// Force a named player's choice for the current round.
    Intervention,
    /// Hide the scoreboard in this round's result.
    Blackout,
    /// Inherit another player's round delta.
    Assimilation,
    /// Block a player's ability for the rest of the game.
    Lock,
    /// Mark the caster as masked.
    Mask,
    /// Send the caster's round log to another player.
    Share,
    /// Learn whether a player's ability is still unused.
    Scan,
    /// Learn which ability kinds are in play.
    #[serde(rename = "metaview")]
    MetaView,
}

impl Ability {
    /// Every ability, in catalogue order.
    pub const ALL: [Ability; 8] = [
        Ability::Intervention,
        Ability::Blackout,
        Ability::Assimilation,
        Ability::Lock,
        Ability::Mask,
        Ability::Share,
        Ability::Scan,
        Ability::MetaView,
    ];

    /// Command keyword for the ability.
    pub fn keyword(self) -> &'static str {
        match self {
            Ability::Intervention => "intervention",
            Ability::Blackout => "blackout",
            Ability::Assimilation => "assimilation",
            Ability::Lock => "lock",
            Ability::Mask => "mask",
            Ability::Share => "share",
            Ability::Scan => "scan",
            Ability::MetaView => "metaview",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Roster entry tracked for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Identity handle from the transport.
    pub id: PlayerId,
    /// Display name captured at join time.
    pub name: String,
    /// Cumulative score.
    pub score: i32,
    /// Ability assigned at game start.
    pub ability: Option<Ability>,
    /// Whether the ability has been spent.
    pub ability_used: bool,
    /// Round in which the ability was spent.
    pub ability_used_at: Option<u8>,
    /// Raw choice text per round number.
    pub choices: HashMap<u8, String>,
}

impl Player {
    /// Fresh lobby entry with no score and no ability.
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            ability: None,
            ability_used: false,
            ability_used_at: None,
            choices: HashMap::new(),
        }
    }
}

/// Transient per-round outcome of ability invocations, consumed once at resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectOverlay {
    /// Forced choice per targeted player.
    pub interventions: HashMap<PlayerId, String>,
    /// Withhold the scoreboard from this round's result.
    pub blackout: bool,
    /// Caster to the player whose delta the caster inherits.
    pub assimilations: HashMap<PlayerId, PlayerId>,
    /// Players marked by Mask.
    pub masked: HashSet<PlayerId>,
}

impl EffectOverlay {
    /// Effective choice for `player`: the forced value when one targets them, the raw one otherwise.
    pub fn effective_choice(&self, player: &str, raw: Option<&str>) -> Option<String> {
        self.interventions
            .get(player)
            .map(String::as_str)
            .or(raw)
            .map(str::to_owned)
    }

    /// Overwrite each assimilating caster's delta with their target's scored delta.
    ///
    /// Targets are read from the scored deltas, so chains of assimilation do not compound.
    pub fn copy_deltas(&self, deltas: &mut indexmap::IndexMap<PlayerId, i32>) {
        let scored = deltas.clone();
        for (caster, target) in &self.assimilations {
            if let (Some(slot), Some(copied)) = (deltas.get_mut(caster), scored.get(target)) {
                *slot = *copied;
            }
        }
    }
}

/// One line of a player's append-only round log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundLogEntry {
    /// Round number.
    pub round: u8,
    /// Minigame played that round.
    pub minigame: Minigame,
    /// Effective choice after the overlay.
    pub choice: Option<String>,
    /// Delta applied.
    pub delta: i32,
    /// Cumulative score after the delta.
    pub total: i32,
}

impl fmt::Display for RoundLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R{} {} choice={} delta={} total={}",
            self.round,
            self.minigame,
            self.choice.as_deref().unwrap_or("-"),
            self.delta,
            self.total
        )
    }
}

/// Scoreboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// Player identity.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Cumulative score.
    pub score: i32,
}

impl From<&Player> for Standing {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.id.clone(),
            name: player.name.clone(),
            score: player.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn intervention_replaces_raw_choice() {
        let mut overlay = EffectOverlay::default();
        overlay.interventions.insert("a".into(), "배신".into());

        assert_eq!(
            overlay.effective_choice("a", Some("협력")),
            Some("배신".to_string())
        );
        assert_eq!(overlay.effective_choice("a", None), Some("배신".to_string()));
        assert_eq!(
            overlay.effective_choice("b", Some("협력")),
            Some("협력".to_string())
        );
        assert_eq!(overlay.effective_choice("b", None), None);
    }

    #[test]
    fn assimilation_reads_scored_deltas() {
        let mut overlay = EffectOverlay::default();
        overlay.assimilations.insert("a".into(), "b".into());
        overlay.assimilations.insert("b".into(), "c".into());

        let mut deltas: IndexMap<PlayerId, i32> =
            [("a".into(), 1), ("b".into(), 2), ("c".into(), 3)].into_iter().collect();
        overlay.copy_deltas(&mut deltas);

        assert_eq!(deltas["a"], 2);
        assert_eq!(deltas["b"], 3);
        assert_eq!(deltas["c"], 3);
    }

    #[test]
    fn log_entry_renders_compact_line() {
        let entry = RoundLogEntry {
            round: 2,
            minigame: Minigame::TimingButton,
            choice: Some("click".into()),
            delta: -2,
            total: 4,
        };
        assert_eq!(
            entry.to_string(),
            "R2 Timing Button choice=click delta=-2 total=4"
        );
    }
}
