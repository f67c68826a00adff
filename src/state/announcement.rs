use crate::state::game::{Ability, Minigame, PlayerId, RoundLogEntry, Standing};

/// Outbound facts produced by session operations.
///
/// Announcements are plain data composed under the session lock; rendering and
/// delivery happen after the lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// A session was opened for the scope.
    GameCreated {
        /// Host identity.
        host_id: PlayerId,
    },
    /// A player joined the lobby.
    PlayerJoined {
        /// Display name of the new player.
        name: String,
        /// Roster size after joining.
        count: usize,
        /// Roster capacity.
        capacity: usize,
    },
    /// The host started the game.
    GameStarted {
        /// Display names in join order.
        players: Vec<String>,
    },
    /// Private notice of a player's ability.
    AbilityAssigned {
        /// Recipient.
        player: PlayerId,
        /// Assigned ability.
        ability: Ability,
    },
    /// A new round opened.
    RoundStarted {
        /// Round number.
        round: u8,
        /// Total rounds in the game.
        total: u8,
        /// Minigame for the round.
        minigame: Minigame,
        /// Seconds until the round closes on its own.
        deadline_secs: u64,
    },
    /// Private reminder of the accepted choice format.
    ChoiceGuide {
        /// Recipient.
        player: PlayerId,
        /// Round number.
        round: u8,
        /// Minigame for the round.
        minigame: Minigame,
    },
    /// Private acknowledgement of a submitted choice.
    ChoiceAccepted {
        /// Recipient.
        player: PlayerId,
        /// Round the choice was recorded for.
        round: u8,
    },
    /// Result of a resolved round.
    RoundResolved {
        /// Round number.
        round: u8,
        /// Minigame played.
        minigame: Minigame,
        /// Whether the host closed the round early.
        forced: bool,
        /// Ranked scoreboard, withheld under Blackout.
        scoreboard: Option<Vec<Standing>>,
    },
    /// Private confirmation that an ability went through.
    AbilityUsed {
        /// Caster.
        player: PlayerId,
        /// Ability spent.
        ability: Ability,
        /// Round in which it was spent.
        round: u8,
    },
    /// Lock side result for the caster.
    LockReport {
        /// Caster.
        player: PlayerId,
        /// Locked player's name.
        target_name: String,
        /// Whether the locked player had already used their ability.
        target_used: bool,
    },
    /// Scan result for the caster.
    ScanReport {
        /// Caster.
        player: PlayerId,
        /// Scanned player's name.
        target_name: String,
        /// Whether the scanned player's ability is still unused.
        unused: bool,
    },
    /// Caster's round log delivered to another player.
    SharedLog {
        /// Recipient.
        recipient: PlayerId,
        /// Caster's display name.
        from_name: String,
        /// Log lines.
        entries: Vec<RoundLogEntry>,
    },
    /// MetaView result, posted to the channel.
    MetaView {
        /// Distinct ability kinds in play.
        kinds: Vec<Ability>,
        /// Number of players.
        player_count: usize,
    },
    /// Final ranking after the last round.
    GameFinished {
        /// Ranked standings.
        ranking: Vec<Standing>,
    },
    /// The session was removed from the registry.
    GameRemoved,
}

/// Result of a mutating session operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Announcements in emission order.
    pub announcements: Vec<Announcement>,
    /// Round whose deadline must be armed, when a new round opened.
    pub armed_round: Option<u8>,
}

impl Outcome {
    /// Outcome carrying a single announcement.
    pub fn announce(announcement: Announcement) -> Self {
        Self {
            announcements: vec![announcement],
            armed_round: None,
        }
    }

    /// Append `other` after this outcome; the later armed round wins.
    pub fn merge(&mut self, other: Outcome) {
        self.announcements.extend(other.announcements);
        if other.armed_round.is_some() {
            self.armed_round = other.armed_round;
        }
    }

    /// Whether nothing happened.
    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty() && self.armed_round.is_none()
    }
}
