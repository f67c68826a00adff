//! One game session: lobby, six rounds, final ranking.
//!
//! Every method here runs under the session's lock. Nothing in this module
//! performs I/O; outbound facts are returned as [`Outcome`] values.

use std::{
    collections::{HashMap, HashSet},
    time::{Duration, SystemTime},
};

use indexmap::IndexMap;
use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    services::{
        abilities::{self, AbilityContext, AbilityEffect, Invocation},
        scoring::{self, Choices, MinigameTable},
    },
    state::{
        announcement::{Announcement, Outcome},
        game::{
            Ability, EffectOverlay, MAX_PLAYERS, MIN_PLAYERS, Minigame, Player, PlayerId,
            RoundLogEntry, Standing, TOTAL_ROUNDS,
        },
        state_machine::{GameEvent, GamePhase, GameStateMachine},
    },
};

/// State for one game bound to a scope.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: Uuid,
    scope: String,
    host_id: PlayerId,
    machine: GameStateMachine,
    players: IndexMap<PlayerId, Player>,
    lineup: Vec<Minigame>,
    current: Option<Minigame>,
    submitted: HashSet<PlayerId>,
    round_started_at: Option<SystemTime>,
    round_resolved: bool,
    overlay: EffectOverlay,
    ability_locks: HashSet<PlayerId>,
    round_logs: HashMap<PlayerId, Vec<RoundLogEntry>>,
    table: MinigameTable,
    round_duration: Duration,
}

impl GameSession {
    /// Open a lobby for `scope` hosted by `host_id`.
    pub fn new(scope: impl Into<String>, host_id: impl Into<PlayerId>, round_duration: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope: scope.into(),
            host_id: host_id.into(),
            machine: GameStateMachine::new(),
            players: IndexMap::new(),
            lineup: Vec::new(),
            current: None,
            submitted: HashSet::new(),
            round_started_at: None,
            round_resolved: false,
            overlay: EffectOverlay::default(),
            ability_locks: HashSet::new(),
            round_logs: HashMap::new(),
            table: MinigameTable::default(),
            round_duration,
        }
    }

    /// Unique session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Scope this session is bound to.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Host identity.
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Whether a round is in progress.
    pub fn is_running(&self) -> bool {
        matches!(self.phase(), GamePhase::Running { .. })
    }

    /// Whether the final ranking was produced.
    pub fn is_finished(&self) -> bool {
        self.phase() == GamePhase::Finished
    }

    /// Current round: 0 before the first round, 6 after the game.
    pub fn round(&self) -> u8 {
        self.machine.round()
    }

    /// Roster in join order.
    pub fn players(&self) -> &IndexMap<PlayerId, Player> {
        &self.players
    }

    /// Look up a player by id.
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    /// Minigames drawn for the six rounds.
    pub fn lineup(&self) -> &[Minigame] {
        &self.lineup
    }

    /// Minigame of the running round.
    pub fn current_minigame(&self) -> Option<Minigame> {
        self.current
    }

    /// Whether `id` submitted a choice this round.
    pub fn has_submitted(&self, id: &str) -> bool {
        self.submitted.contains(id)
    }

    /// When the running round opened.
    pub fn round_started_at(&self) -> Option<SystemTime> {
        self.round_started_at
    }

    /// Ability effects for the current round.
    pub fn overlay(&self) -> &EffectOverlay {
        &self.overlay
    }

    /// Whether `id` was hit by Lock.
    pub fn is_locked(&self, id: &str) -> bool {
        self.ability_locks.contains(id)
    }

    /// Round log lines of `id`.
    pub fn round_log(&self, id: &str) -> &[RoundLogEntry] {
        self.round_logs.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Minigame memory kept across rounds.
    pub fn table(&self) -> &MinigameTable {
        &self.table
    }

    /// Scoreboard ordered by descending score, ties kept in join order.
    pub fn ranking(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self.players.values().map(Standing::from).collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }

    /// Add a player to the lobby.
    pub fn join(&mut self, player_id: &str, name: &str) -> Result<Outcome, ServiceError> {
        if self.phase() != GamePhase::Lobby {
            return Err(ServiceError::InvalidTransition(
                "the game has already started".into(),
            ));
        }
        if self.players.contains_key(player_id) {
            return Err(ServiceError::RosterConstraintViolation(
                "you have already joined".into(),
            ));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(ServiceError::RosterConstraintViolation(format!(
                "the game is full ({MAX_PLAYERS} players)"
            )));
        }

        let name = name.trim();
        let name = if name.is_empty() { player_id } else { name };
        self.players.insert(
            player_id.to_string(),
            Player::new(player_id.to_string(), name.to_string()),
        );

        Ok(Outcome::announce(Announcement::PlayerJoined {
            name: name.to_string(),
            count: self.players.len(),
            capacity: MAX_PLAYERS,
        }))
    }

    /// Draw the lineup and abilities, then open round 1.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        requester: &str,
        rng: &mut R,
    ) -> Result<Outcome, ServiceError> {
        if self.phase() != GamePhase::Lobby {
            return Err(ServiceError::InvalidTransition(
                "the game has already started".into(),
            ));
        }
        if requester != self.host_id {
            return Err(ServiceError::AuthorizationDenied(
                "only the host can start the game".into(),
            ));
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players.len()) {
            return Err(ServiceError::RosterConstraintViolation(format!(
                "{MIN_PLAYERS} to {MAX_PLAYERS} players are needed, {} joined",
                self.players.len()
            )));
        }

        self.machine.apply(GameEvent::Start)?;

        let mut lineup = Minigame::ALL.to_vec();
        lineup.shuffle(rng);
        lineup.truncate(usize::from(TOTAL_ROUNDS));
        self.lineup = lineup;

        let mut pool = Ability::ALL.to_vec();
        pool.shuffle(rng);
        for (player, ability) in self.players.values_mut().zip(pool) {
            player.ability = Some(ability);
        }

        let mut outcome = Outcome::announce(Announcement::GameStarted {
            players: self.players.values().map(|p| p.name.clone()).collect(),
        });
        for player in self.players.values() {
            if let Some(ability) = player.ability {
                outcome.announcements.push(Announcement::AbilityAssigned {
                    player: player.id.clone(),
                    ability,
                });
            }
        }
        outcome.merge(self.start_next_round()?);
        Ok(outcome)
    }

    /// Open the next round, or finish the game after the last one.
    pub fn start_next_round(&mut self) -> Result<Outcome, ServiceError> {
        if self.round() >= TOTAL_ROUNDS {
            self.machine.apply(GameEvent::Finish)?;
            self.current = None;
            self.submitted.clear();
            self.overlay = EffectOverlay::default();
            return Ok(Outcome::announce(Announcement::GameFinished {
                ranking: self.ranking(),
            }));
        }

        let GamePhase::Running { round } = self.machine.apply(GameEvent::NextRound)? else {
            return Err(ServiceError::InvalidTransition(
                "rounds only advance while the game is running".into(),
            ));
        };
        let minigame = self
            .lineup
            .get(usize::from(round - 1))
            .copied()
            .ok_or_else(|| ServiceError::InvalidTransition("no minigame drawn for round".into()))?;

        self.current = Some(minigame);
        self.submitted.clear();
        self.overlay = EffectOverlay::default();
        self.round_resolved = false;
        self.table.nunchi_resolved = false;
        self.round_started_at = Some(SystemTime::now());

        let mut outcome = Outcome::announce(Announcement::RoundStarted {
            round,
            total: TOTAL_ROUNDS,
            minigame,
            deadline_secs: self.round_duration.as_secs(),
        });
        outcome
            .announcements
            .extend(self.players.keys().map(|player| Announcement::ChoiceGuide {
                player: player.clone(),
                round,
                minigame,
            }));
        outcome.armed_round = Some(round);
        Ok(outcome)
    }

    /// Record `value` as the player's choice for the current round.
    ///
    /// When `round` is given it must match the current round. The round
    /// resolves immediately once every player has submitted.
    pub fn submit_choice(
        &mut self,
        player_id: &str,
        round: Option<u8>,
        value: &str,
    ) -> Result<Outcome, ServiceError> {
        let current = self.running_round()?;
        if round.is_some_and(|round| round != current) {
            return Err(ServiceError::InvalidTransition(format!(
                "round {current} is in progress"
            )));
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(ServiceError::ArgumentMissing("a choice value is required".into()));
        }
        let player = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` is not in this game")))?;

        player.choices.insert(current, value.to_string());
        self.submitted.insert(player_id.to_string());

        let mut outcome = Outcome::announce(Announcement::ChoiceAccepted {
            player: player_id.to_string(),
            round: current,
        });
        if self.submitted.len() == self.players.len() {
            outcome.merge(self.resolve(current, false)?);
        }
        Ok(outcome)
    }

    /// Score `round` and advance.
    ///
    /// Returns an empty outcome when `round` is not the running round or was
    /// already resolved, so a late deadline never applies deltas twice.
    pub fn resolve(&mut self, round: u8, forced: bool) -> Result<Outcome, ServiceError> {
        if !self.is_running() || self.round() != round || self.round_resolved {
            return Ok(Outcome::default());
        }
        let Some(minigame) = self.current else {
            return Ok(Outcome::default());
        };

        let choices: Choices = self
            .players
            .values()
            .map(|player| {
                let raw = player.choices.get(&round).map(String::as_str);
                (player.id.clone(), self.overlay.effective_choice(&player.id, raw))
            })
            .collect();

        let mut deltas = scoring::score_round(minigame, &choices, &mut self.table);
        self.overlay.copy_deltas(&mut deltas);

        for (player_id, delta) in &deltas {
            let Some(player) = self.players.get_mut(player_id) else {
                continue;
            };
            player.score += delta;
            self.round_logs
                .entry(player_id.clone())
                .or_default()
                .push(RoundLogEntry {
                    round,
                    minigame,
                    choice: choices.get(player_id).cloned().flatten(),
                    delta: *delta,
                    total: player.score,
                });
        }
        self.round_resolved = true;

        let scoreboard = (!self.overlay.blackout).then(|| self.ranking());
        let mut outcome = Outcome::announce(Announcement::RoundResolved {
            round,
            minigame,
            forced,
            scoreboard,
        });
        outcome.merge(self.start_next_round()?);
        Ok(outcome)
    }

    /// Host closes the current round regardless of missing choices.
    pub fn force_resolve(&mut self, requester: &str) -> Result<Outcome, ServiceError> {
        if requester != self.host_id {
            return Err(ServiceError::AuthorizationDenied(
                "only the host can close a round".into(),
            ));
        }
        let round = self.running_round()?;
        self.resolve(round, true)
    }

    /// Spend the caster's ability.
    pub fn invoke_ability(
        &mut self,
        caster: &str,
        invocation: Invocation,
    ) -> Result<Outcome, ServiceError> {
        let round = self.running_round()?;
        let ability = invocation.ability;

        let effect = abilities::invoke(
            AbilityContext {
                roster: &self.players,
                logs: &self.round_logs,
                locks: &mut self.ability_locks,
                overlay: &mut self.overlay,
            },
            caster,
            invocation,
        )?;

        let player = self
            .players
            .get_mut(caster)
            .ok_or_else(|| ServiceError::NotFound(format!("player `{caster}` is not in this game")))?;
        player.ability_used = true;
        player.ability_used_at = Some(round);
        let caster_name = player.name.clone();

        let mut outcome = Outcome::announce(Announcement::AbilityUsed {
            player: caster.to_string(),
            ability,
            round,
        });
        let report = match effect {
            AbilityEffect::Recorded => None,
            AbilityEffect::Locked {
                target,
                target_used,
            } => Some(Announcement::LockReport {
                player: caster.to_string(),
                target_name: self.display_name(&target),
                target_used,
            }),
            AbilityEffect::Scanned { target, unused } => Some(Announcement::ScanReport {
                player: caster.to_string(),
                target_name: self.display_name(&target),
                unused,
            }),
            AbilityEffect::Shared { recipient, entries } => Some(Announcement::SharedLog {
                recipient,
                from_name: caster_name,
                entries,
            }),
            AbilityEffect::MetaView {
                kinds,
                player_count,
            } => Some(Announcement::MetaView {
                kinds,
                player_count,
            }),
        };
        outcome.announcements.extend(report);
        Ok(outcome)
    }

    fn running_round(&self) -> Result<u8, ServiceError> {
        match self.phase() {
            GamePhase::Running { round } if round > 0 => Ok(round),
            GamePhase::Lobby | GamePhase::Running { .. } => Err(ServiceError::InvalidTransition(
                "the game has not started".into(),
            )),
            GamePhase::Finished => Err(ServiceError::InvalidTransition(
                "the game is over".into(),
            )),
        }
    }

    fn display_name(&self, id: &str) -> String {
        self.players
            .get(id)
            .map(|player| player.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    #[cfg(test)]
    fn rig_round(&mut self, minigame: Minigame) {
        self.current = Some(minigame);
    }
}
