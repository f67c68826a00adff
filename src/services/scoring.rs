//! Per-minigame scoring rules.
//!
//! Each rule maps the round's effective choices to a delta per player. Absent
//! or malformed choices score 0 and are left out of counts and majorities
//! unless a rule says otherwise. Rules that remember things between rounds
//! (track positions, horse positions, last race action) keep that memory in a
//! [`MinigameTable`] owned by the session.

use std::{collections::HashMap, ops::RangeInclusive};

use indexmap::IndexMap;

use crate::state::game::{Minigame, PlayerId};

/// Effective choice per player, in roster order. `None` means nothing was submitted.
pub type Choices = IndexMap<PlayerId, Option<String>>;
/// Score change per player, in roster order.
pub type Deltas = IndexMap<PlayerId, i32>;

const TRAITOR_POT: i32 = 6;
const LOYALIST_PENALTY: i32 = -3;
const PAIR_REWARD: i32 = 4;
const CROWD_PENALTY: i32 = -2;
const ALL_DISTINCT_PENALTY: i32 = -1;
const AUCTION_REWARD: i32 = 6;
const TRACK_GOAL: u32 = 9;
const TRACK_REWARD: i32 = 6;
const RACE_PAYOUTS: [i32; 2] = [5, 3];
const RACE_LOSS: i32 = -3;
const NUNCHI_REWARD: i32 = 5;
const NUNCHI_PENALTY: i32 = -3;

/// Number of horses in the race.
pub const HORSE_COUNT: usize = 3;
/// Track lengths shown alongside horse positions.
pub const HORSE_LENGTHS: [u32; HORSE_COUNT] = [9, 8, 7];

/// Action half of a race choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceAction {
    /// Move the horse forward one step.
    Boost,
    /// Move the horse back one step.
    Sabotage,
}

/// Minigame memory a single player carries across rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerCounters {
    /// Position on the circular track.
    pub track_position: u32,
    /// Last race action that was actually applied.
    pub last_race_action: Option<RaceAction>,
}

/// Minigame-private state persisted for a whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinigameTable {
    /// Race horse positions, floored at 0.
    pub horse_positions: [u32; HORSE_COUNT],
    /// Constant track length per horse.
    pub horse_lengths: [u32; HORSE_COUNT],
    /// Whether the latest Nunchi round produced a result.
    pub nunchi_resolved: bool,
    /// Per-player counters, created on first use.
    pub counters: HashMap<PlayerId, PlayerCounters>,
}

impl Default for MinigameTable {
    fn default() -> Self {
        Self {
            horse_positions: [0; HORSE_COUNT],
            horse_lengths: HORSE_LENGTHS,
            nunchi_resolved: false,
            counters: HashMap::new(),
        }
    }
}

/// Score one round of `minigame`.
///
/// The returned map holds an entry for every key of `choices`.
pub fn score_round(minigame: Minigame, choices: &Choices, table: &mut MinigameTable) -> Deltas {
    match minigame {
        Minigame::TraitorSplit => traitor_split(choices),
        Minigame::Match123 => match_123(choices),
        Minigame::SecretAuction => secret_auction(choices),
        Minigame::CircularTrack => circular_track(choices, &mut table.counters),
        Minigame::Race => race(choices, &mut table.horse_positions, &mut table.counters),
        Minigame::TimingButton => timing_button(choices),
        Minigame::OxPsychology => ox_psychology(choices),
        Minigame::Nunchi => {
            let (deltas, resolved) = nunchi(choices);
            table.nunchi_resolved = resolved;
            deltas
        }
    }
}

/// Traitors split six points; everyone else who submitted loses three.
pub fn traitor_split(choices: &Choices) -> Deltas {
    let mut deltas = zeroed(choices);
    let traitors = submitted(choices)
        .filter(|(_, choice)| is_betrayal(choice))
        .count();
    if traitors == 0 {
        return deltas;
    }

    let gain = TRAITOR_POT / traitors as i32;
    for (player, choice) in submitted(choices) {
        let delta = if is_betrayal(choice) {
            gain
        } else {
            LOYALIST_PENALTY
        };
        deltas.insert(player.clone(), delta);
    }
    deltas
}

/// Pairs score, crowds of three or more lose, and an all-distinct field loses one each.
pub fn match_123(choices: &Choices) -> Deltas {
    let mut deltas = zeroed(choices);
    let picks = numeric_picks(choices, 1..=3);
    if picks.is_empty() {
        return deltas;
    }

    let tally = tally(&picks);
    if tally.len() == picks.len() {
        for (player, _) in picks {
            deltas.insert(player.clone(), ALL_DISTINCT_PENALTY);
        }
        return deltas;
    }

    for (player, value) in picks {
        let delta = match tally[&value] {
            2 => PAIR_REWARD,
            n if n >= 3 => CROWD_PENALTY,
            _ => 0,
        };
        deltas.insert(player.clone(), delta);
    }
    deltas
}

/// The highest bid placed by exactly one player wins six points.
pub fn secret_auction(choices: &Choices) -> Deltas {
    let mut deltas = zeroed(choices);
    let picks = numeric_picks(choices, 0..=5);

    for bid in (0..=5).rev() {
        let mut bidders = picks.iter().filter(|(_, value)| *value == bid);
        if let (Some((winner, _)), None) = (bidders.next(), bidders.next()) {
            deltas.insert((*winner).clone(), AUCTION_REWARD);
            break;
        }
    }
    deltas
}

/// Only players who picked the majority move advance; landing exactly on the goal scores.
///
/// Ties between equally popular moves go to the smallest move.
pub fn circular_track(
    choices: &Choices,
    counters: &mut HashMap<PlayerId, PlayerCounters>,
) -> Deltas {
    let mut deltas = zeroed(choices);
    let picks = numeric_picks(choices, 0..=3);
    let tally = tally(&picks);

    let mut majority: Option<(u32, usize)> = None;
    for value in 0..=3 {
        let count = tally.get(&value).copied().unwrap_or(0);
        if count > 0 && majority.is_none_or(|(_, best)| count > best) {
            majority = Some((value, count));
        }
    }
    let Some((step, _)) = majority else {
        return deltas;
    };

    for (player, value) in picks {
        if value != step {
            continue;
        }
        let entry = counters.entry(player.clone()).or_default();
        entry.track_position += step;
        if entry.track_position == TRACK_GOAL {
            deltas.insert(player.clone(), TRACK_REWARD);
            entry.track_position = 0;
        } else if entry.track_position > TRACK_GOAL {
            entry.track_position = 0;
        }
    }
    deltas
}

/// Apply boosts and sabotages, then pay out by the rank of the horse each player named.
///
/// A sabotage right after the same player's previous sabotage is ignored.
pub fn race(
    choices: &Choices,
    positions: &mut [u32; HORSE_COUNT],
    counters: &mut HashMap<PlayerId, PlayerCounters>,
) -> Deltas {
    let mut deltas = zeroed(choices);
    let mut moves = [0i64; HORSE_COUNT];

    for (player, choice) in submitted(choices) {
        let Some((horse, action)) = parse_race_move(choice) else {
            continue;
        };
        let entry = counters.entry(player.clone()).or_default();
        if action == RaceAction::Sabotage && entry.last_race_action == Some(RaceAction::Sabotage)
        {
            continue;
        }
        moves[horse] += match action {
            RaceAction::Boost => 1,
            RaceAction::Sabotage => -1,
        };
        entry.last_race_action = Some(action);
    }

    for (position, delta) in positions.iter_mut().zip(moves) {
        *position = (i64::from(*position) + delta).max(0) as u32;
    }

    let mut ranking: Vec<usize> = (0..HORSE_COUNT).collect();
    ranking.sort_by(|a, b| positions[*b].cmp(&positions[*a]));

    for (player, choice) in submitted(choices) {
        let place = parse_horse(choice).and_then(|horse| ranking.iter().position(|h| *h == horse));
        let delta = place
            .and_then(|place| RACE_PAYOUTS.get(place).copied())
            .unwrap_or(RACE_LOSS);
        deltas.insert(player.clone(), delta);
    }
    deltas
}

/// Clickers share a signed score: the clicker count, negative when even.
pub fn timing_button(choices: &Choices) -> Deltas {
    let mut deltas = zeroed(choices);
    let clickers: Vec<&PlayerId> = submitted(choices)
        .filter(|(_, choice)| choice.to_lowercase().contains("click"))
        .map(|(player, _)| player)
        .collect();
    if clickers.is_empty() {
        return deltas;
    }

    let count = clickers.len() as i32;
    let score = if count % 2 == 0 { -count } else { count };
    for player in clickers {
        deltas.insert(player.clone(), score);
    }
    deltas
}

/// Placeholder rule: nobody scores.
pub fn ox_psychology(choices: &Choices) -> Deltas {
    zeroed(choices)
}

/// A lone "yes" scores five; a crowd of them loses three each.
///
/// Also reports whether the round produced a result (at least one "yes").
pub fn nunchi(choices: &Choices) -> (Deltas, bool) {
    let mut deltas = zeroed(choices);
    let yes: Vec<&PlayerId> = submitted(choices)
        .filter(|(_, choice)| is_affirmative(choice))
        .map(|(player, _)| player)
        .collect();

    match yes.as_slice() {
        [] => (deltas, false),
        [only] => {
            deltas.insert((*only).clone(), NUNCHI_REWARD);
            (deltas, true)
        }
        crowd => {
            for player in crowd {
                deltas.insert((*player).clone(), NUNCHI_PENALTY);
            }
            (deltas, true)
        }
    }
}

fn zeroed(choices: &Choices) -> Deltas {
    choices.keys().map(|player| (player.clone(), 0)).collect()
}

/// Non-empty choices, trimmed.
fn submitted(choices: &Choices) -> impl Iterator<Item = (&PlayerId, &str)> {
    choices.iter().filter_map(|(player, choice)| {
        let choice = choice.as_deref()?.trim();
        (!choice.is_empty()).then_some((player, choice))
    })
}

fn numeric_picks(choices: &Choices, range: RangeInclusive<u32>) -> Vec<(&PlayerId, u32)> {
    submitted(choices)
        .filter_map(|(player, choice)| {
            choice
                .parse::<u32>()
                .ok()
                .filter(|value| range.contains(value))
                .map(|value| (player, value))
        })
        .collect()
}

fn tally(picks: &[(&PlayerId, u32)]) -> HashMap<u32, usize> {
    let mut counts = HashMap::new();
    for (_, value) in picks {
        *counts.entry(*value).or_insert(0) += 1;
    }
    counts
}

fn is_betrayal(choice: &str) -> bool {
    choice.contains("배신") || choice.to_lowercase().contains("betray")
}

fn is_affirmative(choice: &str) -> bool {
    choice.contains('예') || choice.eq_ignore_ascii_case("yes")
}

/// Zero-based horse index from the first token (`horse1`..`horse3`).
fn parse_horse(choice: &str) -> Option<usize> {
    let token = choice.split_whitespace().next()?.to_lowercase();
    let index = token.strip_prefix("horse")?.parse::<usize>().ok()?;
    (1..=HORSE_COUNT).contains(&index).then(|| index - 1)
}

fn parse_race_move(choice: &str) -> Option<(usize, RaceAction)> {
    let parts: Vec<String> = choice.split_whitespace().map(str::to_lowercase).collect();
    let [_, action] = parts.as_slice() else {
        return None;
    };
    let action = match action.as_str() {
        "boost" => RaceAction::Boost,
        "sabotage" => RaceAction::Sabotage,
        _ => return None,
    };
    Some((parse_horse(choice)?, action))
}
