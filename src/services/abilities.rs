//! Ability engine: validates an invocation and records its effect.
//!
//! Overlay abilities only touch the round's [`EffectOverlay`]; Lock writes the
//! session-wide lock set; read-only abilities just report. The caller marks
//! the ability as spent once [`invoke`] succeeds.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;

use crate::{
    error::ServiceError,
    state::game::{Ability, EffectOverlay, Player, PlayerId, RoundLogEntry},
};

/// An ability request as received from a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Ability the caster claims to hold.
    pub ability: Ability,
    /// Target player, when the ability needs one.
    pub target: Option<PlayerId>,
    /// Forced value for Intervention.
    pub value: Option<String>,
}

/// Session pieces an invocation may read or write.
pub struct AbilityContext<'a> {
    /// Roster in join order.
    pub roster: &'a IndexMap<PlayerId, Player>,
    /// Round logs per player.
    pub logs: &'a HashMap<PlayerId, Vec<RoundLogEntry>>,
    /// Players blocked by Lock for the rest of the game.
    pub locks: &'a mut HashSet<PlayerId>,
    /// Current round's overlay.
    pub overlay: &'a mut EffectOverlay,
}

/// What an accepted invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbilityEffect {
    /// The overlay changed; nothing to report beyond the confirmation.
    Recorded,
    /// Lock landed; tells the caster whether the target had already spent their ability.
    Locked {
        /// Locked player.
        target: PlayerId,
        /// Whether the target's ability was already used.
        target_used: bool,
    },
    /// Caster's round log, addressed to another player.
    Shared {
        /// Player receiving the log.
        recipient: PlayerId,
        /// Caster's log lines.
        entries: Vec<RoundLogEntry>,
    },
    /// Whether the scanned player still holds an unused ability.
    Scanned {
        /// Scanned player.
        target: PlayerId,
        /// True while the target's ability is unused.
        unused: bool,
    },
    /// Ability kinds in play and the number of players.
    MetaView {
        /// Distinct ability kinds among the roster.
        kinds: Vec<Ability>,
        /// Roster size.
        player_count: usize,
    },
}

/// Validate `invocation` for `caster` and apply its effect.
///
/// All checks run before anything is written, so a rejected invocation leaves
/// the context untouched.
pub fn invoke(
    ctx: AbilityContext<'_>,
    caster: &str,
    invocation: Invocation,
) -> Result<AbilityEffect, ServiceError> {
    let player = ctx
        .roster
        .get(caster)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{caster}` is not in this game")))?;

    if player.ability != Some(invocation.ability) {
        return Err(ServiceError::AbilityViolation(format!(
            "`{}` is not your ability",
            invocation.ability
        )));
    }
    if player.ability_used {
        return Err(ServiceError::AbilityViolation(
            "your ability has already been used".into(),
        ));
    }
    if ctx.locks.contains(caster) {
        return Err(ServiceError::AbilityViolation(
            "your ability is blocked by Lock".into(),
        ));
    }

    let Invocation {
        ability,
        target,
        value,
    } = invocation;

    let effect = match ability {
        Ability::Intervention => {
            let target = require_target(ctx.roster, ability, target)?;
            let value = value
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    ServiceError::ArgumentMissing("intervention needs a forced value".into())
                })?;
            ctx.overlay.interventions.insert(target, value);
            AbilityEffect::Recorded
        }
        Ability::Blackout => {
            ctx.overlay.blackout = true;
            AbilityEffect::Recorded
        }
        Ability::Assimilation => {
            let target = require_target(ctx.roster, ability, target)?;
            ctx.overlay
                .assimilations
                .insert(caster.to_string(), target);
            AbilityEffect::Recorded
        }
        Ability::Lock => {
            let target = require_target(ctx.roster, ability, target)?;
            let target_used = ctx.roster[&target].ability_used;
            ctx.locks.insert(target.clone());
            AbilityEffect::Locked {
                target,
                target_used,
            }
        }
        Ability::Mask => {
            ctx.overlay.masked.insert(caster.to_string());
            AbilityEffect::Recorded
        }
        Ability::Share => {
            let recipient = require_target(ctx.roster, ability, target)?;
            let entries = ctx.logs.get(caster).cloned().unwrap_or_default();
            AbilityEffect::Shared { recipient, entries }
        }
        Ability::Scan => {
            let target = require_target(ctx.roster, ability, target)?;
            let unused = !ctx.roster[&target].ability_used;
            AbilityEffect::Scanned { target, unused }
        }
        Ability::MetaView => {
            let kinds: BTreeSet<Ability> = ctx
                .roster
                .values()
                .filter_map(|player| player.ability)
                .collect();
            AbilityEffect::MetaView {
                kinds: kinds.into_iter().collect(),
                player_count: ctx.roster.len(),
            }
        }
    };

    Ok(effect)
}

fn require_target(
    roster: &IndexMap<PlayerId, Player>,
    ability: Ability,
    target: Option<PlayerId>,
) -> Result<PlayerId, ServiceError> {
    let target = target
        .map(|target| target.trim().to_string())
        .filter(|target| !target.is_empty())
        .ok_or_else(|| ServiceError::ArgumentMissing(format!("{ability} needs a target player")))?;
    if !roster.contains_key(&target) {
        return Err(ServiceError::NotFound(format!(
            "target `{target}` is not in this game"
        )));
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::Minigame;

    struct Fixture {
        roster: IndexMap<PlayerId, Player>,
        logs: HashMap<PlayerId, Vec<RoundLogEntry>>,
        locks: HashSet<PlayerId>,
        overlay: EffectOverlay,
    }

    impl Fixture {
        fn new() -> Self {
            let abilities = [Ability::Intervention, Ability::Lock, Ability::Share, Ability::MetaView];
            let roster = ["a", "b", "c", "d"]
                .into_iter()
                .zip(abilities)
                .map(|(id, ability)| {
                    let mut player = Player::new(id.into(), id.to_uppercase());
                    player.ability = Some(ability);
                    (id.to_string(), player)
                })
                .collect();
            Self {
                roster,
                logs: HashMap::new(),
                locks: HashSet::new(),
                overlay: EffectOverlay::default(),
            }
        }

        fn invoke(
            &mut self,
            caster: &str,
            ability: Ability,
            target: Option<&str>,
            value: Option<&str>,
        ) -> Result<AbilityEffect, ServiceError> {
            invoke(
                AbilityContext {
                    roster: &self.roster,
                    logs: &self.logs,
                    locks: &mut self.locks,
                    overlay: &mut self.overlay,
                },
                caster,
                Invocation {
                    ability,
                    target: target.map(str::to_string),
                    value: value.map(str::to_string),
                },
            )
        }
    }

    #[test]
    fn intervention_forces_target_choice() {
        let mut fx = Fixture::new();
        let effect = fx
            .invoke("a", Ability::Intervention, Some("b"), Some(" 배신 "))
            .unwrap();
        assert_eq!(effect, AbilityEffect::Recorded);
        assert_eq!(fx.overlay.interventions["b"], "배신");
    }

    #[test]
    fn mismatched_ability_is_rejected() {
        let mut fx = Fixture::new();
        let err = fx.invoke("a", Ability::Blackout, None, None).unwrap_err();
        assert_eq!(err.kind(), "ability_violation");
        assert_eq!(fx.overlay, EffectOverlay::default());
    }

    #[test]
    fn missing_arguments_leave_overlay_untouched() {
        let mut fx = Fixture::new();
        let err = fx
            .invoke("a", Ability::Intervention, Some("b"), None)
            .unwrap_err();
        assert_eq!(err.kind(), "argument_missing");

        let err = fx.invoke("b", Ability::Lock, None, None).unwrap_err();
        assert_eq!(err.kind(), "argument_missing");
        assert!(fx.locks.is_empty());
        assert_eq!(fx.overlay, EffectOverlay::default());
    }

    #[test]
    fn unknown_target_is_not_found() {
        let mut fx = Fixture::new();
        let err = fx.invoke("b", Ability::Lock, Some("zed"), None).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn used_ability_is_rejected() {
        let mut fx = Fixture::new();
        fx.roster.get_mut("a").unwrap().ability_used = true;
        let err = fx
            .invoke("a", Ability::Intervention, Some("b"), Some("1"))
            .unwrap_err();
        assert_eq!(err.kind(), "ability_violation");
    }

    #[test]
    fn lock_reports_and_blocks_target() {
        let mut fx = Fixture::new();
        fx.roster.get_mut("a").unwrap().ability_used = true;
        let effect = fx.invoke("b", Ability::Lock, Some("c"), None).unwrap();
        assert_eq!(
            effect,
            AbilityEffect::Locked {
                target: "c".into(),
                target_used: false
            }
        );

        let err = fx.invoke("c", Ability::Share, Some("a"), None).unwrap_err();
        assert_eq!(err.kind(), "ability_violation");
    }

    #[test]
    fn share_hands_over_caster_log() {
        let mut fx = Fixture::new();
        let entry = RoundLogEntry {
            round: 1,
            minigame: Minigame::Race,
            choice: Some("horse1 boost".into()),
            delta: 5,
            total: 5,
        };
        fx.logs.insert("c".into(), vec![entry.clone()]);

        let effect = fx.invoke("c", Ability::Share, Some("d"), None).unwrap();
        assert_eq!(
            effect,
            AbilityEffect::Shared {
                recipient: "d".into(),
                entries: vec![entry]
            }
        );
    }

    #[test]
    fn metaview_lists_distinct_kinds() {
        let mut fx = Fixture::new();
        let effect = fx.invoke("d", Ability::MetaView, None, None).unwrap();
        assert_eq!(
            effect,
            AbilityEffect::MetaView {
                kinds: vec![
                    Ability::Intervention,
                    Ability::Lock,
                    Ability::Share,
                    Ability::MetaView
                ],
                player_count: 4
            }
        );
    }

    #[test]
    fn scan_reports_whether_target_ability_is_spent() {
        let mut fx = Fixture::new();
        fx.roster.get_mut("d").unwrap().ability = Some(Ability::Scan);
        fx.roster.get_mut("a").unwrap().ability_used = true;

        let effect = fx.invoke("d", Ability::Scan, Some("a"), None).unwrap();
        assert_eq!(
            effect,
            AbilityEffect::Scanned {
                target: "a".into(),
                unused: false
            }
        );

        let mut fx = Fixture::new();
        fx.roster.get_mut("d").unwrap().ability = Some(Ability::Scan);
        let effect = fx.invoke("d", Ability::Scan, Some("b"), None).unwrap();
        assert_eq!(
            effect,
            AbilityEffect::Scanned {
                target: "b".into(),
                unused: true
            }
        );
        assert!(fx.locks.is_empty());
        assert_eq!(fx.overlay, EffectOverlay::default());
    }

    #[test]
    fn mask_marks_only_the_caster() {
        let mut fx = Fixture::new();
        fx.roster.get_mut("c").unwrap().ability = Some(Ability::Mask);

        let effect = fx.invoke("c", Ability::Mask, None, None).unwrap();
        assert_eq!(effect, AbilityEffect::Recorded);
        assert_eq!(
            fx.overlay,
            EffectOverlay {
                masked: HashSet::from(["c".to_string()]),
                ..EffectOverlay::default()
            }
        );
        assert!(fx.locks.is_empty());
    }
}
