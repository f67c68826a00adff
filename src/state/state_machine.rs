use thiserror::Error;

use crate::state::game::TOTAL_ROUNDS;

/// High-level phases a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Players are joining; nothing has been drawn yet.
    Lobby,
    /// Rounds are being played. `round` is 0 only between start and the first round.
    Running {
        /// Current round number.
        round: u8,
    },
    /// Final ranking has been produced; the session no longer mutates.
    Finished,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Host starts the game from the lobby.
    Start,
    /// Open the next round.
    NextRound,
    /// Close the game after the last round.
    Finish,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// State machine driving one session through lobby, rounds and finish.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Lobby,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Current round number: 0 in the lobby, the last played round once finished.
    pub fn round(&self) -> u8 {
        match self.phase {
            GamePhase::Lobby => 0,
            GamePhase::Running { round } => round,
            GamePhase::Finished => TOTAL_ROUNDS,
        }
    }

    /// Validate and apply `event`, returning the new phase.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Lobby, GameEvent::Start) => GamePhase::Running { round: 0 },
            (GamePhase::Running { round }, GameEvent::NextRound) if round < TOTAL_ROUNDS => {
                GamePhase::Running { round: round + 1 }
            }
            (GamePhase::Running { round }, GameEvent::Finish) if round == TOTAL_ROUNDS => {
                GamePhase::Finished
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_lobby() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), GamePhase::Lobby);
        assert_eq!(sm.round(), 0);
    }

    #[test]
    fn full_happy_path_through_game() {
        let mut sm = GameStateMachine::new();

        assert_eq!(
            sm.apply(GameEvent::Start).unwrap(),
            GamePhase::Running { round: 0 }
        );
        for expected in 1..=TOTAL_ROUNDS {
            assert_eq!(
                sm.apply(GameEvent::NextRound).unwrap(),
                GamePhase::Running { round: expected }
            );
        }
        assert_eq!(sm.apply(GameEvent::Finish).unwrap(), GamePhase::Finished);
        assert_eq!(sm.round(), TOTAL_ROUNDS);
    }

    #[test]
    fn round_never_exceeds_total() {
        let mut sm = GameStateMachine::new();
        sm.apply(GameEvent::Start).unwrap();
        for _ in 0..TOTAL_ROUNDS {
            sm.apply(GameEvent::NextRound).unwrap();
        }

        let err = sm.apply(GameEvent::NextRound).unwrap_err();
        assert_eq!(err.from, GamePhase::Running { round: TOTAL_ROUNDS });
        assert_eq!(sm.round(), TOTAL_ROUNDS);
    }

    #[test]
    fn finish_requires_last_round() {
        let mut sm = GameStateMachine::new();
        sm.apply(GameEvent::Start).unwrap();
        sm.apply(GameEvent::NextRound).unwrap();

        let err = sm.apply(GameEvent::Finish).unwrap_err();
        assert_eq!(err.event, GameEvent::Finish);
        assert_eq!(sm.phase(), GamePhase::Running { round: 1 });
    }

    #[test]
    fn finished_is_terminal() {
        let mut sm = GameStateMachine::new();
        sm.apply(GameEvent::Start).unwrap();
        for _ in 0..TOTAL_ROUNDS {
            sm.apply(GameEvent::NextRound).unwrap();
        }
        sm.apply(GameEvent::Finish).unwrap();

        for event in [GameEvent::Start, GameEvent::NextRound, GameEvent::Finish] {
            let err = sm.apply(event).unwrap_err();
            assert_eq!(err.from, GamePhase::Finished);
        }
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = GameStateMachine::new();
        let err = sm.apply(GameEvent::NextRound).unwrap_err();
        assert_eq!(err.from, GamePhase::Lobby);
        assert_eq!(err.event, GameEvent::NextRound);
        assert_eq!(sm.phase(), GamePhase::Lobby);
    }
}
