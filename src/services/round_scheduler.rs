//! Round deadlines.
//!
//! A deadline is never cancelled. It captures the round it was armed for and
//! re-checks the session when it fires; a round that already resolved, a
//! session that moved on, or a session that left the registry all make the
//! firing a no-op.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    services::game_service,
    state::{SessionHandle, SharedState},
};

/// Arm the deadline of `round` for the session behind `handle`.
pub fn arm(state: SharedState, scope: String, handle: SessionHandle, round: u8) -> JoinHandle<()> {
    let deadline = state.config().round_duration();
    debug!(scope = %scope, round, secs = deadline.as_secs(), "round deadline armed");

    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;

        let still_registered = state
            .session(&scope)
            .is_ok_and(|current| Arc::ptr_eq(&current, &handle));
        if !still_registered {
            debug!(scope = %scope, round, "deadline fired for a removed session");
            return;
        }

        let outcome = {
            let mut session = handle.lock().await;
            match session.resolve(round, false) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(scope = %scope, round, error = %err, "deadline resolution failed");
                    return;
                }
            }
        };

        if outcome.is_empty() {
            debug!(scope = %scope, round, "stale deadline ignored");
            return;
        }

        info!(scope = %scope, round, "round closed by deadline");
        game_service::dispatch(&state, &scope, &handle, outcome);
    })
}
