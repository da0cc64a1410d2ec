pub mod attendance;
pub mod backup;
pub mod card;
pub mod config;
pub mod core;
pub mod session;
pub mod stats;
pub mod students;
pub mod sync;

use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::sync::lock_tracker;
use crate::tracker::Tracker;

/// Run `f` against the open workspace, or fail with `no_workspace`.
pub fn with_tracker<T>(
    state: &AppState,
    f: impl FnOnce(&mut Tracker) -> Result<T, HandlerErr>,
) -> Result<T, HandlerErr> {
    let mut guard = lock_tracker(&state.tracker);
    let Some(tracker) = guard.as_mut() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    f(tracker)
}
