//! Replays commands against the graphing surface.

use super::{GraphingSurface, SurfaceError, SurfaceSlot};
use crate::command::Command;
use tracing::{debug, error, warn};

/// A command the surface rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyFault {
    pub index: usize,
    pub command: Command,
    pub reason: SurfaceError,
}

/// Outcome of one [`apply`] call, by position in the command list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub applied: Vec<usize>,
    pub failed: Vec<ApplyFault>,
    /// Commands with an unrecognized kind.
    pub skipped: Vec<usize>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Applies `commands` in order against the loaded surface.
///
/// Nothing happens if the surface is not loaded or the list is empty. A
/// command that fails does not stop the ones after it.
pub fn apply(slot: &SurfaceSlot, commands: &[Command]) -> ApplyReport {
    let mut report = ApplyReport::default();
    if commands.is_empty() {
        return report;
    }
    let Some(surface) = slot.get() else {
        warn!(
            count = commands.len(),
            "Graphing surface not loaded; dropping commands."
        );
        return report;
    };

    debug!(count = commands.len(), "Applying commands to graphing surface.");
    for (index, command) in commands.iter().enumerate() {
        match dispatch(surface.as_ref(), command) {
            Some(Ok(())) => report.applied.push(index),
            Some(Err(e)) => {
                error!(index, ?command, error = %e, "Failed to apply command.");
                report.failed.push(ApplyFault {
                    index,
                    command: command.clone(),
                    reason: e,
                });
            }
            None => {
                warn!(index, kind = command.kind(), "Unknown command; skipping.");
                report.skipped.push(index);
            }
        }
    }
    report
}

/// Routes one command to its surface primitive. `None` for unknown kinds.
fn dispatch(surface: &dyn GraphingSurface, command: &Command) -> Option<Result<(), SurfaceError>> {
    let result = match command {
        Command::SetValue { object, value } => surface.set_value(object, *value),
        Command::SetVisible { object, value } => surface.set_visible(object, *value),
        Command::SetPoint { object, value } => surface.set_coords(object, value.x, value.y),
        Command::EvalCommand { value } => surface.eval_command(value),
        Command::Unknown { .. } => return None,
    };
    Some(result)
}
