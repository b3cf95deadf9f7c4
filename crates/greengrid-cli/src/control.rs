//! Operator commands read from stdin between ticks.
//!
//! Parsing is lenient: anything that does not match a known command with
//! valid non-negative integer arguments is ignored.

/// A command that mutates the simulation from outside the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Add load to the fleet, index-first.
    Inject(u32),
    /// Remove load from the fleet, last node first.
    Remove(u32),
    /// Add `amount` to incoming load for `ticks` ticks.
    Stress { amount: u32, ticks: u32 },
    /// Flip whether the consolidation agent runs each tick.
    ToggleAgent,
}

/// Parse one input line. Returns `None` for anything malformed.
pub fn parse(line: &str) -> Option<ControlCommand> {
    let lowered = line.trim().to_lowercase();
    let mut parts = lowered.split_whitespace();
    let verb = parts.next()?;

    match verb {
        "toggle" => Some(ControlCommand::ToggleAgent),
        "add" | "inject" => Some(ControlCommand::Inject(parts.next()?.parse().ok()?)),
        "remove" | "kill" => Some(ControlCommand::Remove(parts.next()?.parse().ok()?)),
        "stress" => {
            let amount = parts.next()?.parse().ok()?;
            let ticks = parts.next()?.parse().ok()?;
            Some(ControlCommand::Stress { amount, ticks })
        }
        _ => None,
    }
}
