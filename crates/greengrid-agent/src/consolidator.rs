//! Consolidation agent — packs load onto fewer nodes.
//!
//! The agent is either cooling down (cooldown > 0) or ready. A cooling tick
//! only counts down and never looks at the fleet. A ready tick that finds no
//! migration target costs nothing: the agent stays ready for the next one.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use greengrid_core::NodeId;
use greengrid_fleet::FleetEngine;

/// Ticks the agent waits after a migration.
pub const DEFAULT_COOLDOWN_TICKS: u32 = 3;

/// Something the agent did to the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    /// Load moved from one node to another.
    Migrated { amount: u32, from: NodeId, to: NodeId },
    /// A node was emptied and will sleep.
    Sleeping { node: NodeId },
}

impl std::fmt::Display for AgentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Migrated { amount, from, to } => {
                write!(f, "MIGRATED {amount}% from S{from} -> S{to}")
            }
            Self::Sleeping { node } => write!(f, "Server {node} is entering SLEEP MODE."),
        }
    }
}

/// Greedy consolidation agent with a post-migration cooldown.
#[derive(Debug, Clone)]
pub struct ConsolidationAgent {
    cooldown_ticks: u32,
    cooldown_after_migration: u32,
}

impl ConsolidationAgent {
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN_TICKS)
    }

    /// Create an agent that waits `ticks` after each migration.
    pub fn with_cooldown(ticks: u32) -> Self {
        Self {
            cooldown_ticks: 0,
            cooldown_after_migration: ticks,
        }
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_ticks
    }

    pub fn is_cooling(&self) -> bool {
        self.cooldown_ticks > 0
    }

    /// Evaluate the fleet once and migrate at most one node's load.
    ///
    /// Returns the actions taken, or `None` when cooling down or when no
    /// consolidation is possible.
    pub fn optimize(&mut self, fleet: &mut FleetEngine) -> Option<Vec<AgentAction>> {
        if self.cooldown_ticks > 0 {
            self.cooldown_ticks -= 1;
            return None;
        }

        let mut active: Vec<NodeId> = fleet
            .nodes()
            .iter()
            .filter(|n| n.load() > 0)
            .map(|n| n.id())
            .collect();

        if active.len() < 2 {
            return None;
        }

        // Stable: equal loads keep ascending id order.
        active.sort_by_key(|&id| fleet.node(id).load());

        let victim = active[0];
        let victim_load = fleet.node(victim).load();

        for &target in active.iter().rev() {
            if target == victim {
                continue;
            }
            if fleet.node(target).spare_capacity() < victim_load {
                continue;
            }

            if fleet.request_transfer(victim, target, victim_load) {
                self.cooldown_ticks = self.cooldown_after_migration;
                info!(
                    from = victim,
                    to = target,
                    amount = victim_load,
                    cooldown = self.cooldown_ticks,
                    "consolidated node"
                );
                return Some(vec![
                    AgentAction::Migrated {
                        amount: victim_load,
                        from: victim,
                        to: target,
                    },
                    AgentAction::Sleeping { node: victim },
                ]);
            }
        }

        debug!(victim, load = victim_load, "no consolidation target with enough room");
        None
    }
}

impl Default for ConsolidationAgent {
    fn default() -> Self {
        Self::new()
    }
}
