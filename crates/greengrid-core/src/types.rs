//! Shared domain types for GreenGrid.
//!
//! `FleetMetrics` is the per-tick snapshot the fleet engine hands to the
//! forecaster and to whatever presents the simulation.

use serde::{Deserialize, Serialize};

/// Index of a node within the fleet. Stable for the fleet's lifetime.
pub type NodeId = usize;

/// Full capacity of a single node, in load percent.
pub const NODE_CAPACITY: u32 = 100;

/// Minutes in a simulated day. One tick is one simulated minute.
pub const TICKS_PER_DAY: u64 = 1440;

/// Node power state, derived from load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Active,
    Sleep,
}

impl NodeStatus {
    /// `Sleep` exactly when the node carries no load.
    pub fn from_load(load: u32) -> Self {
        if load > 0 { Self::Active } else { Self::Sleep }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Sleep => write!(f, "SLEEP"),
        }
    }
}

// ── Snapshots ──────────────────────────────────────────────────────

/// Telemetry for one node at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub id: NodeId,
    /// Load percent, 0..=100.
    pub load: u32,
    /// Memory usage percent.
    pub memory: f64,
    /// Temperature in °C.
    pub temperature: f64,
    pub status: NodeStatus,
    pub power_w: f64,
}

/// Fleet-wide snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetMetrics {
    /// Ticks elapsed since the fleet was created.
    pub clock: u64,
    pub total_power_w: f64,
    /// Exogenous load generated on the most recent tick.
    pub incoming_load: u32,
    /// gCO2/kWh.
    pub carbon_intensity: f64,
    pub nodes: Vec<NodeMetrics>,
}

impl FleetMetrics {
    /// Sum of per-node load.
    pub fn total_load(&self) -> u32 {
        self.nodes.iter().map(|n| n.load).sum()
    }

    pub fn active_nodes(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Active)
            .count()
    }
}
