//! Fleet engine — owns the nodes and advances simulated time.
//!
//! The engine is the only writer of node state. Load enters through
//! `distribute_load` (index-first fill), leaves through `reclaim_load`
//! (reverse index order) or task completion, and moves between nodes only
//! through `request_transfer`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use greengrid_core::config::FleetConfig;
use greengrid_core::{FleetMetrics, NODE_CAPACITY, NodeId};

use crate::generator::DiurnalLoad;
use crate::node::{Node, PowerModel};

/// Pending synthetic load spike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StressTest {
    amount: u32,
    ticks_remaining: u32,
}

/// The simulated fleet.
#[derive(Debug)]
pub struct FleetEngine {
    nodes: Vec<Node>,
    clock: u64,
    carbon_intensity: f64,
    last_incoming_load: u32,
    stress: StressTest,
    generator: DiurnalLoad,
    rng: StdRng,
}

impl FleetEngine {
    /// Create a fleet of sleeping nodes. `seed` drives every noise source.
    pub fn new(config: &FleetConfig, seed: u64) -> Self {
        let power = PowerModel {
            idle_w: config.idle_power_w,
            max_w: config.max_power_w,
        };
        Self {
            nodes: (0..config.node_count).map(|id| Node::new(id, power)).collect(),
            clock: 0,
            carbon_intensity: config.carbon_low,
            last_incoming_load: 0,
            stress: StressTest::default(),
            generator: DiurnalLoad::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replace the workload curve.
    pub fn with_generator(mut self, generator: DiurnalLoad) -> Self {
        self.generator = generator;
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Panics if `id` is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn carbon_intensity(&self) -> f64 {
        self.carbon_intensity
    }

    pub fn set_carbon_intensity(&mut self, value: f64) {
        self.carbon_intensity = value;
    }

    pub fn last_incoming_load(&self) -> u32 {
        self.last_incoming_load
    }

    pub fn stress_ticks_remaining(&self) -> u32 {
        self.stress.ticks_remaining
    }

    pub fn total_load(&self) -> u32 {
        self.nodes.iter().map(Node::load).sum()
    }

    pub fn total_capacity(&self) -> u32 {
        NODE_CAPACITY * self.nodes.len() as u32
    }

    pub fn total_power(&self) -> f64 {
        self.nodes.iter().map(Node::power_draw).sum()
    }

    /// Fill nodes in index order. Whatever does not fit is dropped.
    pub fn distribute_load(&mut self, amount: u32) {
        let mut remaining = amount;
        for node in &mut self.nodes {
            if remaining == 0 {
                break;
            }
            remaining = node.absorb_load(remaining);
        }
        if remaining > 0 {
            debug!(requested = amount, dropped = remaining, "fleet saturated, load dropped");
        }
    }

    /// Remove load starting from the highest index. Excess is discarded.
    pub fn reclaim_load(&mut self, amount: u32) {
        let mut remaining = amount;
        for node in self.nodes.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            if node.load() > 0 {
                remaining -= node.remove_load(remaining);
                node.update_derived_stats(&mut self.rng);
            }
        }
        if remaining > 0 {
            debug!(requested = amount, discarded = remaining, "reclaim exceeded fleet load");
        }
    }

    /// Move up to `amount` from `from` to `to`.
    ///
    /// The amount is clamped to the source's load and the destination's
    /// spare capacity. Returns `false`, leaving both nodes untouched, when
    /// nothing can move. Panics if either id is out of range.
    pub fn request_transfer(&mut self, from: NodeId, to: NodeId, amount: u32) -> bool {
        let movable = amount
            .min(self.nodes[from].load())
            .min(self.nodes[to].spare_capacity());
        if movable == 0 || from == to {
            return false;
        }

        self.nodes[from].remove_load(movable);
        self.nodes[to].absorb_load(movable);
        debug!(from, to, amount = movable, "load transferred");
        true
    }

    /// Add `amount` to incoming load for the next `duration_ticks` ticks.
    ///
    /// Replaces any stress test already pending.
    pub fn schedule_stress_test(&mut self, amount: u32, duration_ticks: u32) {
        self.stress = StressTest {
            amount,
            ticks_remaining: duration_ticks,
        };
        info!(amount, duration_ticks, "stress test scheduled");
    }

    /// Advance the fleet by one tick.
    pub fn advance_tick(&mut self) {
        for node in &mut self.nodes {
            node.drain_completed_work(&mut self.rng);
        }

        let mut incoming = self.generator.incoming(self.clock, &mut self.rng);

        if self.stress.ticks_remaining > 0 {
            incoming = incoming.saturating_add(self.stress.amount);
            self.stress.ticks_remaining -= 1;
        }

        self.last_incoming_load = incoming;
        self.distribute_load(incoming);
        self.clock += 1;
    }

    /// Point-in-time metrics for every node.
    pub fn snapshot(&self) -> FleetMetrics {
        FleetMetrics {
            clock: self.clock,
            total_power_w: self.total_power(),
            incoming_load: self.last_incoming_load,
            carbon_intensity: self.carbon_intensity,
            nodes: self.nodes.iter().map(Node::metrics).collect(),
        }
    }
}
