//! A single simulated compute node.

use rand::Rng;

use greengrid_core::{NODE_CAPACITY, NodeId, NodeMetrics, NodeStatus};

/// Linear power model shared by every node in a fleet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    /// Watts at 0% load while awake.
    pub idle_w: f64,
    /// Watts at 100% load.
    pub max_w: f64,
}

const MEMORY_FLOOR: f64 = 10.0;
const MEMORY_CEILING: f64 = 100.0;
const AMBIENT_TEMP_C: f64 = 35.0;

/// Work completed per tick regardless of load.
const BASE_THROUGHPUT: u32 = 10;

/// Load percent, memory and temperature for one node.
///
/// Status is never stored: it is recomputed from `load` on every read so it
/// cannot drift out of sync after a transfer.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    load: u32,
    memory: f64,
    temperature: f64,
    power: PowerModel,
}

impl Node {
    pub fn new(id: NodeId, power: PowerModel) -> Self {
        Self {
            id,
            load: 0,
            memory: MEMORY_FLOOR,
            temperature: AMBIENT_TEMP_C,
            power,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn load(&self) -> u32 {
        self.load
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn status(&self) -> NodeStatus {
        NodeStatus::from_load(self.load)
    }

    pub fn spare_capacity(&self) -> u32 {
        NODE_CAPACITY - self.load
    }

    /// Instantaneous power draw in watts. Zero while asleep.
    pub fn power_draw(&self) -> f64 {
        match self.status() {
            NodeStatus::Sleep => 0.0,
            NodeStatus::Active => {
                let utilization = f64::from(self.load) / f64::from(NODE_CAPACITY);
                self.power.idle_w + (self.power.max_w - self.power.idle_w) * utilization
            }
        }
    }

    /// Smooth memory and temperature toward their load-dependent targets.
    pub fn update_derived_stats(&mut self, rng: &mut impl Rng) {
        if self.load > 0 {
            let noise = f64::from(rng.random_range(-5i32..=5));
            let target_memory = 15.0 + 0.8 * f64::from(self.load) + noise;
            self.memory = target_memory.clamp(MEMORY_FLOOR, MEMORY_CEILING);

            let target_temp = AMBIENT_TEMP_C + 0.5 * f64::from(self.load);
            self.temperature = 0.7 * self.temperature + 0.3 * target_temp;
        } else {
            self.memory = MEMORY_FLOOR;
            self.temperature = 0.9 * self.temperature + 0.1 * AMBIENT_TEMP_C;
        }
    }

    /// Accept as much of `amount` as fits and return the rejected remainder.
    ///
    /// Only `load` changes; derived stats catch up on the next tick.
    pub fn absorb_load(&mut self, amount: u32) -> u32 {
        let accepted = amount.min(self.spare_capacity());
        self.load += accepted;
        amount - accepted
    }

    /// Remove up to `amount` and return how much was actually removed.
    pub fn remove_load(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.load);
        self.load -= removed;
        removed
    }

    /// Process one tick of work, then refresh derived stats.
    ///
    /// Throughput grows with load: `10 + floor(0.30 × load)`.
    pub fn drain_completed_work(&mut self, rng: &mut impl Rng) {
        if self.load > 0 {
            let completed = BASE_THROUGHPUT + self.load * 3 / 10;
            self.load = self.load.saturating_sub(completed);
        }
        self.update_derived_stats(rng);
    }

    pub fn metrics(&self) -> NodeMetrics {
        NodeMetrics {
            id: self.id,
            load: self.load,
            memory: self.memory,
            temperature: self.temperature,
            status: self.status(),
            power_w: self.power_draw(),
        }
    }
}
