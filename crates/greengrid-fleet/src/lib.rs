//! greengrid-fleet — the simulated compute fleet.
//!
//! Owns every node and advances simulated time one tick at a time. Each
//! tick drains completed work, generates exogenous load from a diurnal
//! curve plus noise (and any scheduled stress test), and fills nodes in
//! index order.
//!
//! # Tick
//!
//! ```text
//! advance_tick()
//!   ├── Node::drain_completed_work()   for every node
//!   ├── DiurnalLoad::incoming(clock)   base + amplitude·sin + noise
//!   ├── + stress_load_amount           while a stress test is pending
//!   ├── distribute_load(incoming)      index-first fill, overflow dropped
//!   └── clock += 1
//! ```
//!
//! All randomness comes from a seeded `StdRng` owned by the engine, so two
//! engines built with the same config and seed produce identical traces.

pub mod engine;
pub mod generator;
pub mod node;

pub use engine::FleetEngine;
pub use generator::DiurnalLoad;
pub use node::{Node, PowerModel};
