//! greengrid-agent — energy-saving load consolidation.
//!
//! On each eligible tick the agent looks for the least-loaded active node
//! (the victim) and moves its entire load onto the most-loaded node that
//! still has room, letting the victim fall asleep. A cooldown after every
//! migration keeps the agent from thrashing.
//!
//! # Algorithm
//!
//! ```text
//! if cooldown > 0:
//!     cooldown -= 1; return None
//!
//! active = nodes with load > 0, stable-sorted by load ascending
//! if len(active) < 2: return None
//!
//! victim = active[0]
//! for target in reversed(active) without victim:
//!     if 100 - target.load >= victim.load:
//!         transfer(victim → target, victim.load)
//!         cooldown = 3
//!         return [Migrated, Sleeping]
//! return None      // no cooldown consumed
//! ```

pub mod consolidator;

pub use consolidator::{AgentAction, ConsolidationAgent, DEFAULT_COOLDOWN_TICKS};
