//! The per-tick driver tying fleet, agent and forecaster together.
//!
//! # Tick order
//!
//! ```text
//! FleetEngine::advance_tick()      drain → generate → distribute
//! ConsolidationAgent::optimize()   only while the agent is enabled
//! FleetEngine::snapshot()
//! Forecaster::predict_next()       t+1 for display, t for the anomaly check
//! Forecaster::add_data()           ingest this tick's observation
//! ```

use serde::Serialize;
use tracing::info;

use greengrid_agent::{AgentAction, ConsolidationAgent};
use greengrid_core::{FleetMetrics, GridConfig};
use greengrid_fleet::FleetEngine;
use greengrid_forecast::Forecaster;

use crate::control::ControlCommand;

/// Everything observable about one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub metrics: FleetMetrics,
    pub total_load: u32,
    /// Forecast for the next tick; 0 until the forecaster is ready.
    pub predicted_next_w: f64,
    pub forecast_ready: bool,
    /// This tick's power deviated from the model's same-tick prediction.
    pub anomaly: bool,
    pub agent_enabled: bool,
    pub actions: Vec<AgentAction>,
}

pub struct Simulation {
    fleet: FleetEngine,
    forecaster: Forecaster,
    agent: ConsolidationAgent,
    agent_enabled: bool,
}

impl Simulation {
    pub fn new(config: &GridConfig, seed: u64) -> Self {
        Self {
            fleet: FleetEngine::new(&config.fleet, seed),
            // Independent stream so forecaster resampling does not shift the
            // fleet's noise sequence.
            forecaster: Forecaster::new(&config.forecast, seed.wrapping_add(1)),
            agent: ConsolidationAgent::with_cooldown(config.agent.cooldown_ticks),
            agent_enabled: config.agent.enabled,
        }
    }

    pub fn fleet(&self) -> &FleetEngine {
        &self.fleet
    }

    pub fn forecaster(&self) -> &Forecaster {
        &self.forecaster
    }

    pub fn agent_enabled(&self) -> bool {
        self.agent_enabled
    }

    pub fn set_agent_enabled(&mut self, enabled: bool) {
        self.agent_enabled = enabled;
    }

    /// Run one full tick and report what happened.
    pub fn step(&mut self) -> TickReport {
        self.fleet.advance_tick();

        let actions = if self.agent_enabled {
            self.agent.optimize(&mut self.fleet).unwrap_or_default()
        } else {
            Vec::new()
        };

        let metrics = self.fleet.snapshot();
        let total_load = metrics.total_load();
        let load = f64::from(total_load);

        let predicted_next_w = self.forecaster.predict_next(metrics.clock + 1, load);
        let predicted_now_w = self.forecaster.predict_next(metrics.clock, load);
        let anomaly = self
            .forecaster
            .is_anomaly(metrics.total_power_w, predicted_now_w);
        self.forecaster
            .add_data(metrics.clock, load, metrics.total_power_w);

        TickReport {
            total_load,
            predicted_next_w,
            forecast_ready: self.forecaster.is_ready(),
            anomaly,
            agent_enabled: self.agent_enabled,
            actions,
            metrics,
        }
    }

    /// Apply an operator command. Only call between ticks.
    pub fn apply(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Inject(amount) => {
                self.fleet.distribute_load(amount);
                info!(amount, "injected load");
            }
            ControlCommand::Remove(amount) => {
                self.fleet.reclaim_load(amount);
                info!(amount, "removed load");
            }
            ControlCommand::Stress { amount, ticks } => {
                self.fleet.schedule_stress_test(amount, ticks);
            }
            ControlCommand::ToggleAgent => {
                self.agent_enabled = !self.agent_enabled;
                info!(enabled = self.agent_enabled, "consolidation agent toggled");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(seed: u64) -> Simulation {
        Simulation::new(&GridConfig::default(), seed)
    }

    #[test]
    fn forecast_warms_up_after_five_ticks() {
        let mut sim = sim(3);
        for _ in 0..4 {
            let report = sim.step();
            assert!(!report.forecast_ready);
            assert_eq!(report.predicted_next_w, 0.0);
            assert!(!report.anomaly);
        }
        assert!(sim.step().forecast_ready);
        assert_eq!(sim.forecaster().len(), 5);
    }

    #[test]
    fn report_matches_snapshot() {
        let mut sim = sim(8);
        let report = sim.step();
        assert_eq!(report.metrics.clock, 1);
        assert_eq!(report.total_load, report.metrics.total_load());
        assert_eq!(report.total_load, sim.fleet().total_load());
        assert!(!report.agent_enabled);
        assert!(report.actions.is_empty());
    }

    #[test]
    fn same_seed_same_reports() {
        let mut a = sim(77);
        let mut b = sim(77);
        a.set_agent_enabled(true);
        b.set_agent_enabled(true);
        for _ in 0..300 {
            let ra = a.step();
            let rb = b.step();
            assert_eq!(ra.metrics, rb.metrics);
            assert_eq!(ra.predicted_next_w, rb.predicted_next_w);
            assert_eq!(ra.actions, rb.actions);
        }
    }

    #[test]
    fn commands_mutate_fleet() {
        let mut sim = sim(1);
        sim.apply(ControlCommand::Inject(250));
        assert_eq!(sim.fleet().total_load(), 250);

        sim.apply(ControlCommand::Remove(100));
        assert_eq!(sim.fleet().total_load(), 150);

        sim.apply(ControlCommand::Stress { amount: 50, ticks: 4 });
        assert_eq!(sim.fleet().stress_ticks_remaining(), 4);

        assert!(!sim.agent_enabled());
        sim.apply(ControlCommand::ToggleAgent);
        assert!(sim.agent_enabled());
        sim.apply(ControlCommand::ToggleAgent);
        assert!(!sim.agent_enabled());
    }

    #[test]
    fn agent_reports_actions_when_enabled() {
        let mut sim = sim(5);
        sim.set_agent_enabled(true);

        let migrations: usize = (0..2000)
            .map(|_| sim.step())
            .filter(|r| !r.actions.is_empty())
            .inspect(|r| assert_eq!(r.actions.len(), 2))
            .count();
        assert!(migrations > 0);
    }

    #[test]
    fn config_enables_agent_from_start() {
        let mut config = GridConfig::default();
        config.agent.enabled = true;
        let sim = Simulation::new(&config, 0);
        assert!(sim.agent_enabled());
    }
}
