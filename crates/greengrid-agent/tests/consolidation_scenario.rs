//! Agent + fleet scenarios.
//!
//! Drives a real `FleetEngine` through the agent the way the tick loop does.

use greengrid_agent::{AgentAction, ConsolidationAgent};
use greengrid_core::config::FleetConfig;
use greengrid_core::NodeStatus;
use greengrid_fleet::FleetEngine;

fn test_fleet(nodes: usize, seed: u64) -> FleetEngine {
    let config = FleetConfig {
        node_count: nodes,
        ..FleetConfig::default()
    };
    FleetEngine::new(&config, seed)
}

fn loads(fleet: &FleetEngine) -> Vec<u32> {
    fleet.nodes().iter().map(|n| n.load()).collect()
}

#[test]
fn saturated_front_nodes_leave_no_target() {
    let mut fleet = test_fleet(5, 1);
    fleet.distribute_load(250);
    assert_eq!(loads(&fleet), vec![100, 100, 50, 0, 0]);

    let mut agent = ConsolidationAgent::new();
    assert!(agent.optimize(&mut fleet).is_none());

    // Nothing moved and the agent is still ready.
    assert_eq!(loads(&fleet), vec![100, 100, 50, 0, 0]);
    assert_eq!(agent.cooldown_remaining(), 0);
}

#[test]
fn cooldown_blocks_three_calls_then_reevaluates() {
    let mut fleet = test_fleet(5, 2);
    fleet.distribute_load(90);
    assert!(fleet.request_transfer(0, 1, 60));
    assert_eq!(loads(&fleet), vec![30, 60, 0, 0, 0]);

    let mut agent = ConsolidationAgent::new();
    let actions = agent.optimize(&mut fleet).expect("first consolidation");
    assert_eq!(
        actions[0],
        AgentAction::Migrated {
            amount: 30,
            from: 0,
            to: 1
        }
    );
    assert_eq!(loads(&fleet), vec![0, 90, 0, 0, 0]);
    assert_eq!(fleet.node(0).status(), NodeStatus::Sleep);

    // A fresh opportunity appears immediately, but the agent is cooling.
    fleet.distribute_load(5);
    assert_eq!(loads(&fleet), vec![5, 90, 0, 0, 0]);
    for remaining in [2, 1, 0] {
        assert!(agent.optimize(&mut fleet).is_none());
        assert_eq!(agent.cooldown_remaining(), remaining);
        assert_eq!(loads(&fleet), vec![5, 90, 0, 0, 0]);
    }

    let actions = agent.optimize(&mut fleet).expect("fourth call re-evaluates");
    assert_eq!(actions[1], AgentAction::Sleeping { node: 0 });
    assert_eq!(loads(&fleet), vec![0, 95, 0, 0, 0]);
}

#[test]
fn agent_in_tick_loop_preserves_invariants() {
    let mut fleet = test_fleet(5, 42);
    let mut agent = ConsolidationAgent::new();
    fleet.schedule_stress_test(60, 200);

    let mut migrations = 0;
    for _ in 0..2000 {
        fleet.advance_tick();
        let before = fleet.total_load();

        if let Some(actions) = agent.optimize(&mut fleet) {
            migrations += 1;
            let AgentAction::Sleeping { node } = actions[1] else {
                panic!("second action must put the victim to sleep");
            };
            assert_eq!(fleet.node(node).load(), 0);
        }

        assert_eq!(fleet.total_load(), before, "agent must conserve load");
        assert!(fleet.nodes().iter().all(|n| n.load() <= 100));
    }
    assert!(migrations > 0);
}
