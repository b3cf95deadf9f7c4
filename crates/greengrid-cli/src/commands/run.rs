use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use greengrid_core::GridConfig;

use crate::control;
use crate::simulation::{Simulation, TickReport};

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub ticks: Option<u64>,
    pub agent: bool,
    pub pace: bool,
    pub format: String,
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => GridConfig::from_file(path)?,
        None => GridConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut sim = Simulation::new(&config, seed);
    if args.agent {
        sim.set_agent_enabled(true);
    }

    info!(
        seed,
        nodes = config.fleet.node_count,
        tick_seconds = config.simulation.tick_seconds,
        agent = sim.agent_enabled(),
        "simulation starting"
    );

    let mut out = std::io::stdout().lock();
    if args.pace {
        let tick = Duration::from_secs_f64(config.simulation.tick_seconds);
        let commands = spawn_stdin_reader();
        run_paced(&mut sim, tick, args.ticks, commands, &args.format, &mut out).await
    } else {
        run_unpaced(&mut sim, args.ticks.unwrap_or(0), &args.format, &mut out)
    }
}

/// Run `ticks` ticks back to back.
fn run_unpaced(
    sim: &mut Simulation,
    ticks: u64,
    format: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for _ in 0..ticks {
        let report = sim.step();
        emit(&report, format, out)?;
    }
    info!(
        ticks,
        samples = sim.forecaster().len(),
        "simulation finished"
    );
    Ok(())
}

/// Forward stdin lines over a channel from a plain OS thread.
///
/// A blocked stdin read cannot be cancelled, so it must not live on the
/// runtime: the thread is detached and dies with the process.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "failed to read command input, commands disabled");
                    break;
                }
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Tick on a timer, applying `commands` lines between ticks, until the tick
/// limit or Ctrl-C.
async fn run_paced(
    sim: &mut Simulation,
    tick: Duration,
    limit: Option<u64>,
    mut commands: mpsc::Receiver<String>,
    format: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(tick);
    let mut input_open = true;
    let mut ticks_run: u64 = 0;

    loop {
        if limit.is_some_and(|limit| ticks_run >= limit) {
            info!(ticks = ticks_run, "tick limit reached");
            break;
        }

        tokio::select! {
            _ = interval.tick() => {
                let report = sim.step();
                emit(&report, format, out)?;
                ticks_run += 1;
            }
            line = commands.recv(), if input_open => {
                match line {
                    Some(line) => match control::parse(&line) {
                        Some(command) => sim.apply(command),
                        None => debug!(input = %line.trim(), "ignoring unrecognized command"),
                    },
                    None => {
                        debug!("command input closed");
                        input_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(ticks = ticks_run, clock = sim.fleet().clock(), "simulation shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn emit(report: &TickReport, format: &str, out: &mut impl Write) -> anyhow::Result<()> {
    match format {
        "json" => writeln!(out, "{}", serde_json::to_string(report)?)?,
        _ => write!(out, "{}", format_report(report))?,
    }
    out.flush()?;
    Ok(())
}

/// One status line per tick, plus one indented line per agent action.
pub fn format_report(report: &TickReport) -> String {
    let m = &report.metrics;
    let forecast = if report.forecast_ready {
        let flag = if report.anomaly { "ANOMALY" } else { "ok" };
        format!("{:>7.1} W [{flag}]", report.predicted_next_w)
    } else {
        "gathering data".to_string()
    };
    let nodes: Vec<String> = m
        .nodes
        .iter()
        .map(|n| format!("{:>3}", n.load))
        .collect();

    let mut line = format!(
        "t={:>5} power={:>7.1} W forecast={} load={:>3} in={:>3} nodes=[{}] active={}/{} agent={}\n",
        m.clock,
        m.total_power_w,
        forecast,
        report.total_load,
        m.incoming_load,
        nodes.join(" "),
        m.active_nodes(),
        m.nodes.len(),
        if report.agent_enabled { "on" } else { "off" },
    );
    for action in &report.actions {
        line.push_str(&format!("  agent: {action}\n"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpaced_json_emits_one_line_per_tick() {
        let mut sim = Simulation::new(&GridConfig::default(), 21);
        let mut buf = Vec::new();
        run_unpaced(&mut sim, 10, "json", &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);

        for (i, line) in lines.iter().enumerate() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["metrics"]["clock"], (i + 1) as u64);
            assert_eq!(value["metrics"]["nodes"].as_array().unwrap().len(), 5);
        }
    }

    #[test]
    fn text_report_lists_actions() {
        let mut sim = Simulation::new(&GridConfig::default(), 4);
        sim.set_agent_enabled(true);

        let report = (0..2000)
            .map(|_| sim.step())
            .find(|r| !r.actions.is_empty())
            .expect("agent should act within a simulated day");

        let text = format_report(&report);
        assert!(text.contains("agent=on"));
        assert!(text.contains("agent: MIGRATED"));
        assert!(text.contains("SLEEP MODE"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn text_report_before_forecast_is_ready() {
        let mut sim = Simulation::new(&GridConfig::default(), 4);
        let text = format_report(&sim.step());
        assert!(text.starts_with("t=    1"));
        assert!(text.contains("gathering data"));
        assert!(text.contains("agent=off"));
    }

    #[tokio::test]
    async fn paced_run_applies_commands_and_stops_at_limit() {
        let mut sim = Simulation::new(&GridConfig::default(), 9);
        let mut buf = Vec::new();
        let (tx, rx) = mpsc::channel(4);
        tx.send("toggle".to_string()).await.unwrap();
        tx.send("not a command".to_string()).await.unwrap();
        drop(tx);

        run_paced(&mut sim, Duration::from_millis(10), Some(3), rx, "json", &mut buf)
            .await
            .unwrap();

        assert_eq!(sim.fleet().clock(), 3);
        assert!(sim.agent_enabled());
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 3);
    }

    #[tokio::test]
    async fn paced_run_stops_at_limit_while_input_stays_open() {
        let mut sim = Simulation::new(&GridConfig::default(), 9);
        let mut buf = Vec::new();
        // The sender outlives the run, like an interactive terminal.
        let (tx, rx) = mpsc::channel::<String>(4);

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            run_paced(&mut sim, Duration::from_millis(10), Some(2), rx, "text", &mut buf),
        )
        .await;

        assert!(finished.is_ok(), "run did not return at the tick limit");
        finished.unwrap().unwrap();
        assert_eq!(sim.fleet().clock(), 2);
        drop(tx);
    }
}
