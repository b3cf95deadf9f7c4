use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod control;
mod simulation;

#[derive(Parser)]
#[command(
    name = "greengrid",
    about = "GreenGrid — energy-aware fleet simulator",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Log output format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation.
    ///
    /// Ticks are paced by `simulation.tick_seconds`. While running, lines on
    /// stdin are applied between ticks: `add N`, `remove N`,
    /// `stress AMOUNT TICKS`, `toggle`.
    Run {
        /// Path to greengrid.toml (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seed for every noise source. Random when omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
        /// Start with the consolidation agent enabled
        #[arg(long)]
        agent: bool,
        /// Run ticks back to back without waiting or reading stdin
        #[arg(long, requires = "ticks")]
        no_pace: bool,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a greengrid.toml with every default spelled out
    Init {
        #[arg(short, long, default_value = "greengrid.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Reports go to stdout; logs stay on stderr.
    let logs = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("greengrid=info".parse()?),
        );
    match cli.log_format {
        LogFormat::Text => logs.init(),
        LogFormat::Json => logs.json().init(),
    }

    match cli.command {
        Commands::Run {
            config,
            seed,
            ticks,
            agent,
            no_pace,
            format,
        } => {
            commands::run::run(commands::run::RunArgs {
                config,
                seed,
                ticks,
                agent,
                pace: !no_pace,
                format,
            })
            .await
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => commands::config::init(&path, force),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_defaults_to_text() {
        let cli = Cli::try_parse_from(["greengrid", "run", "--ticks", "1"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn log_format_accepted_after_subcommand() {
        let cli =
            Cli::try_parse_from(["greengrid", "config", "init", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(Cli::try_parse_from(["greengrid", "--log-format", "xml", "run"]).is_err());
    }
}
