#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod cli;
mod error_fmt;
mod run;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use irrigator_config::{Config, Logging};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = color_eyre::install() {
        eprintln!("error reporter init failed: {err}");
    }

    match run_cli(&cli) {
        Ok(()) => {}
        Err(err) => {
            if *JSON_MODE.get().unwrap_or(&false) {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            std::process::exit(1);
        }
    }
}

fn run_cli(cli: &Cli) -> eyre::Result<()> {
    let cfg = load_or_default(&cli.config)?;
    init_logging(cli, &cfg.logging);

    match &cli.cmd {
        Commands::Run { tick_ms } => run::run_loop(&cfg, *tick_ms),
        Commands::TestCycle => run::test_cycle(&cfg),
        Commands::SelfCheck => run::self_check(&cfg),
        Commands::Health => run::health(&cfg),
    }
}

/// A missing config file is not an error on the appliance: every field has a
/// working default. A present-but-broken file is.
fn load_or_default(path: &Path) -> eyre::Result<Config> {
    if path.exists() {
        irrigator_config::load_config(path)
    } else {
        Ok(Config::default())
    }
}

/// Console layer per `--json`/`--log-level`; optional JSON-lines file layer
/// per the `[logging]` config section. `RUST_LOG` overrides the level.
fn init_logging(cli: &Cli, logging: &Logging) {
    let level = logging.level.as_deref().unwrap_or(&cli.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = logging.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let dir = dir.unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or_else(|| "irrigator.log".as_ref());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_writer(writer)
    });

    // stderr keeps stdout clean for the JSON-emitting subcommands.
    if cli.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
