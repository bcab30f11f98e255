//! Application definition.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use tokio::runtime;

use protobind::net::Encoding;
use protobind::util::Shutdown;
use protobind::ConnectionConfig;

use crate::tracing::LogLevel;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

pub fn arg_matches() -> ArgMatches {
    let cmd = Command::new("protobind")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .version(VERSION)
        .author(AUTHORS)
        .about("Serve and call keybase.1 protocols from the command line.")
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .display_order(100)
                .value_name("level")
                .default_value("info")
                .value_parser(["trace", "debug", "info", "warn", "error", "none"])
                .global(true)
                .help("Set the verbosity of the log output"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .display_order(101)
                .value_name("path")
                .global(true)
                .help("Load connection settings from a toml file"),
        )
        .arg(
            Arg::new("encoding")
                .long("encoding")
                .short('e')
                .display_order(102)
                .value_name("encoding")
                .global(true)
                .help("Override the payload encoding"),
        )
        .subcommand(crate::serve::cmd())
        .subcommand(crate::call::cmd())
        .subcommand(
            Command::new("methods")
                .about("List the methods served by `serve`")
                .display_order(30),
        );

    cmd.get_matches()
}

/// Runs based on specified subcommand.
pub async fn start(matches: ArgMatches, runtime: runtime::Handle) -> Result<()> {
    init_logging(&matches)?;

    let config = load_config(&matches)?;
    let mut shutdown = Shutdown::new();

    match matches.subcommand() {
        Some(("serve", m)) => crate::serve::start(m, config, runtime, shutdown.clone()).await?,
        Some(("call", m)) => {
            return crate::call::start(m, config, runtime, shutdown).await;
        }
        Some(("methods", _)) => {
            for method in crate::services::methods() {
                println!("{}", method);
            }
            return Ok(());
        }
        _ => return Ok(()),
    }

    // Wait for either ctrl_c signal or message from within server task(s)
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("Initiating graceful shutdown...");
            shutdown.shutdown()?;
        },
        _ = shutdown.recv() => {},
    }

    tokio::time::sleep(Duration::from_millis(300)).await;

    Ok(())
}

/// Reads connection settings, applying overrides given on the command line.
fn load_config(matches: &ArgMatches) -> Result<ConnectionConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            debug!("loading config from {}", path);
            ConnectionConfig::from_path(path)?
        }
        None => ConnectionConfig::default(),
    };
    if let Some(encoding) = matches.get_one::<String>("encoding") {
        config.encoding = Encoding::from_str(encoding)?;
    }
    Ok(config)
}

/// Sets up logging based on settings from the matches.
fn init_logging(matches: &ArgMatches) -> Result<()> {
    let log_level = match matches.get_one::<String>("verbosity") {
        Some(s) => match s.as_str() {
            "0" | "none" => Some(LogLevel::Off),
            "1" | "err" | "error" | "min" => Some(LogLevel::Error),
            "2" | "warn" | "warning" | "default" => Some(LogLevel::Warn),
            "3" | "info" => Some(LogLevel::Info),
            "4" | "debug" => Some(LogLevel::Debug),
            "5" | "trace" | "max" | "all" => Some(LogLevel::Trace),
            _ => None,
        },
        _ => None,
    };
    crate::tracing::init(
        format!("protobind@{}", hostname::get()?.to_string_lossy()),
        log_level,
    )
}
