use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::ArgMatches;
use tokio::runtime;

use protobind::net::{decode, encode, framed};
use protobind::util::Shutdown;
use protobind::{CompositeAddress, ConnectionConfig, Context, GenericClient};

pub fn cmd() -> clap::Command {
    use clap::{value_parser, Arg, ArgAction, Command};

    Command::new("call")
        .about("Call a method on a running server")
        .long_about(
            "Call a method on a running server.\n\n\
            Method is the fully qualified wire name, e.g. `keybase.1.home.homeGetScreen`.\n\
            Arguments are given as a single json object, the method's argument record.",
        )
        .display_order(21)
        .arg(
            Arg::new("method")
                .required(true)
                .value_name("method")
                .help("Fully qualified method name"),
        )
        .arg(
            Arg::new("args")
                .value_name("json")
                .default_value("{}")
                .help("Argument record as json"),
        )
        .arg(
            Arg::new("server")
                .long("server")
                .short('s')
                .value_name("address")
                .default_value(crate::serve::DEFAULT_ADDRESS)
                .help("Address of the server to call"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .short('t')
                .value_name("millis")
                .value_parser(value_parser!(u64))
                .help("Call timeout, falls back to the configured default"),
        )
        .arg(
            Arg::new("notify")
                .long("notify")
                .short('n')
                .action(ArgAction::SetTrue)
                .help("Send as a notification, not waiting for a result"),
        )
}

pub async fn start(
    matches: &ArgMatches,
    config: ConnectionConfig,
    runtime: runtime::Handle,
    shutdown: Shutdown,
) -> Result<()> {
    let method = matches
        .get_one::<String>("method")
        .context("method name is required")?;
    let args: serde_json::Value = match matches.get_one::<String>("args") {
        Some(json) => serde_json::from_str(json).context("arguments are not valid json")?,
        None => serde_json::json!({}),
    };
    let server = matches
        .get_one::<String>("server")
        .map(|s| s.as_str())
        .unwrap_or(crate::serve::DEFAULT_ADDRESS);
    let timeout = matches
        .get_one::<u64>("timeout")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or(Duration::ZERO);

    let address = CompositeAddress::from_str(server)?;
    let connection = framed::connect(&address, None, config, &runtime, shutdown.clone()).await?;
    let encoding = connection.encoding();
    let payload = encode(&[args], encoding)?;
    let ctx = Context::new();

    if matches.get_flag("notify") {
        connection.notify_raw(&ctx, method, payload, timeout).await?;
        debug!("notified {}", method);
    } else {
        let result = connection.call_raw(&ctx, method, payload, timeout).await?;
        let value: serde_json::Value = decode(&result, encoding)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    connection.close()?;
    Ok(())
}
