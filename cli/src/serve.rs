use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::ArgMatches;
use tokio::runtime;

use protobind::net::framed;
use protobind::util::Shutdown;
use protobind::{CompositeAddress, ConnectionConfig};

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9090";

pub fn cmd() -> clap::Command {
    use clap::{Arg, Command};

    Command::new("serve")
        .about("Serve the bundled protocols")
        .long_about(
            "Serve the bundled keybase.1 protocols.\n\n\
            Address may carry an encoding and a transport, e.g.\n\
            `json@tcp://127.0.0.1:9090` or `unix:///tmp/protobind.sock`.",
        )
        .display_order(20)
        .arg(
            Arg::new("address")
                .long("address")
                .short('a')
                .help("Set the listener address(es)")
                .value_name("address")
                .num_args(1..)
                .default_value(DEFAULT_ADDRESS),
        )
}

pub async fn start(
    matches: &ArgMatches,
    config: ConnectionConfig,
    runtime: runtime::Handle,
    shutdown: Shutdown,
) -> Result<()> {
    let router = Arc::new(crate::services::router()?);
    info!("serving protocols: {:?}", router.protocol_names());

    let addresses = matches
        .get_many::<String>("address")
        .map(|a| a.cloned().collect::<Vec<_>>())
        .unwrap_or_else(|| vec![DEFAULT_ADDRESS.to_string()]);
    for address in addresses {
        let address = CompositeAddress::from_str(&address)?;
        let bound = framed::spawn_listener(
            &address,
            router.clone(),
            config.clone(),
            runtime.clone(),
            shutdown.clone(),
        )
        .await?;
        println!("listening on {}", bound);
    }

    Ok(())
}
