//! Stream listeners and dialers producing [`Connection`]s.
//!
//! Both TCP and unix domain sockets carry the same length-delimited frames.
//! The encoding named in a [`CompositeAddress`] takes precedence over the
//! one from the configuration.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::runtime;

use crate::config::ConnectionConfig;
use crate::net::{Address, CompositeAddress, Connection, Transport};
use crate::rpc::Router;
use crate::util::Shutdown;
use crate::{Error, Result};

fn resolve_config(address: &CompositeAddress, mut config: ConnectionConfig) -> ConnectionConfig {
    if let Some(encoding) = address.encoding {
        config.encoding = encoding;
    }
    config
}

/// Binds the address and spawns an accept loop serving `router`.
///
/// Every accepted peer gets its own [`Connection`]. The loop stops when the
/// shutdown signal is triggered, taking its connections down with it.
/// Returns the address actually bound, useful when binding to port `0`.
pub async fn spawn_listener(
    address: &CompositeAddress,
    router: Arc<Router>,
    config: ConnectionConfig,
    runtime: runtime::Handle,
    shutdown: Shutdown,
) -> Result<CompositeAddress> {
    let config = resolve_config(address, config);
    match (address.transport(), &address.address) {
        (Transport::FramedTcp, Address::Net(addr)) => {
            let listener = TcpListener::bind(addr).await?;
            let local = listener.local_addr()?;
            info!("listening on tcp://{} ({})", local, config.encoding);
            runtime.spawn(accept_tcp(
                listener,
                router,
                config,
                runtime.clone(),
                shutdown,
            ));
            Ok(CompositeAddress {
                address: Address::Net(local),
                ..address.clone()
            })
        }
        #[cfg(unix)]
        (Transport::Unix, Address::File(path)) => {
            let listener = tokio::net::UnixListener::bind(path)?;
            info!("listening on unix://{} ({})", path, config.encoding);
            runtime.spawn(accept_unix(
                listener,
                router,
                config,
                runtime.clone(),
                shutdown,
            ));
            Ok(address.clone())
        }
        (transport, addr) => Err(Error::NetworkError(format!(
            "transport {} can't listen on {}",
            transport, addr
        ))),
    }
}

async fn accept_tcp(
    listener: TcpListener,
    router: Arc<Router>,
    config: ConnectionConfig,
    runtime: runtime::Handle,
    mut shutdown: Shutdown,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("accepted connection from {}", peer);
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("failed setting nodelay for {}: {}", peer, e);
                    }
                    Connection::spawn(
                        stream,
                        Some(router.clone()),
                        config.clone(),
                        &runtime,
                        shutdown.clone(),
                    );
                }
                Err(e) => warn!("failed accepting connection: {}", e),
            },
            _ = shutdown.recv() => {
                info!("tcp listener stopped");
                break;
            }
        }
    }
}

#[cfg(unix)]
async fn accept_unix(
    listener: tokio::net::UnixListener,
    router: Arc<Router>,
    config: ConnectionConfig,
    runtime: runtime::Handle,
    mut shutdown: Shutdown,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("accepted connection from {:?}", peer);
                    Connection::spawn(
                        stream,
                        Some(router.clone()),
                        config.clone(),
                        &runtime,
                        shutdown.clone(),
                    );
                }
                Err(e) => warn!("failed accepting connection: {}", e),
            },
            _ = shutdown.recv() => {
                info!("unix listener stopped");
                break;
            }
        }
    }
}

/// Dials the address and spawns a connection on the resulting stream.
///
/// The connection serves inbound calls from `router` when given, which is
/// how a client exposes notification protocols to the server.
pub async fn connect(
    address: &CompositeAddress,
    router: Option<Arc<Router>>,
    config: ConnectionConfig,
    runtime: &runtime::Handle,
    shutdown: Shutdown,
) -> Result<Connection> {
    let config = resolve_config(address, config);
    let address = address.clone().normalize_non_routable();
    match (address.transport(), &address.address) {
        (Transport::FramedTcp, Address::Net(addr)) => {
            let stream = tokio::net::TcpStream::connect(addr).await?;
            stream.set_nodelay(true)?;
            debug!("connected to tcp://{}", addr);
            Ok(Connection::spawn(stream, router, config, runtime, shutdown))
        }
        #[cfg(unix)]
        (Transport::Unix, Address::File(path)) => {
            let stream = tokio::net::UnixStream::connect(path).await?;
            debug!("connected to unix://{}", path);
            Ok(Connection::spawn(stream, router, config, runtime, shutdown))
        }
        (transport, addr) => Err(Error::NetworkError(format!(
            "transport {} can't dial {}",
            transport, addr
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::runtime;

    use super::{connect, spawn_listener};
    use crate::config::ConnectionConfig;
    use crate::net::{CompositeAddress, Encoding};
    use crate::rpc::client::call;
    use crate::rpc::{Context, MethodDescription, Protocol, Router};
    use crate::util::Shutdown;
    use crate::{Error, Result};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct LenArg {
        s: String,
    }

    fn router() -> Result<Arc<Router>> {
        let protocol = Protocol::new("test.1.strings").with_method(
            "len",
            MethodDescription::call(|_ctx, arg: LenArg| async move { Ok(arg.s.len() as u64) }),
        );
        Ok(Arc::new(Router::new().with(protocol)?))
    }

    #[tokio::test]
    async fn tcp_round_trip() -> Result<()> {
        let shutdown = Shutdown::new();
        let address: CompositeAddress = "json@tcp://127.0.0.1:0".parse()?;
        let bound = spawn_listener(
            &address,
            router()?,
            ConnectionConfig::default(),
            runtime::Handle::current(),
            shutdown.clone(),
        )
        .await?;
        assert_eq!(bound.encoding, Some(Encoding::Json));

        let client = connect(
            &bound,
            None,
            ConnectionConfig::default(),
            &runtime::Handle::current(),
            Shutdown::new(),
        )
        .await?;
        let len: u64 = call(
            &client,
            &Context::new(),
            "test.1.strings.len",
            LenArg {
                s: "keybase".to_string(),
            },
            Duration::from_secs(5),
        )
        .await?;
        assert_eq!(len, 7);

        shutdown.shutdown()?;
        for _ in 0..100 {
            if client.is_closed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(client.is_closed());
        let result: Result<u64> = call(
            &client,
            &Context::new(),
            "test.1.strings.len",
            LenArg::default(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(result, Err(Error::ConnectionClosed));
        Ok(())
    }

    #[tokio::test]
    async fn mismatched_address_kind_rejected() -> Result<()> {
        let address: CompositeAddress = "tcp:///tmp/protobind.sock".parse()?;
        let result = connect(
            &address,
            None,
            ConnectionConfig::default(),
            &runtime::Handle::current(),
            Shutdown::new(),
        )
        .await;
        assert!(matches!(result, Err(Error::NetworkError(_))));
        Ok(())
    }
}
