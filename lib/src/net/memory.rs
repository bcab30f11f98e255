//! In-process transports.
//!
//! [`pair`] runs two full connections over a duplex pipe, frames and all.
//! [`Loopback`] skips framing entirely and dispatches straight into a
//! router, still going through the argument encoding.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime;

use crate::config::ConnectionConfig;
use crate::net::{Connection, Encoding};
use crate::rpc::{Context, GenericClient, MethodType, Router};
use crate::util::Shutdown;
use crate::{Error, Result};

/// Buffer size of each direction of the in-memory pipe.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Creates two connected peers, each optionally serving its own router.
///
/// Both peers share the shutdown signal, closing either one tears down the
/// pair.
pub fn pair(
    left_router: Option<Arc<Router>>,
    right_router: Option<Arc<Router>>,
    config: ConnectionConfig,
    runtime: &runtime::Handle,
    shutdown: Shutdown,
) -> (Connection, Connection) {
    let (left, right) = tokio::io::duplex(PIPE_CAPACITY);
    (
        Connection::spawn(left, left_router, config.clone(), runtime, shutdown.clone()),
        Connection::spawn(right, right_router, config, runtime, shutdown),
    )
}

/// Client calling into a local router.
///
/// A zero timeout means no timeout at all.
pub struct Loopback {
    router: Arc<Router>,
    encoding: Encoding,
}

impl Loopback {
    pub fn new(router: impl Into<Arc<Router>>, encoding: Encoding) -> Self {
        Self {
            router: router.into(),
            encoding,
        }
    }

    async fn dispatch(
        &self,
        ctx: &Context,
        method: &str,
        args: Vec<u8>,
        timeout: Duration,
        method_type: MethodType,
    ) -> Result<Vec<u8>> {
        if ctx.is_canceled() {
            return Err(Error::Canceled);
        }
        // handler gets its own context so a timeout can cancel it
        let handler_ctx = ctx.child();
        let dispatch =
            self.router
                .dispatch(handler_ctx.clone(), method, &args, self.encoding, method_type);
        if timeout.is_zero() {
            tokio::select! {
                result = dispatch => result,
                _ = ctx.canceled() => Err(Error::Canceled),
            }
        } else {
            tokio::select! {
                result = dispatch => result,
                _ = ctx.canceled() => Err(Error::Canceled),
                _ = tokio::time::sleep(timeout) => {
                    handler_ctx.cancel();
                    Err(Error::Timeout)
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl GenericClient for Loopback {
    fn encoding(&self) -> Encoding {
        self.encoding
    }

    async fn call_raw(
        &self,
        ctx: &Context,
        method: &str,
        args: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        self.dispatch(ctx, method, args, timeout, MethodType::Call)
            .await
    }

    /// Hands the notification to the router and returns without waiting
    /// for the handler, whose errors are only logged.
    async fn notify_raw(
        &self,
        ctx: &Context,
        method: &str,
        args: Vec<u8>,
        _timeout: Duration,
    ) -> Result<()> {
        if ctx.is_canceled() {
            return Err(Error::Canceled);
        }
        let router = self.router.clone();
        let encoding = self.encoding;
        let method = method.to_string();
        tokio::spawn(async move {
            if let Err(e) = router
                .dispatch(Context::new(), &method, &args, encoding, MethodType::Notify)
                .await
            {
                warn!("notification {} failed: {}", method, e);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::Loopback;
    use crate::net::Encoding;
    use crate::rpc::client::{call, notify};
    use crate::rpc::{Context, MethodDescription, Protocol, Router};
    use crate::{Error, Result};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TickArg {}

    fn ticker(ticks: Arc<AtomicUsize>) -> Result<Router> {
        let protocol = Protocol::new("test.1.ticker")
            .with_method(
                "tick",
                MethodDescription::notify(move |_ctx, _arg: TickArg| {
                    let ticks = ticks.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        ticks.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>(Error::Other("tick failed".to_string()))
                    }
                }),
            )
            .with_method(
                "stall",
                MethodDescription::call(|ctx: Context, _arg: TickArg| async move {
                    ctx.canceled().await;
                    Ok(())
                }),
            );
        Router::new().with(protocol)
    }

    #[tokio::test]
    async fn notify_does_not_wait_for_handler() -> Result<()> {
        let ticks = Arc::new(AtomicUsize::new(0));
        let client = Loopback::new(ticker(ticks.clone())?, Encoding::MsgPack);

        let started = Instant::now();
        notify(&client, &Context::new(), "test.1.ticker.tick", TickArg {}, Duration::ZERO)
            .await?;
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        // the handler still runs, its error stays on the serving side
        for _ in 0..100 {
            if ticks.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn call_timeout_cancels_handler() -> Result<()> {
        let client = Loopback::new(ticker(Arc::new(AtomicUsize::new(0)))?, Encoding::Json);
        let result: Result<()> = call(
            &client,
            &Context::new(),
            "test.1.ticker.stall",
            TickArg {},
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(result, Err(Error::Timeout));
        Ok(())
    }
}
