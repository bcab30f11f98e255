//! Protocol declaration macro.
//!
//! A single [`protocol!`] block expands into everything both sides of a
//! service need: the interface trait implemented by the serving side, the
//! builder turning an implementation into a [`crate::Protocol`] dispatch
//! table, and the typed client stub. Both the table and the stub derive
//! their wire names from the same declaration, so they can't drift apart.

/// Declares a protocol.
///
/// Every method is either a `call` (request/response) or a `notify`
/// (fire-and-forget, no return type). The quoted name is the method's wire
/// name and is used verbatim, casing included.
///
/// The argument record travelling on the wire follows the wire name.
/// Listing its fields in braces turns them into the method's parameters:
/// the stub wraps them into the record and the dispatch table unwraps them
/// before calling the implementation. Records given without braces are
/// passed whole.
///
/// ```
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
/// pub struct PingArg {
///     pub payload: String,
/// }
///
/// #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
/// pub struct PongArg {}
///
/// #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
/// pub struct EchoArg {
///     pub text: String,
///     pub times: u32,
/// }
///
/// protobind::protocol! {
///     /// Liveness checks.
///     pub protocol "example.1.ping" as PingInterface {
///         client: PingClient,
///         builder: ping_protocol,
///         methods {
///             call ping("ping", PingArg { payload: String }) -> String;
///             notify pong("pong", PongArg {});
///             call echo("echo", EchoArg) -> String;
///         }
///     }
/// }
///
/// assert_eq!(
///     PingClient::METHODS,
///     &["example.1.ping.ping", "example.1.ping.pong", "example.1.ping.echo"]
/// );
/// ```
#[macro_export]
macro_rules! protocol {
    // envelope with its fields spelled out, the fields become parameters
    (@munch [$($header:tt)*] [$($done:tt)*]
        $(#[$mmeta:meta])*
        $kind:ident $method:ident ($wire:literal, $arg:ident { $($field:ident : $fty:ty),* $(,)? })
        $(-> $ret:ty)?;
        $($rest:tt)*
    ) => {
        $crate::protocol!(@munch [$($header)*] [$($done)* {
            [$(#[$mmeta])*] $kind $method $wire $arg
            [$($field : $fty),*] ($arg { $($field),* }) [$($ret)?]
        }] $($rest)*);
    };
    // envelope passed whole
    (@munch [$($header:tt)*] [$($done:tt)*]
        $(#[$mmeta:meta])*
        $kind:ident $method:ident ($wire:literal, $arg:ident)
        $(-> $ret:ty)?;
        $($rest:tt)*
    ) => {
        $crate::protocol!(@munch [$($header)*] [$($done)* {
            [$(#[$mmeta])*] $kind $method $wire $arg
            [arg : $arg] (arg) [$($ret)?]
        }] $($rest)*);
    };
    (@munch [$($header:tt)*] [$($done:tt)*]) => {
        $crate::protocol!(@emit $($header)* [$($done)*]);
    };
    (@emit
        [$(#[$meta:meta])*] [$vis:vis] $name:literal $iface:ident $client:ident $builder:ident
        [$({
            [$(#[$mmeta:meta])*] $kind:ident $method:ident $wire:literal $arg:ident
            [$($p:ident : $pty:ty),*] ($($shape:tt)*) [$($ret:ty)?]
        })*]
    ) => {
        $(#[$meta])*
        #[$crate::__private::async_trait]
        $vis trait $iface: Send + Sync {
            $(
                $(#[$mmeta])*
                async fn $method(
                    &self,
                    ctx: $crate::Context,
                    $($p: $pty),*
                ) -> $crate::Result<$crate::__protocol_ret!($($ret)?)>;
            )*
        }

        /// Builds the dispatch table serving the given implementation.
        $vis fn $builder(i: ::std::sync::Arc<dyn $iface>) -> $crate::Protocol {
            $crate::Protocol::new($name)
                $(
                    .with_method(
                        $wire,
                        $crate::__protocol_describe!(
                            $kind, $iface, i, $method, $arg, [$($p),*], ($($shape)*)
                        ),
                    )
                )*
        }

        /// Typed client stub.
        ///
        /// A zero timeout, the default, defers to the transport.
        #[derive(Clone)]
        $vis struct $client {
            cli: ::std::sync::Arc<dyn $crate::GenericClient>,
            timeout: ::std::time::Duration,
        }

        impl $client {
            pub const PROTOCOL: &'static str = $name;

            /// Fully qualified wire names of all methods, in declaration
            /// order.
            pub const METHODS: &'static [&'static str] = &[$(concat!($name, ".", $wire)),*];

            pub fn new(cli: ::std::sync::Arc<dyn $crate::GenericClient>) -> Self {
                Self {
                    cli,
                    timeout: ::std::time::Duration::ZERO,
                }
            }

            pub fn with_timeout(mut self, timeout: ::std::time::Duration) -> Self {
                self.timeout = timeout;
                self
            }

            $(
                $(#[$mmeta])*
                pub async fn $method(
                    &self,
                    ctx: &$crate::Context,
                    $($p: $pty),*
                ) -> $crate::Result<$crate::__protocol_ret!($($ret)?)> {
                    let envelope: $arg = $($shape)*;
                    $crate::__protocol_invoke!(
                        $kind,
                        &*self.cli,
                        ctx,
                        concat!($name, ".", $wire),
                        envelope,
                        self.timeout
                    )
                }
            )*
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis protocol $name:literal as $iface:ident {
            client: $client:ident,
            builder: $builder:ident,
            methods {
                $($methods:tt)*
            }
        }
    ) => {
        $crate::protocol!(@munch
            [[$(#[$meta])*] [$vis] $name $iface $client $builder]
            []
            $($methods)*
        );
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __protocol_ret {
    () => {
        ()
    };
    ($ret:ty) => {
        $ret
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __protocol_describe {
    (call, $iface:ident, $i:ident, $method:ident, $arg:ident, [$($p:ident),*], ($($shape:tt)*)) => {{
        let i = ::std::sync::Arc::clone(&$i);
        $crate::rpc::MethodDescription::call(move |ctx: $crate::Context, envelope: $arg| {
            let i = ::std::sync::Arc::clone(&i);
            async move {
                let $($shape)* = envelope;
                $iface::$method(&*i, ctx, $($p),*).await
            }
        })
    }};
    (notify, $iface:ident, $i:ident, $method:ident, $arg:ident, [$($p:ident),*], ($($shape:tt)*)) => {{
        let i = ::std::sync::Arc::clone(&$i);
        $crate::rpc::MethodDescription::notify(move |ctx: $crate::Context, envelope: $arg| {
            let i = ::std::sync::Arc::clone(&i);
            async move {
                let $($shape)* = envelope;
                $iface::$method(&*i, ctx, $($p),*).await
            }
        })
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __protocol_invoke {
    (call, $cli:expr, $ctx:expr, $method:expr, $arg:expr, $timeout:expr) => {
        $crate::rpc::client::call($cli, $ctx, $method, $arg, $timeout).await
    };
    (notify, $cli:expr, $ctx:expr, $method:expr, $arg:expr, $timeout:expr) => {
        $crate::rpc::client::notify($cli, $ctx, $method, $arg, $timeout).await
    };
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::net::memory::Loopback;
    use crate::net::{decode, encode, Encoding};
    use crate::rpc::{MethodType, Router};
    use crate::{Context, Error, Result};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct CountArg {
        by: u32,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct ResetArg {}

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct SetArg {
        value: u32,
        reason: String,
    }

    protocol! {
        /// Shared counter.
        pub protocol "test.1.counter" as CounterInterface {
            client: CounterClient,
            builder: counter_protocol,
            methods {
                call increment("Increment", CountArg { by: u32 }) -> u32;
                /// Sets the counter back to zero.
                notify reset("reset", ResetArg {});
                call set("set", SetArg) -> u32;
            }
        }
    }

    #[derive(Default)]
    struct Counter {
        value: AtomicUsize,
        reasons: Mutex<Vec<String>>,
    }

    #[crate::__private::async_trait]
    impl CounterInterface for Counter {
        async fn increment(&self, _ctx: Context, by: u32) -> Result<u32> {
            let prev = self.value.fetch_add(by as usize, Ordering::SeqCst);
            Ok(prev as u32 + by)
        }

        async fn reset(&self, _ctx: Context) -> Result<()> {
            self.value.store(0, Ordering::SeqCst);
            Ok(())
        }

        async fn set(&self, _ctx: Context, arg: SetArg) -> Result<u32> {
            self.reasons
                .lock()
                .map_err(|e| Error::Other(e.to_string()))?
                .push(arg.reason);
            self.value.store(arg.value as usize, Ordering::SeqCst);
            Ok(arg.value)
        }
    }

    #[test]
    fn stub_and_table_share_names() -> Result<()> {
        let protocol = counter_protocol(Arc::new(Counter::default()));
        assert_eq!(protocol.name, CounterClient::PROTOCOL);
        let mut stub_names = CounterClient::METHODS.to_vec();
        stub_names.sort();
        assert_eq!(protocol.wire_names(), stub_names);
        assert_eq!(
            CounterClient::METHODS,
            &["test.1.counter.Increment", "test.1.counter.reset", "test.1.counter.set"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn stub_reaches_implementation() -> Result<()> {
        let counter = Arc::new(Counter::default());
        let router = Router::new().with(counter_protocol(counter.clone()))?;
        let client = CounterClient::new(Arc::new(Loopback::new(router, Encoding::MsgPack)))
            .with_timeout(Duration::from_secs(1));
        let ctx = Context::new();

        assert_eq!(client.increment(&ctx, 2).await?, 2);
        assert_eq!(client.increment(&ctx, 3).await?, 5);

        client.reset(&ctx).await?;
        for _ in 0..100 {
            if counter.value.load(Ordering::SeqCst) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(counter.value.load(Ordering::SeqCst), 0);

        let set = client
            .set(
                &ctx,
                SetArg {
                    value: 7,
                    reason: "restore".to_string(),
                },
            )
            .await?;
        assert_eq!(set, 7);
        assert_eq!(
            *counter.reasons.lock().map_err(|e| Error::Other(e.to_string()))?,
            vec!["restore".to_string()]
        );

        ctx.cancel();
        assert_eq!(client.increment(&ctx, 1).await, Err(Error::Canceled));
        Ok(())
    }

    /// Parameters travel wrapped in their record, and the table unwraps
    /// them again before calling the implementation.
    #[tokio::test]
    async fn parameters_travel_in_envelope() -> Result<()> {
        let counter = Arc::new(Counter::default());
        let router = Router::new().with(counter_protocol(counter.clone()))?;
        let encoding = Encoding::Json;

        let payload = encode(&[CountArg { by: 4 }], encoding)?;
        assert_eq!(payload, br#"[{"by":4}]"#.to_vec());
        let reply = router
            .dispatch(
                Context::new(),
                "test.1.counter.Increment",
                &payload,
                encoding,
                MethodType::Call,
            )
            .await?;
        assert_eq!(decode::<u32>(&reply, encoding)?, 4);

        router
            .dispatch(
                Context::new(),
                "test.1.counter.reset",
                &encode(&[ResetArg {}], encoding)?,
                encoding,
                MethodType::Notify,
            )
            .await?;
        assert_eq!(counter.value.load(Ordering::SeqCst), 0);
        Ok(())
    }
}
