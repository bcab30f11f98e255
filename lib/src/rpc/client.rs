//! Client-side call surface.
//!
//! [`GenericClient`] is the only thing generated stubs require from a
//! transport. Stubs go through [`call`] and [`notify`], which wrap the
//! argument envelope into the positional one-element sequence and take care
//! of encoding.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::net::{decode, encode, Encoding};
use crate::rpc::Context;
use crate::Result;

/// Generic transport surface, keyed by fully qualified method names.
///
/// A zero `timeout` defers to the transport's own default.
#[async_trait::async_trait]
pub trait GenericClient: Send + Sync {
    /// Encoding used for argument and result payloads.
    fn encoding(&self) -> Encoding;

    /// Issues a request and waits for the encoded result.
    async fn call_raw(
        &self,
        ctx: &Context,
        method: &str,
        args: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>>;

    /// Sends a notification, no response is expected.
    async fn notify_raw(
        &self,
        ctx: &Context,
        method: &str,
        args: Vec<u8>,
        timeout: Duration,
    ) -> Result<()>;
}

/// Issues a typed request/response call.
pub async fn call<C, A, R>(
    cli: &C,
    ctx: &Context,
    method: &str,
    arg: A,
    timeout: Duration,
) -> Result<R>
where
    C: GenericClient + ?Sized,
    A: Serialize + Send,
    R: DeserializeOwned,
{
    let encoding = cli.encoding();
    let args = encode(&[arg], encoding)?;
    let result = cli.call_raw(ctx, method, args, timeout).await?;
    decode(&result, encoding)
}

/// Issues a typed notification.
pub async fn notify<C, A>(
    cli: &C,
    ctx: &Context,
    method: &str,
    arg: A,
    timeout: Duration,
) -> Result<()>
where
    C: GenericClient + ?Sized,
    A: Serialize + Send,
{
    let encoding = cli.encoding();
    let args = encode(&[arg], encoding)?;
    cli.notify_raw(ctx, method, args, timeout).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::{call, notify, GenericClient};
    use crate::net::{decode, encode, Encoding};
    use crate::rpc::Context;
    use crate::Result;

    /// Records every outgoing frame and answers calls with the argument
    /// payload it received.
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, Vec<u8>, Duration, bool)>>,
    }

    #[async_trait::async_trait]
    impl GenericClient for Recorder {
        fn encoding(&self) -> Encoding {
            Encoding::Json
        }

        async fn call_raw(
            &self,
            _ctx: &Context,
            method: &str,
            args: Vec<u8>,
            timeout: Duration,
        ) -> Result<Vec<u8>> {
            self.sent
                .lock()
                .map_err(|e| crate::Error::Other(e.to_string()))?
                .push((method.to_string(), args.clone(), timeout, true));
            Ok(args)
        }

        async fn notify_raw(
            &self,
            _ctx: &Context,
            method: &str,
            args: Vec<u8>,
            timeout: Duration,
        ) -> Result<()> {
            self.sent
                .lock()
                .map_err(|e| crate::Error::Other(e.to_string()))?
                .push((method.to_string(), args, timeout, false));
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct LoggedInArg {
        username: String,
    }

    #[tokio::test]
    async fn envelope_is_single_element_sequence() -> Result<()> {
        let recorder = Recorder::default();
        let ctx = Context::new();
        let arg = LoggedInArg {
            username: "max".to_string(),
        };

        let echoed: Vec<LoggedInArg> =
            call(&recorder, &ctx, "a.b.c", arg.clone(), Duration::ZERO).await?;
        assert_eq!(echoed, vec![arg.clone()]);

        notify(&recorder, &ctx, "a.b.d", arg.clone(), Duration::from_secs(1)).await?;

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "a.b.c");
        assert_eq!(sent[0].1, br#"[{"username":"max"}]"#.to_vec());
        assert_eq!(sent[0].2, Duration::ZERO);
        assert!(sent[0].3);
        assert_eq!(sent[1].0, "a.b.d");
        assert_eq!(
            decode::<Vec<LoggedInArg>>(&sent[1].1, Encoding::Json)?,
            vec![arg]
        );
        assert!(!sent[1].3);
        assert_eq!(encode(&(), Encoding::Json)?, b"null".to_vec());
        Ok(())
    }
}
