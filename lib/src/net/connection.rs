//! Bidirectional peer over a length-delimited byte stream.
//!
//! A [`Connection`] is both sides at once: it issues calls and
//! notifications through the [`GenericClient`] surface, and it serves
//! inbound ones from an optional shared [`Router`]. One task reads frames
//! and keeps the bookkeeping, callers talk to it through a [`LocalExec`]
//! channel. Frames are written by a separate writer task, so a slow write
//! never stops the connection from reading.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use fnv::FnvHashMap;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::config::ConnectionConfig;
use crate::executor::{Executor, LocalExec};
use crate::net::Encoding;
use crate::rpc::msg::{Message, SeqId};
use crate::rpc::{Context, GenericClient, MethodType, Router};
use crate::util::Shutdown;
use crate::{Error, Result};

/// Request submitted to the connection task.
#[derive(Debug)]
pub enum Outgoing {
    Call {
        seqid: SeqId,
        method: String,
        args: Vec<u8>,
    },
    Notify {
        method: String,
        args: Vec<u8>,
    },
    /// Abandons a pending call and tells the peer to cancel its handler.
    Cancel { seqid: SeqId, method: String },
}

type Responder = oneshot::Sender<Result<Vec<u8>>>;

/// Encoded frame queued for the writer task, optionally acknowledged once
/// written.
type Write = (Bytes, Option<Responder>);

#[derive(Clone)]
pub struct Connection {
    exec: LocalExec<Outgoing, Result<Vec<u8>>>,
    seqid: Arc<AtomicU32>,
    config: Arc<ConnectionConfig>,
    runtime: runtime::Handle,
    shutdown: Shutdown,
}

impl Connection {
    /// Spawns the connection tasks on the given runtime and returns a handle
    /// to them.
    ///
    /// Inbound calls and notifications are served from `router`, when
    /// present. Without a router every inbound call is answered with
    /// [`Error::ProtocolNotFound`]. A `queue_capacity` of zero is treated
    /// as one.
    pub fn spawn<S>(
        stream: S,
        router: Option<Arc<Router>>,
        config: ConnectionConfig,
        runtime: &runtime::Handle,
        shutdown: Shutdown,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let capacity = config.queue_capacity.max(1);
        let (exec, outgoing) = LocalExec::new(capacity);
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(config.max_frame_len)
            .new_codec();
        let (sink, frames) = Framed::new(stream, codec).split();

        let (writes, writes_rcv) = mpsc::unbounded_channel();
        runtime.spawn(write_frames(sink, writes_rcv));

        let (responses, responses_rcv) = mpsc::channel(capacity);
        let task = ConnectionTask {
            encoding: config.encoding,
            router,
            runtime: runtime.clone(),
            writes,
            responses,
            pending: FnvHashMap::default(),
            inflight: FnvHashMap::default(),
        };
        runtime.spawn(task.run(frames, outgoing, responses_rcv, shutdown.clone()));

        Self {
            exec,
            seqid: Arc::new(AtomicU32::new(0)),
            config: Arc::new(config),
            runtime: runtime.clone(),
            shutdown,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether the connection task has terminated.
    pub fn is_closed(&self) -> bool {
        self.exec.is_closed()
    }

    /// Stops the connection task. Pending calls fail with
    /// [`Error::ConnectionClosed`].
    ///
    /// The shutdown signal is shared with whoever handed it in, so closing a
    /// connection accepted by a listener stops that listener as well.
    pub fn close(&self) -> Result<()> {
        self.shutdown.shutdown()
    }

    fn check_frame(&self, args: &[u8]) -> Result<()> {
        if args.len() > self.config.max_frame_len {
            return Err(Error::FrameTooLarge(args.len()));
        }
        Ok(())
    }

    /// Drops the pending call and tells the peer to cancel its handler,
    /// without waiting for either to happen.
    fn abandon(&self, seqid: SeqId, method: &str) {
        let exec = self.exec.clone();
        let cancel = Outgoing::Cancel {
            seqid,
            method: method.to_string(),
        };
        self.runtime.spawn(async move {
            match exec.execute(cancel).await {
                Ok(Ok(_)) => trace!("queued cancel for call {}", seqid),
                Ok(Err(e)) | Err(e) => debug!("unable to cancel call {}: {}", seqid, e),
            }
        });
    }
}

#[async_trait::async_trait]
impl GenericClient for Connection {
    fn encoding(&self) -> Encoding {
        self.config.encoding
    }

    async fn call_raw(
        &self,
        ctx: &Context,
        method: &str,
        args: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        if ctx.is_canceled() {
            return Err(Error::Canceled);
        }
        self.check_frame(&args)?;

        let seqid = self.seqid.fetch_add(1, Ordering::Relaxed);
        let request = self.exec.execute(Outgoing::Call {
            seqid,
            method: method.to_string(),
            args,
        });
        let deadline = sleep_or_pending(self.config.effective_timeout(timeout));

        tokio::select! {
            result = request => result?,
            _ = ctx.canceled() => {
                self.abandon(seqid, method);
                Err(Error::Canceled)
            }
            _ = deadline => {
                self.abandon(seqid, method);
                Err(Error::Timeout)
            }
        }
    }

    async fn notify_raw(
        &self,
        ctx: &Context,
        method: &str,
        args: Vec<u8>,
        timeout: Duration,
    ) -> Result<()> {
        if ctx.is_canceled() {
            return Err(Error::Canceled);
        }
        self.check_frame(&args)?;

        let request = self.exec.execute(Outgoing::Notify {
            method: method.to_string(),
            args,
        });
        let deadline = sleep_or_pending(self.config.effective_timeout(timeout));

        tokio::select! {
            result = request => result?.map(|_| ()),
            _ = ctx.canceled() => Err(Error::Canceled),
            _ = deadline => Err(Error::Timeout),
        }
    }
}

async fn sleep_or_pending(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => futures::future::pending::<()>().await,
    }
}

/// State owned by the task driving a single connection.
struct ConnectionTask {
    encoding: Encoding,
    router: Option<Arc<Router>>,
    runtime: runtime::Handle,
    /// Frames handed to the writer task
    writes: mpsc::UnboundedSender<Write>,
    /// Response frames produced by spawned handlers
    responses: mpsc::Sender<Message>,
    /// Outgoing calls waiting for their response frame
    pending: FnvHashMap<SeqId, Responder>,
    /// Inbound calls currently being handled, canceled on request
    inflight: FnvHashMap<SeqId, Context>,
}

impl ConnectionTask {
    async fn run<S>(
        mut self,
        mut frames: SplitStream<Framed<S, LengthDelimitedCodec>>,
        mut outgoing: ReceiverStream<(Outgoing, Responder)>,
        mut responses: mpsc::Receiver<Message>,
        mut shutdown: Shutdown,
    ) where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let mut outgoing_open = true;
        let writes = self.writes.clone();
        loop {
            tokio::select! {
                request = outgoing.next(), if outgoing_open => match request {
                    Some((request, responder)) => self.handle_outgoing(request, responder),
                    // all handles dropped, keep serving inbound traffic
                    None => outgoing_open = false,
                },
                Some(response) = responses.recv() => {
                    if let Message::Response { seqid, .. } = &response {
                        self.inflight.remove(seqid);
                    }
                    let _ = self.write(response, None);
                }
                frame = frames.next() => match frame {
                    Some(Ok(bytes)) => self.handle_incoming(&bytes),
                    Some(Err(e)) => {
                        warn!("connection read failed: {}", e);
                        break;
                    }
                    None => {
                        debug!("peer closed connection");
                        break;
                    }
                },
                _ = writes.closed() => {
                    debug!("connection writer stopped");
                    break;
                }
                _ = shutdown.recv() => {
                    debug!("connection shutting down");
                    break;
                }
            }
        }

        for (_, responder) in self.pending.drain() {
            let _ = responder.send(Err(Error::ConnectionClosed));
        }
        for (_, ctx) in self.inflight.drain() {
            ctx.cancel();
        }
    }

    /// Encodes and queues a frame for writing. With an `ack`, the outcome
    /// of the write is reported back through it.
    fn write(&self, msg: Message, ack: Option<Responder>) -> Result<()> {
        let bytes = match msg.to_bytes(self.encoding) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                warn!("failed encoding {} frame: {}", msg, e);
                if let Some(ack) = ack {
                    let _ = ack.send(Err(e.clone()));
                }
                return Err(e);
            }
        };
        if let Err(mpsc::error::SendError((_, ack))) = self.writes.send((bytes, ack)) {
            if let Some(ack) = ack {
                let _ = ack.send(Err(Error::ConnectionClosed));
            }
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    fn handle_outgoing(&mut self, request: Outgoing, responder: Responder) {
        match request {
            Outgoing::Call {
                seqid,
                method,
                args,
            } => {
                // parked before writing, the response may arrive right away
                self.pending.insert(seqid, responder);
                if let Err(e) = self.write(Message::Call { seqid, method, args }, None) {
                    if let Some(responder) = self.pending.remove(&seqid) {
                        let _ = responder.send(Err(e));
                    }
                }
            }
            Outgoing::Notify { method, args } => {
                let _ = self.write(Message::Notify { method, args }, Some(responder));
            }
            Outgoing::Cancel { seqid, method } => {
                if self.pending.remove(&seqid).is_some() {
                    let _ = self.write(Message::Cancel { seqid, method }, Some(responder));
                } else {
                    let _ = responder.send(Ok(Vec::new()));
                }
            }
        }
    }

    fn handle_incoming(&mut self, bytes: &[u8]) {
        let msg = match Message::from_bytes(bytes, self.encoding) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("dropping undecodable frame: {}", e);
                return;
            }
        };

        match msg {
            Message::Response {
                seqid,
                error,
                result,
            } => match self.pending.remove(&seqid) {
                Some(responder) => {
                    let outcome = match error {
                        Some(e) => Err(e),
                        None => Ok(result),
                    };
                    let _ = responder.send(outcome);
                }
                None => debug!("response for unknown call {}", seqid),
            },
            Message::Call {
                seqid,
                method,
                args,
            } => {
                let ctx = Context::new();
                self.inflight.insert(seqid, ctx.clone());
                let router = self.router.clone();
                let responses = self.responses.clone();
                let encoding = self.encoding;
                self.runtime.spawn(async move {
                    let outcome = match router {
                        Some(router) => {
                            router
                                .dispatch(ctx, &method, &args, encoding, MethodType::Call)
                                .await
                        }
                        None => Err(Error::ProtocolNotFound(method)),
                    };
                    if responses.send(Message::response(seqid, outcome)).await.is_err() {
                        debug!("connection gone before call {} finished", seqid);
                    }
                });
            }
            Message::Notify { method, args } => {
                let router = match &self.router {
                    Some(router) => router.clone(),
                    None => {
                        debug!("dropping notification {}, nothing is served", method);
                        return;
                    }
                };
                let encoding = self.encoding;
                self.runtime.spawn(async move {
                    if let Err(e) = router
                        .dispatch(Context::new(), &method, &args, encoding, MethodType::Notify)
                        .await
                    {
                        warn!("notification {} failed: {}", method, e);
                    }
                });
            }
            Message::Cancel { seqid, method } => {
                if let Some(ctx) = self.inflight.remove(&seqid) {
                    trace!("peer canceled call {} ({})", seqid, method);
                    ctx.cancel();
                }
            }
        }
    }
}

/// Writes queued frames until the queue is closed or a write fails.
async fn write_frames<S>(
    mut sink: SplitSink<Framed<S, LengthDelimitedCodec>, Bytes>,
    mut writes: mpsc::UnboundedReceiver<Write>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some((bytes, ack)) = writes.recv().await {
        let result = sink
            .send(bytes)
            .await
            .map_err(|e| Error::NetworkError(e.to_string()));
        let failed = result.is_err();
        if let Err(e) = &result {
            warn!("failed writing frame: {}", e);
        }
        if let Some(ack) = ack {
            let _ = ack.send(result.map(|_| Vec::new()));
        }
        if failed {
            break;
        }
    }
}
