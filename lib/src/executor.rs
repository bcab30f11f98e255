use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use crate::{Error, Result};

#[async_trait::async_trait]
pub trait Executor<IN, OUT> {
    async fn execute(&self, msg: IN) -> Result<OUT>;
}

/// Executor backed by a local channel.
///
/// Each request travels together with a oneshot sender; whoever consumes the
/// stream is free to hold on to that sender and answer later, which is how
/// the connection task parks outgoing calls until their response frame
/// arrives.
pub struct LocalExec<IN, OUT> {
    sender: mpsc::Sender<(IN, oneshot::Sender<OUT>)>,
}

// Manual impl, derive would require `IN: Clone, OUT: Clone`.
impl<IN, OUT> Clone for LocalExec<IN, OUT> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<IN, OUT> LocalExec<IN, OUT> {
    pub fn new(capacity: usize) -> (Self, ReceiverStream<(IN, oneshot::Sender<OUT>)>) {
        let (sender, receiver) = mpsc::channel::<(IN, oneshot::Sender<OUT>)>(capacity);
        let stream = ReceiverStream::new(receiver);
        (Self::new_from_sender(sender), stream)
    }

    pub fn new_from_sender(sender: mpsc::Sender<(IN, oneshot::Sender<OUT>)>) -> Self {
        Self { sender }
    }

    /// Whether the consuming side of the executor is gone.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[async_trait::async_trait]
impl<IN: Send, OUT: Send> Executor<IN, OUT> for LocalExec<IN, OUT> {
    async fn execute(&self, msg: IN) -> Result<OUT> {
        let (sender, receiver) = oneshot::channel::<OUT>();
        self.sender
            .send((msg, sender))
            .await
            .map_err(|_| Error::ConnectionClosed)?;
        Ok(receiver.await?)
    }
}

#[cfg(test)]
mod tests {
    use tokio_stream::StreamExt;

    use super::{Executor, LocalExec};
    use crate::{Error, Result};

    #[tokio::test]
    async fn answers_through_parked_sender() -> Result<()> {
        let (exec, mut stream) = LocalExec::<u32, u32>::new(4);
        tokio::spawn(async move {
            let mut parked = Vec::new();
            while let Some((n, snd)) = stream.next().await {
                parked.push((n, snd));
                if parked.len() == 2 {
                    for (n, snd) in parked.drain(..) {
                        let _ = snd.send(n * 10);
                    }
                }
            }
        });

        let (a, b) = tokio::join!(exec.execute(1), exec.execute(2));
        assert_eq!(a?, 10);
        assert_eq!(b?, 20);
        Ok(())
    }

    #[tokio::test]
    async fn dropped_consumer_closes() -> Result<()> {
        let (exec, stream) = LocalExec::<u32, u32>::new(1);
        drop(stream);
        assert!(exec.is_closed());
        assert_eq!(exec.execute(1).await, Err(Error::ConnectionClosed));
        Ok(())
    }
}
