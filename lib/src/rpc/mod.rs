//! Defines the generic machinery shared by all generated protocols: the
//! dispatch table on the serving side and the typed call surface on the
//! calling side.

use std::fmt::{Display, Formatter};

use tokio_util::sync::CancellationToken;

pub mod client;
pub mod msg;
pub mod protocol;
pub mod server;
mod stub;

pub use client::GenericClient;
pub use protocol::{Args, Handler, MakeArg, MethodDescription, Protocol, Reply};
pub use server::Router;

/// Whether a method expects a response.
///
/// Fixed per method when the binding is generated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodType {
    /// Request/response
    Call,
    /// Fire-and-forget, no response is ever sent back
    Notify,
}

impl Display for MethodType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Notify => write!(f, "notify"),
        }
    }
}

/// Describes additional information about a procedure call.
///
/// Passed through every client stub and every handler. Cancellation is
/// cooperative: canceling the context makes an in-flight call resolve with
/// [`crate::Error::Canceled`] and tells the remote handler to wind down, but
/// nothing is forcibly aborted.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancel: CancellationToken,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a context that is canceled together with this one, but can
    /// also be canceled on its own.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel()
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the context is canceled.
    pub async fn canceled(&self) {
        self.cancel.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::Context;

    #[tokio::test]
    async fn child_follows_parent() {
        let parent = Context::new();
        let child = parent.child();
        let sibling = parent.child();

        child.cancel();
        assert!(child.is_canceled());
        assert!(!parent.is_canceled());
        assert!(!sibling.is_canceled());

        parent.cancel();
        sibling.canceled().await;
        assert!(sibling.is_canceled());
    }
}
