//! Server-side routing of inbound calls to registered protocols.

use fnv::FnvHashMap;

use crate::net::Encoding;
use crate::rpc::{Context, MethodDescription, MethodType, Protocol};
use crate::{Error, Result};

/// Set of registered protocols, keyed by protocol name.
///
/// Protocols are registered up front; the router is then wrapped in an `Arc`
/// and handed to the transport, after which it is only ever read. Lookups
/// are safe to perform from any number of concurrently handled calls.
#[derive(Clone, Default)]
pub struct Router {
    protocols: FnvHashMap<String, Protocol>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, protocol: Protocol) -> Result<()> {
        if self.protocols.contains_key(&protocol.name) {
            return Err(Error::ProtocolAlreadyRegistered(protocol.name));
        }
        debug!(
            "registered protocol {} with {} methods",
            protocol.name,
            protocol.methods.len()
        );
        self.protocols.insert(protocol.name.clone(), protocol);
        Ok(())
    }

    /// Builder-style variant of [`Router::register`].
    pub fn with(mut self, protocol: Protocol) -> Result<Self> {
        self.register(protocol)?;
        Ok(self)
    }

    pub fn protocol_names(&self) -> Vec<&str> {
        let mut names = self.protocols.keys().map(|s| s.as_str()).collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Finds the method registered under the fully qualified wire name,
    /// `<namespace>.<service>.<method>`.
    pub fn lookup(&self, wire_name: &str) -> Result<&MethodDescription> {
        let (protocol_name, method_name) = wire_name
            .rsplit_once('.')
            .ok_or_else(|| Error::ProtocolNotFound(wire_name.to_string()))?;
        let protocol = self
            .protocols
            .get(protocol_name)
            .ok_or_else(|| Error::ProtocolNotFound(protocol_name.to_string()))?;
        protocol
            .methods
            .get(method_name)
            .ok_or_else(|| Error::MethodNotFound {
                protocol: protocol_name.to_string(),
                method: method_name.to_string(),
            })
    }

    /// Routes a single inbound message to its handler.
    ///
    /// Allocates a fresh argument holder, decodes the payload into it and
    /// invokes the handler. Returns the encoded reply. Handler errors are
    /// returned untouched.
    pub async fn dispatch(
        &self,
        ctx: Context,
        wire_name: &str,
        payload: &[u8],
        encoding: Encoding,
        method_type: MethodType,
    ) -> Result<Vec<u8>> {
        let method = self.lookup(wire_name)?;
        if method.method_type != method_type {
            return Err(Error::WrongMethodType {
                method: wire_name.to_string(),
                expected: method.method_type.to_string(),
                actual: method_type.to_string(),
            });
        }

        let mut args = (method.make_arg)();
        args.decode(payload, encoding)?;

        let reply = (method.handler)(ctx, args).await?;
        reply.encode(encoding)
    }
}
