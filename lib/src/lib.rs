//! `protobind` provides the runtime side of generated protocol bindings.
//!
//! Every service described in the interface definition language turns into
//! the same three things: plain records and enums, variant (tagged-union)
//! records, and a dispatch table plus a client stub that talk to each other
//! over a shared transport. This crate holds the machinery all of them
//! reuse:
//!
//! - [`protocol_enum!`], [`variant!`] and [`protocol!`] stand in for the
//!   binding generator and expand into the per-service code,
//! - [`rpc`] defines the dispatch table ([`rpc::Protocol`]), the server-side
//!   [`rpc::Router`] and the client-side [`rpc::GenericClient`] surface,
//! - [`net`] carries a framed transport implementing that surface, both over
//!   TCP and in-process.
//!
//! Example bindings live in [`protocols`].

#[macro_use]
extern crate log;
#[doc(hidden)]
#[macro_use]
pub extern crate serde;

pub mod config;
pub mod enums;
pub mod error;
pub mod executor;
pub mod net;
pub mod protocols;
pub mod rpc;
pub mod util;
pub mod variant;

pub use config::ConnectionConfig;
pub use enums::ProtocolEnum;
pub use error::{Error, Result};
pub use executor::{Executor, LocalExec};
pub use net::{CompositeAddress, Encoding};
pub use rpc::{Context, GenericClient, Protocol, Router};
pub use variant::{DeepCopy, Variant};

/// Re-exports used by the declaration macros.
#[doc(hidden)]
pub mod __private {
    pub use ::async_trait::async_trait;
    pub use crate::serde;
}
