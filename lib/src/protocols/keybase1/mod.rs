//! Bindings for a slice of the `keybase.1` namespace.
//!
//! Wire names are kept verbatim, including their historical casing.

pub mod apiserver;
pub mod common;
pub mod home;
pub mod notify_session;

pub use apiserver::{api_server_protocol, ApiServerClient, ApiServerInterface, APIRes};
pub use common::{Status, StatusCode, StringKVPair};
pub use home::{home_protocol, HomeClient, HomeInterface};
pub use notify_session::{notify_session_protocol, NotifySessionClient, NotifySessionInterface};
