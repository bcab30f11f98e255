use std::net::AddrParseError;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Enumeration of all possible errors.
///
/// Errors are serializable so that whatever a handler returns can be shipped
/// back over the wire and handed to the caller as the very same variant.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// Wire arguments did not match the argument envelope expected by the
    /// method. Signals a schema mismatch between peers, never retried.
    #[error("type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },
    /// Variant discriminant points at a payload slot that is absent.
    #[error("variant integrity error: {0}")]
    VariantIntegrity(String),

    #[error("protocol not found: {0}")]
    ProtocolNotFound(String),
    #[error("method {method} not found in protocol {protocol}")]
    MethodNotFound { protocol: String, method: String },
    #[error("protocol already registered: {0}")]
    ProtocolAlreadyRegistered(String),
    #[error("wrong method type for {method}: expected {expected}, got {actual}")]
    WrongMethodType {
        method: String,
        expected: String,
        actual: String,
    },

    /// Business-level status returned by a service implementation.
    #[error("{name} ({code}): {desc}")]
    Status { code: i32, name: String, desc: String },

    #[error("timed out")]
    Timeout,
    #[error("canceled")]
    Canceled,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("io error: {0}")]
    IoError(String),
    #[error("msgpack encode error: {0}")]
    MsgPackEncodeError(String),
    #[error("msgpack decode error: {0}")]
    MsgPackDecodeError(String),
    #[error("serde json error: {0}")]
    SerdeJsonError(String),
    #[error("toml deserialization error: {0}")]
    TomlDeserError(String),
    #[error("failed parsing address: {0}")]
    AddrParseError(String),
    #[error("parsing error: {0}")]
    ParsingError(String),
    #[error("encoding not available: {0}")]
    EncodingUnavailable(String),

    #[error("tokio oneshot receive error: {0}")]
    TokioOneshotRecvError(String),

    #[error("other: {0}")]
    Other(String),
}

impl Error {
    /// Creates a type error describing the expected and actual argument
    /// shapes.
    pub fn type_error(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the error was produced by the transport rather than by the
    /// framework or the remote handler.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::Canceled
                | Self::ConnectionClosed
                | Self::NetworkError(_)
                | Self::FrameTooLarge(_)
                | Self::IoError(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

impl From<AddrParseError> for Error {
    fn from(e: AddrParseError) -> Self {
        Self::AddrParseError(e.to_string())
    }
}

#[cfg(feature = "msgpack_encoding")]
impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::MsgPackEncodeError(e.to_string())
    }
}

#[cfg(feature = "msgpack_encoding")]
impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Self::MsgPackDecodeError(e.to_string())
    }
}

#[cfg(feature = "json_encoding")]
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::SerdeJsonError(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::TomlDeserError(e.to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(e: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::TokioOneshotRecvError(e.to_string())
    }
}
