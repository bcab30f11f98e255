//! Transport collaborator: encodings, addressing and framed connections.

use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

pub mod connection;
pub mod framed;
pub mod memory;

pub use connection::Connection;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompositeAddress {
    pub encoding: Option<Encoding>,
    pub transport: Option<Transport>,
    pub address: Address,
}

impl FromStr for CompositeAddress {
    type Err = Error;
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let (encoding, rest) = match s.split_once('@') {
            Some((encoding, rest)) => (Some(Encoding::from_str(encoding)?), rest),
            None => (None, s),
        };
        let (transport, address) = match rest.split_once("://") {
            Some((transport, address)) => (Some(Transport::from_str(transport)?), address),
            None => (None, rest),
        };
        Ok(CompositeAddress {
            encoding,
            transport,
            address: address.parse()?,
        })
    }
}

impl Display for CompositeAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut out = self.address.to_string();
        if let Some(transport) = self.transport {
            out = format!("{}://{}", transport, out);
        }
        if let Some(encoding) = self.encoding {
            out = format!("{}@{}", encoding, out);
        }
        write!(f, "{}", out)
    }
}

impl Default for CompositeAddress {
    fn default() -> Self {
        Self {
            encoding: None,
            transport: None,
            address: Address::default(),
        }
    }
}

impl CompositeAddress {
    pub fn available_net() -> Result<Self> {
        Ok(Self {
            encoding: None,
            transport: None,
            address: Address::Net(get_available_address()?),
        })
    }

    /// Transport to use, inferred from the address kind when not given
    /// explicitly.
    pub fn transport(&self) -> Transport {
        match (self.transport, &self.address) {
            (Some(transport), _) => transport,
            (None, Address::Net(_)) => Transport::FramedTcp,
            (None, Address::File(_)) => Transport::Unix,
        }
    }

    /// Replaces the `0.0.0.0` meta-address with loopback so the address can
    /// be dialed.
    pub fn normalize_non_routable(self) -> Self {
        match self.address {
            Address::Net(addr) if addr.ip().is_unspecified() => Self {
                address: Address::Net(SocketAddr::new(
                    IpAddr::V4(Ipv4Addr::LOCALHOST),
                    addr.port(),
                )),
                ..self
            },
            _ => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Address {
    Net(SocketAddr),
    /// Addressing scheme for file-based transports such as unix domain sockets
    File(String),
}

impl FromStr for Address {
    type Err = Error;
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        if s.contains('/') {
            Ok(Self::File(s.to_string()))
        } else {
            s.to_socket_addrs()?
                .next()
                .map(Self::Net)
                .ok_or_else(|| Error::AddrParseError(format!("no address resolved for: {}", s)))
        }
    }
}

impl TryInto<SocketAddr> for Address {
    type Error = Error;
    fn try_into(self) -> core::result::Result<SocketAddr, Self::Error> {
        match self {
            Address::Net(net) => Ok(net),
            Address::File(path) => Err(Error::AddrParseError(format!(
                "expected network address, got file path: {}",
                path
            ))),
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Net(net) => write!(f, "{}", net),
            Self::File(path) => write!(f, "{}", path),
        }
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::Net(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9090))
    }
}

/// Creates an easily bindable address using the `0.0.0.0` meta-address and
/// any available port.
pub fn get_available_address() -> Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("0.0.0.0:0")?;
    let addr = listener.local_addr()?;
    Ok(addr)
}

/// List of possible stream transports.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Transport {
    /// Length-delimited frames over a TCP stream
    FramedTcp,
    /// Length-delimited frames over a unix domain socket
    Unix,
}

impl Display for Transport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FramedTcp => write!(f, "tcp"),
            Self::Unix => write!(f, "unix"),
        }
    }
}

impl FromStr for Transport {
    type Err = Error;
    fn from_str(s: &str) -> core::result::Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "tcp" | "framed_tcp" => Ok(Transport::FramedTcp),
            "unix" | "uds" | "ipc" => Ok(Transport::Unix),
            _ => Err(Error::ParsingError(format!(
                "failed parsing transport from string: {}, available transports: {:?}",
                s,
                Transport::list_supported()
            ))),
        }
    }
}

impl Transport {
    /// Lists all supported transports.
    pub fn list_supported() -> Vec<String> {
        let mut list = vec![Transport::FramedTcp.to_string()];
        #[cfg(unix)]
        list.push(Transport::Unix.to_string());
        list
    }
}

/// List of possible formats for encoding data sent over the network.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Binary format with implementations in many different languages
    MsgPack,
    /// Very common but more verbose format
    Json,
}

impl Default for Encoding {
    fn default() -> Self {
        Self::MsgPack
    }
}

impl FromStr for Encoding {
    type Err = Error;
    fn from_str(s: &str) -> core::result::Result<Self, Error> {
        let e = match s.to_lowercase().as_str() {
            "msgpack" | "messagepack" | "rmp" => Self::MsgPack,
            "json" => Self::Json,
            _ => {
                return Err(Error::ParsingError(format!(
                    "failed parsing encoding from string: {}",
                    s
                )))
            }
        };
        Ok(e)
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MsgPack => write!(f, "msgpack"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Packs object into bytes based on selected encoding.
///
/// Msgpack output uses named struct fields, matching the map-shaped records
/// peers expect and letting absent variant slots be left out entirely.
pub fn encode<P: Serialize + ?Sized>(object: &P, encoding: Encoding) -> Result<Vec<u8>> {
    match encoding {
        Encoding::MsgPack => encode_msgpack(object),
        Encoding::Json => encode_json(object),
    }
}

/// Unpacks object from bytes based on selected encoding.
pub fn decode<P: DeserializeOwned>(bytes: &[u8], encoding: Encoding) -> Result<P> {
    match encoding {
        Encoding::MsgPack => decode_msgpack(bytes),
        Encoding::Json => decode_json(bytes),
    }
}

#[cfg(feature = "msgpack_encoding")]
fn encode_msgpack<P: Serialize + ?Sized>(object: &P) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(object)?)
}

#[cfg(not(feature = "msgpack_encoding"))]
fn encode_msgpack<P: Serialize + ?Sized>(_: &P) -> Result<Vec<u8>> {
    Err(Error::EncodingUnavailable(Encoding::MsgPack.to_string()))
}

#[cfg(feature = "msgpack_encoding")]
fn decode_msgpack<P: DeserializeOwned>(bytes: &[u8]) -> Result<P> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(not(feature = "msgpack_encoding"))]
fn decode_msgpack<P: DeserializeOwned>(_: &[u8]) -> Result<P> {
    Err(Error::EncodingUnavailable(Encoding::MsgPack.to_string()))
}

#[cfg(feature = "json_encoding")]
fn encode_json<P: Serialize + ?Sized>(object: &P) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(object)?)
}

#[cfg(not(feature = "json_encoding"))]
fn encode_json<P: Serialize + ?Sized>(_: &P) -> Result<Vec<u8>> {
    Err(Error::EncodingUnavailable(Encoding::Json.to_string()))
}

#[cfg(feature = "json_encoding")]
fn decode_json<P: DeserializeOwned>(bytes: &[u8]) -> Result<P> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(not(feature = "json_encoding"))]
fn decode_json<P: DeserializeOwned>(_: &[u8]) -> Result<P> {
    Err(Error::EncodingUnavailable(Encoding::Json.to_string()))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{decode, encode, Address, CompositeAddress, Encoding, Transport};
    use crate::Result;

    #[test]
    fn composite_address_parts() -> Result<()> {
        let addr = CompositeAddress::from_str("json@tcp://127.0.0.1:9123")?;
        assert_eq!(addr.encoding, Some(Encoding::Json));
        assert_eq!(addr.transport, Some(Transport::FramedTcp));
        assert_eq!(addr.address, Address::Net("127.0.0.1:9123".parse()?));
        assert_eq!(addr.to_string(), "json@tcp://127.0.0.1:9123");

        let addr = CompositeAddress::from_str("/tmp/keybased.sock")?;
        assert_eq!(addr.transport(), Transport::Unix);

        let addr = CompositeAddress::from_str("0.0.0.0:9124")?.normalize_non_routable();
        assert_eq!(addr.address, Address::Net("127.0.0.1:9124".parse()?));
        Ok(())
    }

    #[test]
    fn unknown_encoding_rejected() {
        assert!(CompositeAddress::from_str("bincode@tcp://127.0.0.1:1").is_err());
        assert!(Transport::from_str("quic").is_err());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        #[serde(rename = "sessionID")]
        session_id: i32,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        note: Option<String>,
    }

    #[test]
    fn msgpack_records_are_maps() -> Result<()> {
        let record = Record {
            session_id: 7,
            note: None,
        };
        let bytes = encode(&record, Encoding::MsgPack)?;
        // fixmap with a single entry, the absent optional is left out
        assert_eq!(bytes[0], 0x81);
        assert_eq!(decode::<Record>(&bytes, Encoding::MsgPack)?, record);

        let json = encode(&record, Encoding::Json)?;
        assert_eq!(json, br#"{"sessionID":7}"#.to_vec());
        Ok(())
    }
}
