//! Message definitions.
//!
//! Frames follow the four msgpack-rpc message kinds. Argument and result
//! payloads are kept as opaque encoded bytes so that only the dispatch layer,
//! which knows the concrete envelope type, ever decodes them.

use enum_as_inner::EnumAsInner;

use crate::net::{decode, encode, Encoding};
use crate::{Error, Result};

pub type SeqId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, strum::Display)]
pub enum Message {
    Call {
        seqid: SeqId,
        method: String,
        #[serde(with = "serde_bytes")]
        args: Vec<u8>,
    },
    Response {
        seqid: SeqId,
        error: Option<Error>,
        #[serde(with = "serde_bytes")]
        result: Vec<u8>,
    },
    Notify {
        method: String,
        #[serde(with = "serde_bytes")]
        args: Vec<u8>,
    },
    Cancel {
        seqid: SeqId,
        method: String,
    },
}

impl Message {
    /// Deserializes from bytes.
    pub fn from_bytes(bytes: &[u8], encoding: Encoding) -> Result<Message> {
        decode(bytes, encoding)
    }

    /// Serializes into bytes.
    pub fn to_bytes(&self, encoding: Encoding) -> Result<Vec<u8>> {
        encode(self, encoding)
    }

    /// Builds the response frame for the outcome of a call.
    pub fn response(seqid: SeqId, outcome: Result<Vec<u8>>) -> Message {
        match outcome {
            Ok(result) => Message::Response {
                seqid,
                error: None,
                result,
            },
            Err(error) => Message::Response {
                seqid,
                error: Some(error),
                result: Vec::new(),
            },
        }
    }
}
