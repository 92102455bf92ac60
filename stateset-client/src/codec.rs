use error_stack::{Result, ResultExt};
use prost::Message;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to decode protobuf message")]
    Decode,
    #[error("failed to decode json message")]
    DecodeJson,
    #[error("failed to encode json message")]
    EncodeJson,
}

/// Binary and JSON encodings shared by every stateset message.
///
/// Binary encoding is standard protobuf: fields equal to their default are omitted, unknown fields
/// are skipped on decode. The JSON form follows the chain's REST gateway, so 64-bit unsigned
/// integers are decimal strings and bytes are base64. Decoding JSON fills every absent or `null`
/// field with its default.
pub trait Codec: Message + Default + Serialize + DeserializeOwned {
    fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::decode(bytes).change_context(Error::Decode)
    }

    fn to_json(&self) -> Result<Value, Error> {
        serde_json::to_value(self).change_context(Error::EncodeJson)
    }

    fn from_json(value: Value) -> Result<Self, Error> {
        serde_json::from_value(value).change_context(Error::DecodeJson)
    }

    /// Builds a message from a partial JSON object. `null` stands for the empty message.
    fn from_partial(partial: Value) -> Result<Self, Error> {
        match partial {
            Value::Null => Ok(Self::default()),
            partial => Self::from_json(partial),
        }
    }
}

impl<T> Codec for T where T: Message + Default + Serialize + DeserializeOwned {}
