//! The [`Codec`] seam between typed messages and bytes.
//!
//! The engine and hub never pick a wire format themselves; they are
//! handed a `Codec`. [`JsonCodec`] is the only implementation today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec is shared by every session
/// runner and connection task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes `value`.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes `data` into an owned `T`.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] on malformed or mismatched input.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use shedder_protocol::{Action, Codec, JsonCodec, PlayerId};
///
/// let codec = JsonCodec;
/// let action = Action::draw(PlayerId::new("p1"));
/// let bytes = codec.encode(&action).unwrap();
/// let decoded: Action = codec.decode(&bytes).unwrap();
/// assert_eq!(action, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
