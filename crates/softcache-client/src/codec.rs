//! Payload encoding at the storage boundary.

use serde::de::DeserializeOwned;
use serde::Serialize;
use softcache_core::SoftcacheResult;

/// Turns values into the strings the store holds, and back.
pub trait Codec: Send + Sync {
    /// Encodes a value for storage.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> SoftcacheResult<String>;

    /// Decodes a stored payload.
    fn decode<T: DeserializeOwned>(&self, raw: &str) -> SoftcacheResult<T>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> SoftcacheResult<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, raw: &str) -> SoftcacheResult<T> {
        Ok(serde_json::from_str(raw)?)
    }
}
