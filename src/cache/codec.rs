//! Value Codec Module
//!
//! Optional hooks that keep values encoded inside the cache and decode them
//! on the way out.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{BoxError, CacheError, Result};

type SerializeFn<V> = Box<dyn Fn(&V) -> std::result::Result<Vec<u8>, BoxError> + Send + Sync>;
type DeserializeFn<V> = Box<dyn Fn(&[u8]) -> std::result::Result<V, BoxError> + Send + Sync>;

// == Value Codec ==
/// Pair of hooks converting values to and from their stored bytes.
pub struct ValueCodec<V> {
    serialize: SerializeFn<V>,
    deserialize: DeserializeFn<V>,
}

impl<V> ValueCodec<V> {
    pub fn new<S, D>(serialize: S, deserialize: D) -> Self
    where
        S: Fn(&V) -> std::result::Result<Vec<u8>, BoxError> + Send + Sync + 'static,
        D: Fn(&[u8]) -> std::result::Result<V, BoxError> + Send + Sync + 'static,
    {
        Self {
            serialize: Box::new(serialize),
            deserialize: Box::new(deserialize),
        }
    }

    pub fn encode(&self, value: &V) -> Result<Vec<u8>> {
        (self.serialize)(value).map_err(CacheError::Codec)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<V> {
        (self.deserialize)(bytes).map_err(CacheError::Codec)
    }
}

impl<V> std::fmt::Debug for ValueCodec<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCodec").finish_non_exhaustive()
    }
}

/// Codec storing values as JSON bytes.
pub fn json<V>() -> ValueCodec<V>
where
    V: Serialize + DeserializeOwned,
{
    ValueCodec::new(
        |value: &V| serde_json::to_vec(value).map_err(BoxError::from),
        |bytes: &[u8]| serde_json::from_slice(bytes).map_err(BoxError::from),
    )
}

// == Payload ==
/// What a record actually holds: the value itself, or its encoded bytes when
/// the cache was built with a codec.
#[derive(Debug, Clone)]
pub enum Payload<V> {
    Plain(V),
    Encoded(Vec<u8>),
}

impl<V: Clone> Payload<V> {
    /// Wraps `value` for storage, encoding it when a codec is present.
    pub fn wrap(value: &V, codec: Option<&ValueCodec<V>>) -> Result<Self> {
        match codec {
            Some(codec) => codec.encode(value).map(Payload::Encoded),
            None => Ok(Payload::Plain(value.clone())),
        }
    }

    /// Produces the caller-facing value, consuming the payload.
    pub fn into_value(self, codec: Option<&ValueCodec<V>>) -> Result<V> {
        match self {
            Payload::Plain(value) => Ok(value),
            Payload::Encoded(bytes) => match codec {
                Some(codec) => codec.decode(&bytes),
                None => Err(CacheError::Codec("encoded payload without a codec".into())),
            },
        }
    }

    /// Produces the caller-facing value from a borrowed payload.
    pub fn unwrap_with(&self, codec: Option<&ValueCodec<V>>) -> Result<V> {
        match (self, codec) {
            (Payload::Plain(value), _) => Ok(value.clone()),
            (Payload::Encoded(bytes), Some(codec)) => codec.decode(bytes),
            (Payload::Encoded(_), None) => Err(CacheError::Codec(
                "encoded payload without a codec".into(),
            )),
        }
    }
}
