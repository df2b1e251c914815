//! Body encoders and decoders.
//!
//! An [`Encoder`] turns a typed request body into wire bytes; a
//! [`Decoder`] turns response bytes back into a typed body. Both are
//! pure values attached to a request descriptor, so the execution core
//! never hardcodes an encoding format. Codec selection is explicit at
//! the call site (e.g. [`RequestBuilder::json`](crate::RequestBuilder::json));
//! nothing is resolved from runtime type identity.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DecodingError, EncodingError};

/// Transforms a request body into bytes.
pub trait Encoder<B>: Send + Sync {
    /// Encode `body` into wire bytes.
    fn encode(&self, body: &B) -> Result<Bytes, EncodingError>;
}

/// Transforms response bytes into a typed body.
///
/// Returning `Ok(None)` means the reply legitimately carried no body
/// (e.g. an empty payload); returning `Err` fails the whole execution
/// with a decoding error.
pub trait Decoder<B>: Send + Sync {
    /// Decode `bytes` into a body value.
    fn decode(&self, bytes: &[u8]) -> Result<Option<B>, DecodingError>;
}

impl<B, F> Encoder<B> for F
where
    F: Fn(&B) -> Result<Bytes, EncodingError> + Send + Sync,
{
    fn encode(&self, body: &B) -> Result<Bytes, EncodingError> {
        self(body)
    }
}

impl<B, F> Decoder<B> for F
where
    F: Fn(&[u8]) -> Result<Option<B>, DecodingError> + Send + Sync,
{
    fn decode(&self, bytes: &[u8]) -> Result<Option<B>, DecodingError> {
        self(bytes)
    }
}

/// JSON codec backed by `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<B: Serialize> Encoder<B> for JsonCodec {
    fn encode(&self, body: &B) -> Result<Bytes, EncodingError> {
        serde_json::to_vec(body)
            .map(Bytes::from)
            .map_err(|e| EncodingError::with_source("failed to serialize JSON body", e))
    }
}

impl<B: DeserializeOwned> Decoder<B> for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Option<B>, DecodingError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(bytes)
            .map(Some)
            .map_err(|e| DecodingError::with_source("failed to deserialize JSON body", e))
    }
}

/// UTF-8 text codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl Encoder<String> for TextCodec {
    fn encode(&self, body: &String) -> Result<Bytes, EncodingError> {
        Ok(Bytes::from(body.clone()))
    }
}

impl Decoder<String> for TextCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Option<String>, DecodingError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| DecodingError::with_source("response body is not valid UTF-8", e))
    }
}

/// Raw bytes codec; bodies pass through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytesCodec;

impl Encoder<Bytes> for BytesCodec {
    fn encode(&self, body: &Bytes) -> Result<Bytes, EncodingError> {
        Ok(body.clone())
    }
}

impl Decoder<Bytes> for BytesCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Option<Bytes>, DecodingError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(Bytes::copy_from_slice(bytes)))
    }
}

/// URL-encoded form codec for ordered key/value pairs.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormCodec;

impl Encoder<Vec<(String, String)>> for FormCodec {
    fn encode(&self, body: &Vec<(String, String)>) -> Result<Bytes, EncodingError> {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in body {
            serializer.append_pair(name, value);
        }
        Ok(Bytes::from(serializer.finish()))
    }
}

impl Decoder<Vec<(String, String)>> for FormCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Option<Vec<(String, String)>>, DecodingError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let pairs = url::form_urlencoded::parse(bytes)
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Ok(Some(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_codec_round_trips_values() {
        let encoded = JsonCodec.encode(&serde_json::json!({"key": "value"})).unwrap();
        let decoded: Option<serde_json::Value> = JsonCodec.decode(&encoded).unwrap();
        assert_eq!(decoded, Some(serde_json::json!({"key": "value"})));
    }

    #[test]
    fn json_codec_treats_empty_body_as_none() {
        let decoded: Option<serde_json::Value> = JsonCodec.decode(b"  \n").unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn json_codec_rejects_malformed_input() {
        let result: Result<Option<serde_json::Value>, _> = JsonCodec.decode(b"{not json");
        assert!(result.is_err());
    }

    #[test]
    fn text_codec_rejects_invalid_utf8() {
        assert!(TextCodec.decode(&[0xff, 0xfe]).is_err());
        assert_eq!(
            TextCodec.decode(b"hello").unwrap(),
            Some(String::from("hello"))
        );
    }

    #[test]
    fn form_codec_preserves_order_and_duplicates() {
        let pairs = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "3".to_string()),
        ];
        let encoded = FormCodec.encode(&pairs).unwrap();
        assert_eq!(&encoded[..], b"a=1&b=2&a=3");
        assert_eq!(FormCodec.decode(&encoded).unwrap(), Some(pairs));
    }

    #[test]
    fn closure_encoders_are_usable() {
        let encoder = |body: &u32| Ok(Bytes::from(body.to_string()));
        assert_eq!(&Encoder::encode(&encoder, &7).unwrap()[..], b"7");
    }
}
