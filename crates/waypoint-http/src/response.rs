//! Typed HTTP responses and response assembly.

use std::collections::HashMap;

use crate::codec::Decoder;
use crate::error::DecodingError;
use crate::transport::TransportReply;

/// A decoded HTTP response.
///
/// Status code and headers are populated only when the transport reply
/// carried HTTP metadata; an opaque reply still yields a decoded body.
/// Header names and values are captured as plain string pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response<B> {
    /// The final request URL, if the transport reported one.
    pub url: Option<String>,
    /// The HTTP status code, if the reply was an HTTP response.
    pub status_code: Option<u16>,
    /// Response headers, if the reply was an HTTP response.
    pub headers: Option<HashMap<String, String>>,
    /// The decoded body, if the reply carried one.
    pub body: Option<B>,
}

impl<B> Response<B> {
    /// An empty response with no metadata and no body.
    pub fn empty() -> Self {
        Self {
            url: None,
            status_code: None,
            headers: None,
            body: None,
        }
    }

    /// A response carrying only a body.
    pub fn of(body: B) -> Self {
        Self {
            body: Some(body),
            ..Self::empty()
        }
    }

    /// A response with a status code and a body, as used for
    /// pre-built fallback responses.
    pub fn with_status(status_code: u16, body: B) -> Self {
        Self {
            status_code: Some(status_code),
            body: Some(body),
            ..Self::empty()
        }
    }

    /// Whether the status code is present and in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status_code.is_some_and(|code| (200..300).contains(&code))
    }

    /// Look up a header value by name (exact match on the captured key).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(name))
            .map(String::as_str)
    }

    /// Map the body to a different type, keeping all metadata.
    pub fn map<T>(self, f: impl FnOnce(B) -> T) -> Response<T> {
        Response {
            url: self.url,
            status_code: self.status_code,
            headers: self.headers,
            body: self.body.map(f),
        }
    }
}

/// Turn a raw transport reply into a typed [`Response`].
///
/// Decode failure supersedes an otherwise-successful transport result:
/// no partial response is ever produced.
pub(crate) fn assemble<B>(
    decoder: &dyn Decoder<B>,
    reply: TransportReply,
) -> Result<Response<B>, DecodingError> {
    let body = decoder.decode(&reply.bytes)?;
    let response = match reply.metadata {
        Some(metadata) => Response {
            url: metadata.url,
            status_code: Some(metadata.status),
            headers: Some(metadata.headers.into_iter().collect()),
            body,
        },
        // Opaque (non-HTTP) reply: body only.
        None => Response {
            body,
            ..Response::empty()
        },
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::codec::TextCodec;
    use crate::transport::HttpMetadata;

    fn http_reply(status: u16, body: &str) -> TransportReply {
        TransportReply {
            bytes: Bytes::copy_from_slice(body.as_bytes()),
            metadata: Some(HttpMetadata {
                url: Some("https://example.com/".to_string()),
                status,
                headers: vec![("content-type".to_string(), "text/plain".to_string())],
            }),
        }
    }

    #[test]
    fn assembles_http_replies_with_metadata() {
        let response = assemble(&TextCodec, http_reply(200, "hello")).unwrap();
        assert_eq!(response.status_code, Some(200));
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.body.as_deref(), Some("hello"));
        assert!(response.is_success());
    }

    #[test]
    fn opaque_replies_still_populate_the_body() {
        let reply = TransportReply {
            bytes: Bytes::from_static(b"raw"),
            metadata: None,
        };
        let response = assemble(&TextCodec, reply).unwrap();
        assert_eq!(response.status_code, None);
        assert_eq!(response.headers, None);
        assert_eq!(response.body.as_deref(), Some("raw"));
        assert!(!response.is_success());
    }

    #[test]
    fn map_transforms_the_body_and_keeps_metadata() {
        let response = assemble(&TextCodec, http_reply(200, "hello")).unwrap();
        let mapped = response.map(|body| body.len());

        assert_eq!(mapped.status_code, Some(200));
        assert_eq!(mapped.header("content-type"), Some("text/plain"));
        assert_eq!(mapped.body, Some(5));
    }

    #[test]
    fn decode_failure_produces_no_partial_response() {
        let reply = TransportReply {
            bytes: Bytes::from_static(&[0xff]),
            metadata: Some(HttpMetadata {
                url: None,
                status: 200,
                headers: Vec::new(),
            }),
        };
        assert!(assemble::<String>(&TextCodec, reply).is_err());
    }
}
