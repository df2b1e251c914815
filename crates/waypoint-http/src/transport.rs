//! The transport boundary.
//!
//! A [`Transport`] performs the actual network I/O for one wire-level
//! request and reports back raw bytes plus optional HTTP metadata. The
//! execution core treats the transport as an injected capability, so
//! tests can substitute a double that controls timing deterministically.

use bytes::Bytes;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::TransportError;
use crate::wire::WireRequest;

/// HTTP-specific reply metadata.
///
/// Absent from a [`TransportReply`] when the transport produced an
/// opaque (non-HTTP) response.
#[derive(Clone, Debug)]
pub struct HttpMetadata {
    /// The final URL the reply came from.
    pub url: Option<String>,
    /// The HTTP status code.
    pub status: u16,
    /// Header name/value pairs, reduced to plain strings.
    pub headers: Vec<(String, String)>,
}

/// The raw outcome of one transport exchange.
#[derive(Clone, Debug)]
pub struct TransportReply {
    /// The raw response body bytes.
    pub bytes: Bytes,
    /// HTTP metadata, when the reply was an HTTP response.
    pub metadata: Option<HttpMetadata>,
}

/// Performs network I/O for wire-level requests.
///
/// The single entry point resolves exactly once, with either a reply
/// or a transport error. Dropping the returned future cancels the
/// in-flight exchange.
pub trait Transport: Send + Sync {
    /// Submit `request` and await its reply.
    fn submit(&self, request: WireRequest)
    -> BoxFuture<'static, Result<TransportReply, TransportError>>;
}

/// The default transport, delegating to `reqwest` (and through it to
/// the platform's connection handling).
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .build()
                .expect("Failed to create HTTP client with default configuration"),
        }
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    fn submit(
        &self,
        request: WireRequest,
    ) -> BoxFuture<'static, Result<TransportReply, TransportError>> {
        let client = self.client.clone();
        async move {
            let mut builder = client
                .request(request.method, request.url)
                .timeout(request.timeout)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(TransportError::from)?;

            let metadata = HttpMetadata {
                url: Some(response.url().to_string()),
                status: response.status().as_u16(),
                headers: response
                    .headers()
                    .iter()
                    .map(|(name, value)| {
                        (
                            name.to_string(),
                            String::from_utf8_lossy(value.as_bytes()).into_owned(),
                        )
                    })
                    .collect(),
            };
            let bytes = response.bytes().await.map_err(TransportError::from)?;

            Ok(TransportReply {
                bytes,
                metadata: Some(metadata),
            })
        }
        .boxed()
    }
}
