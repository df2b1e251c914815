//! Request descriptors.
//!
//! A descriptor is an immutable value describing everything needed to
//! build and interpret one HTTP exchange. The [`Requestable`] trait is
//! the boundary the execution core consumes; [`Request`] is the
//! concrete descriptor produced by [`RequestBuilder`], and
//! [`AnyRequest`] erases a descriptor's concrete type for passing
//! across API boundaries.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::Authentication;
use crate::codec::{BytesCodec, Decoder, Encoder, JsonCodec, TextCodec};
use crate::method::Method;
use crate::response::Response;
use crate::validate::{HttpResponseError, PassthroughValidator, StatusCodeValidator, Validator};

/// Default per-request wire timeout (distinct from the manager SLA).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// An immutable description of one HTTP exchange.
///
/// The execution core reads a descriptor once per attempt to derive a
/// fresh wire request; the descriptor itself never changes during
/// execution. Accessors return owned values so that deferred fields
/// can be materialized at read time.
pub trait Requestable: Send + Sync {
    /// The request/response body type.
    type Body: Send + 'static;
    /// The validation error type produced by the validator.
    type Error: Send + 'static;

    /// Path appended to the manager's host.
    fn path(&self) -> String {
        String::new()
    }

    /// Query pairs in insertion order; duplicate names are kept.
    fn query(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// The HTTP verb.
    fn method(&self) -> Method {
        Method::Get
    }

    /// Request headers.
    fn headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// The request body, if any.
    fn body(&self) -> Option<Self::Body> {
        None
    }

    /// Per-request credential, overriding the manager's backup
    /// authentication.
    fn authentication(&self) -> Option<Authentication> {
        None
    }

    /// Pre-built response substituted if the live request ultimately
    /// fails. Still subject to validation.
    fn fallback_response(&self) -> Option<Response<Self::Body>> {
        None
    }

    /// Wire timeout for a single attempt.
    fn timeout(&self) -> Duration {
        DEFAULT_REQUEST_TIMEOUT
    }

    /// The body encoder.
    fn encoder(&self) -> Arc<dyn Encoder<Self::Body>>;

    /// The body decoder.
    fn decoder(&self) -> Arc<dyn Decoder<Self::Body>>;

    /// The response validator.
    fn validator(&self) -> Arc<dyn Validator<Self::Body, Self::Error>>;
}

/// A type-erased descriptor with the body and error types fixed.
pub struct AnyRequest<B, E> {
    inner: Box<dyn Requestable<Body = B, Error = E>>,
}

impl<B: Send + 'static, E: Send + 'static> AnyRequest<B, E> {
    /// Erase the concrete type of `request`.
    pub fn new(request: impl Requestable<Body = B, Error = E> + 'static) -> Self {
        Self {
            inner: Box::new(request),
        }
    }
}

impl<B: Send + 'static, E: Send + 'static> Requestable for AnyRequest<B, E> {
    type Body = B;
    type Error = E;

    fn path(&self) -> String {
        self.inner.path()
    }

    fn query(&self) -> Vec<(String, String)> {
        self.inner.query()
    }

    fn method(&self) -> Method {
        self.inner.method()
    }

    fn headers(&self) -> HeaderMap {
        self.inner.headers()
    }

    fn body(&self) -> Option<B> {
        self.inner.body()
    }

    fn authentication(&self) -> Option<Authentication> {
        self.inner.authentication()
    }

    fn fallback_response(&self) -> Option<Response<B>> {
        self.inner.fallback_response()
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    fn encoder(&self) -> Arc<dyn Encoder<B>> {
        self.inner.encoder()
    }

    fn decoder(&self) -> Arc<dyn Decoder<B>> {
        self.inner.decoder()
    }

    fn validator(&self) -> Arc<dyn Validator<B, E>> {
        self.inner.validator()
    }
}

/// A field holding either a literal value or a deferred thunk
/// evaluated each time the descriptor is read.
enum Field<T> {
    Value(T),
    Deferred(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T: Clone> Field<T> {
    fn get(&self) -> T {
        match self {
            Self::Value(value) => value.clone(),
            Self::Deferred(thunk) => thunk(),
        }
    }
}

impl<T> Field<T> {
    fn literal(value: impl Into<T>) -> Self {
        Self::Value(value.into())
    }

    fn deferred(thunk: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::Deferred(Arc::new(thunk))
    }
}

/// The concrete descriptor produced by [`RequestBuilder`].
pub struct Request<B, E = HttpResponseError> {
    path: Field<String>,
    method: Method,
    query: Vec<Field<(String, String)>>,
    headers: Vec<Field<(String, String)>>,
    body: Option<Field<B>>,
    authentication: Option<Authentication>,
    fallback_response: Option<Response<B>>,
    timeout: Duration,
    encoder: Arc<dyn Encoder<B>>,
    decoder: Arc<dyn Decoder<B>>,
    validator: Arc<dyn Validator<B, E>>,
}

impl<B, E> Requestable for Request<B, E>
where
    B: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    type Body = B;
    type Error = E;

    fn path(&self) -> String {
        self.path.get()
    }

    fn query(&self) -> Vec<(String, String)> {
        self.query.iter().map(Field::get).collect()
    }

    fn method(&self) -> Method {
        self.method
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for entry in &self.headers {
            let (name, value) = entry.get();
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => {
                    tracing::warn!(
                        target: "waypoint_http::request",
                        header = %name,
                        "Skipping invalid request header"
                    );
                }
            }
        }
        headers
    }

    fn body(&self) -> Option<B> {
        self.body.as_ref().map(Field::get)
    }

    fn authentication(&self) -> Option<Authentication> {
        self.authentication.clone()
    }

    fn fallback_response(&self) -> Option<Response<B>> {
        self.fallback_response.clone()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn encoder(&self) -> Arc<dyn Encoder<B>> {
        self.encoder.clone()
    }

    fn decoder(&self) -> Arc<dyn Decoder<B>> {
        self.decoder.clone()
    }

    fn validator(&self) -> Arc<dyn Validator<B, E>> {
        self.validator.clone()
    }
}

/// Fluent builder for [`Request`] descriptors.
///
/// Every field accepts either a literal value or (via the `_with`
/// variants) a zero-argument closure evaluated each time the built
/// descriptor is read. Repeated header and query additions accumulate
/// in call order; on header name collision the later entry wins.
pub struct RequestBuilder<B, E = HttpResponseError> {
    request: Request<B, E>,
}

impl<B, E> RequestBuilder<B, E> {
    /// Start a builder with an explicit encoder/decoder pair.
    pub fn with_codec(
        method: Method,
        path: impl Into<String>,
        encoder: impl Encoder<B> + 'static,
        decoder: impl Decoder<B> + 'static,
    ) -> Self {
        Self {
            request: Request {
                path: Field::literal(path.into()),
                method,
                query: Vec::new(),
                headers: Vec::new(),
                body: None,
                authentication: None,
                fallback_response: None,
                timeout: DEFAULT_REQUEST_TIMEOUT,
                encoder: Arc::new(encoder),
                decoder: Arc::new(decoder),
                validator: Arc::new(PassthroughValidator),
            },
        }
    }

    /// Defer the path to a closure evaluated at read time.
    pub fn path_with(mut self, path: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.request.path = Field::deferred(path);
        self
    }

    /// Append a query pair.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .query
            .push(Field::literal((name.into(), value.into())));
        self
    }

    /// Append a deferred query pair.
    pub fn query_with(
        mut self,
        pair: impl Fn() -> (String, String) + Send + Sync + 'static,
    ) -> Self {
        self.request.query.push(Field::deferred(pair));
        self
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .headers
            .push(Field::literal((name.into(), value.into())));
        self
    }

    /// Append a deferred header.
    pub fn header_with(
        mut self,
        header: impl Fn() -> (String, String) + Send + Sync + 'static,
    ) -> Self {
        self.request.headers.push(Field::deferred(header));
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: B) -> Self {
        self.request.body = Some(Field::Value(body));
        self
    }

    /// Set a deferred request body.
    pub fn body_with(mut self, body: impl Fn() -> B + Send + Sync + 'static) -> Self {
        self.request.body = Some(Field::deferred(body));
        self
    }

    /// Attach a credential to this request.
    pub fn authentication(mut self, auth: Authentication) -> Self {
        self.request.authentication = Some(auth);
        self
    }

    /// Attach HTTP Basic credentials.
    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.authentication(Authentication::basic(username, password))
    }

    /// Attach a bearer token.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.authentication(Authentication::bearer(token))
    }

    /// Set a pre-built response used if the live request fails.
    pub fn fallback_response(mut self, response: Response<B>) -> Self {
        self.request.fallback_response = Some(response);
        self
    }

    /// Set the wire timeout for a single attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    /// Replace the encoder.
    pub fn encoder(mut self, encoder: impl Encoder<B> + 'static) -> Self {
        self.request.encoder = Arc::new(encoder);
        self
    }

    /// Replace the decoder.
    pub fn decoder(mut self, decoder: impl Decoder<B> + 'static) -> Self {
        self.request.decoder = Arc::new(decoder);
        self
    }

    /// Replace the validator.
    pub fn validator(mut self, validator: impl Validator<B, E> + 'static) -> Self {
        self.request.validator = Arc::new(validator);
        self
    }

    /// Finish building the descriptor.
    pub fn build(self) -> Request<B, E> {
        self.request
    }
}

impl<B, E> RequestBuilder<B, E>
where
    B: Serialize + DeserializeOwned,
{
    /// Start a builder with the JSON codec on both sides.
    pub fn json(method: Method, path: impl Into<String>) -> Self {
        Self::with_codec(method, path, JsonCodec, JsonCodec)
    }
}

impl<E> RequestBuilder<String, E> {
    /// Start a builder for UTF-8 text bodies.
    pub fn text(method: Method, path: impl Into<String>) -> Self {
        Self::with_codec(method, path, TextCodec, TextCodec)
    }
}

impl<E> RequestBuilder<Bytes, E> {
    /// Start a builder for raw byte bodies.
    pub fn raw(method: Method, path: impl Into<String>) -> Self {
        Self::with_codec(method, path, BytesCodec, BytesCodec)
    }
}

impl<B> RequestBuilder<B, HttpResponseError> {
    /// Validate response status codes, rejecting anything outside
    /// `[200, 300)`.
    pub fn validate_status(self) -> Self {
        self.validator(StatusCodeValidator)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn builder_accumulates_query_in_call_order() {
        let request: Request<String> = RequestBuilder::text(Method::Get, "/search")
            .query("q", "first")
            .query("page", "1")
            .query("q", "again")
            .build();

        assert_eq!(
            request.query(),
            vec![
                ("q".to_string(), "first".to_string()),
                ("page".to_string(), "1".to_string()),
                ("q".to_string(), "again".to_string()),
            ]
        );
    }

    #[test]
    fn later_headers_win_on_name_collision() {
        let request: Request<String> = RequestBuilder::text(Method::Get, "/")
            .header("Accept", "text/plain")
            .header("accept", "application/json")
            .build();

        let headers = request.headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn invalid_headers_are_skipped() {
        let request: Request<String> = RequestBuilder::text(Method::Get, "/")
            .header("bad name", "value")
            .header("Good-Name", "value")
            .build();

        let headers = request.headers();
        assert_eq!(headers.len(), 1);
        assert!(headers.get("Good-Name").is_some());
    }

    #[test]
    fn deferred_fields_evaluate_on_each_read() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let request: Request<String> = RequestBuilder::text(Method::Get, "/")
            .path_with(|| {
                let n = CALLS.fetch_add(1, Ordering::SeqCst);
                format!("/generation/{n}")
            })
            .build();

        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        assert_eq!(request.path(), "/generation/0");
        assert_eq!(request.path(), "/generation/1");
    }

    #[test]
    fn defaults_match_the_descriptor_contract() {
        let request: Request<String> = RequestBuilder::text(Method::Post, "/submit").build();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert!(request.body().is_none());
        assert!(request.authentication().is_none());
        assert!(request.fallback_response().is_none());
    }

    #[test]
    fn erased_requests_delegate_to_the_wrapped_descriptor() {
        let request: Request<String> = RequestBuilder::text(Method::Delete, "/items/9")
            .bearer_auth("token")
            .build();
        let erased = AnyRequest::new(request);

        assert_eq!(erased.method(), Method::Delete);
        assert_eq!(erased.path(), "/items/9");
        assert_eq!(
            erased.authentication(),
            Some(Authentication::bearer("token"))
        );
    }
}
