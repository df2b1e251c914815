//! Wire request construction.
//!
//! Pure transformation of a host, a request descriptor, and the
//! manager's configuration snapshot into a transport-ready request.
//! No I/O happens here; every failure maps to
//! [`RequestError::MalformedRequest`](crate::RequestError::MalformedRequest).

use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, AUTHORIZATION, USER_AGENT};
use http::{HeaderMap, HeaderValue};
use url::Url;

use crate::error::EncodingError;
use crate::manager::ManagerConfig;
use crate::request::Requestable;

/// A fully-resolved, transport-ready HTTP request.
#[derive(Clone, Debug)]
pub struct WireRequest {
    /// The final URL (host + descriptor path + query).
    pub url: Url,
    /// The HTTP method.
    pub method: http::Method,
    /// Merged request headers.
    pub headers: HeaderMap,
    /// Encoded body bytes, if the descriptor carried a body.
    pub body: Option<Bytes>,
    /// Wire timeout for this attempt.
    pub timeout: Duration,
}

/// Why a wire request could not be built. Collapsed to
/// `MalformedRequest` at the orchestrator boundary; the detail exists
/// for logging only.
#[derive(Debug, thiserror::Error)]
pub(crate) enum WireError {
    #[error("invalid host URL")]
    InvalidHost(#[source] url::ParseError),
    #[error("body encoding failed")]
    Encoding(#[source] EncodingError),
    #[error("authorization credential is not a valid header value")]
    InvalidAuthorization,
}

/// Build the wire request for one attempt.
///
/// Header precedence, ascending: injected defaults, descriptor
/// headers, manager additional headers. A resolved credential
/// overrides any `Authorization` header set by those stages.
pub(crate) fn build_wire_request<R>(
    host: &str,
    request: &R,
    config: &ManagerConfig,
) -> Result<WireRequest, WireError>
where
    R: Requestable + ?Sized,
{
    let mut url = Url::parse(host).map_err(WireError::InvalidHost)?;

    // The descriptor path is appended after any path already present
    // on the host, not substituted for it.
    let path = request.path();
    if !path.is_empty() {
        // Trim the seam so a trailing slash on the host path does not
        // double up with the descriptor path's leading slash.
        let base = if path.starts_with('/') {
            url.path().trim_end_matches('/')
        } else {
            url.path()
        };
        let joined = format!("{base}{path}");
        url.set_path(&joined);
    }

    let query = request.query();
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (name, value) in &query {
            pairs.append_pair(name, value);
        }
    }

    let body = match request.body() {
        Some(body) => Some(
            request
                .encoder()
                .encode(&body)
                .map_err(WireError::Encoding)?,
        ),
        None => None,
    };

    let mut headers = HeaderMap::new();
    if config.inject_default_headers {
        headers.extend(default_headers());
    }
    headers.extend(request.headers());
    headers.extend(config.additional_headers.clone());

    let auth = request
        .authentication()
        .or_else(|| config.request_authentication.clone());
    if let Some(auth) = auth {
        let value = HeaderValue::try_from(auth.header_value())
            .map_err(|_| WireError::InvalidAuthorization)?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(WireRequest {
        url,
        method: request.method().to_http(),
        headers,
        body,
        timeout: request.timeout(),
    })
}

/// Headers injected when the manager's `inject_default_headers` flag
/// is on: `User-Agent`, `Accept-Encoding`, `Accept-Language`.
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    let user_agent = format!(
        "{}/{} (Rust)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    if let Ok(value) = HeaderValue::try_from(user_agent) {
        headers.insert(USER_AGENT, value);
    }

    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));

    let locale = sys_locale::get_locale().unwrap_or_else(|| String::from("en-US"));
    if let Ok(value) = HeaderValue::try_from(locale) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Authentication;
    use crate::method::Method;
    use crate::request::{Request, RequestBuilder};

    fn config() -> ManagerConfig {
        ManagerConfig::default()
    }

    fn text_request(path: &str) -> Request<String> {
        RequestBuilder::text(Method::Get, path).build()
    }

    #[test]
    fn appends_path_to_host_path() {
        let wire =
            build_wire_request("https://api.example.com/v2", &text_request("/users"), &config())
                .unwrap();
        assert_eq!(wire.url.as_str(), "https://api.example.com/v2/users");

        let wire =
            build_wire_request("https://api.example.com", &text_request("/users"), &config())
                .unwrap();
        assert_eq!(wire.url.as_str(), "https://api.example.com/users");
    }

    #[test]
    fn trailing_host_slash_does_not_double_the_separator() {
        let wire = build_wire_request(
            "https://api.example.com/v2/",
            &text_request("/users"),
            &config(),
        )
        .unwrap();
        assert_eq!(wire.url.as_str(), "https://api.example.com/v2/users");
    }

    #[test]
    fn rejects_unparsable_hosts() {
        let result = build_wire_request("not a url", &text_request("/x"), &config());
        assert!(matches!(result, Err(WireError::InvalidHost(_))));
    }

    #[test]
    fn preserves_query_order_and_duplicates() {
        let request: Request<String> = RequestBuilder::text(Method::Get, "/search")
            .query("tag", "a")
            .query("page", "2")
            .query("tag", "b")
            .build();
        let wire = build_wire_request("https://example.com", &request, &config()).unwrap();
        assert_eq!(wire.url.query(), Some("tag=a&page=2&tag=b"));
    }

    #[test]
    fn keeps_host_query_when_descriptor_has_none() {
        let wire =
            build_wire_request("https://example.com/?preset=1", &text_request(""), &config())
                .unwrap();
        assert_eq!(wire.url.query(), Some("preset=1"));
    }

    #[test]
    fn header_precedence_is_defaults_then_request_then_additional() {
        let request: Request<String> = RequestBuilder::text(Method::Get, "/")
            .header("X-A", "2")
            .header("X-B", "2")
            .build();

        let mut config = ManagerConfig::default();
        config
            .additional_headers
            .insert("X-B", HeaderValue::from_static("3"));
        // Manager defaults lose to descriptor headers.
        config.inject_default_headers = true;

        let wire = build_wire_request("https://example.com", &request, &config).unwrap();
        assert_eq!(wire.headers.get("X-A").unwrap(), "2");
        assert_eq!(wire.headers.get("X-B").unwrap(), "3");
        assert!(wire.headers.get(USER_AGENT).is_some());
    }

    #[test]
    fn default_headers_can_be_disabled() {
        let config = ManagerConfig {
            inject_default_headers: false,
            ..ManagerConfig::default()
        };
        let wire = build_wire_request("https://example.com", &text_request("/"), &config).unwrap();
        assert!(wire.headers.get(USER_AGENT).is_none());
        assert!(wire.headers.get(ACCEPT_LANGUAGE).is_none());
    }

    #[test]
    fn request_auth_overrides_manager_backup_auth() {
        let request: Request<String> = RequestBuilder::text(Method::Get, "/")
            .bearer_auth("request-token")
            .build();
        let config = ManagerConfig {
            request_authentication: Some(Authentication::bearer("backup-token")),
            ..ManagerConfig::default()
        };

        let wire = build_wire_request("https://example.com", &request, &config).unwrap();
        assert_eq!(wire.headers.get(AUTHORIZATION).unwrap(), "Bearer request-token");
    }

    #[test]
    fn backup_auth_applies_when_request_has_none() {
        let config = ManagerConfig {
            request_authentication: Some(Authentication::basic("user", "pass")),
            ..ManagerConfig::default()
        };
        let wire = build_wire_request("https://example.com", &text_request("/"), &config).unwrap();
        assert_eq!(wire.headers.get(AUTHORIZATION).unwrap(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn resolved_auth_overrides_explicit_authorization_header() {
        let request: Request<String> = RequestBuilder::text(Method::Get, "/")
            .header("Authorization", "Bearer stale")
            .bearer_auth("fresh")
            .build();
        let wire = build_wire_request("https://example.com", &request, &config()).unwrap();
        assert_eq!(wire.headers.get(AUTHORIZATION).unwrap(), "Bearer fresh");
    }

    #[test]
    fn encoder_failure_surfaces_as_encoding_error() {
        let request: Request<String> = RequestBuilder::text(Method::Post, "/")
            .encoder(|_body: &String| Err(EncodingError::new("nope")))
            .body("payload".to_string())
            .build();
        let result = build_wire_request("https://example.com", &request, &config());
        assert!(matches!(result, Err(WireError::Encoding(_))));
    }

    #[test]
    fn body_is_encoded_once_per_build() {
        let request: Request<String> = RequestBuilder::text(Method::Post, "/")
            .body("REQUEST".to_string())
            .build();
        let wire = build_wire_request("https://example.com", &request, &config()).unwrap();
        assert_eq!(wire.body.as_deref(), Some(b"REQUEST".as_slice()));
        assert_eq!(wire.method, http::Method::POST);
    }
}
