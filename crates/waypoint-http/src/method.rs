//! HTTP request methods.

/// The HTTP verb a request is dispatched with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET method.
    #[default]
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
    /// HTTP CONNECT method.
    Connect,
    /// HTTP HEAD method.
    Head,
    /// HTTP OPTIONS method.
    Options,
    /// HTTP PATCH method.
    Patch,
    /// HTTP TRACE method.
    Trace,
}

impl Method {
    /// Convert to the `http` crate's method type.
    pub(crate) fn to_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Delete => http::Method::DELETE,
            Self::Connect => http::Method::CONNECT,
            Self::Head => http::Method::HEAD,
            Self::Options => http::Method::OPTIONS,
            Self::Patch => http::Method::PATCH,
            Self::Trace => http::Method::TRACE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Connect => write!(f, "CONNECT"),
            Self::Head => write!(f, "HEAD"),
            Self::Options => write!(f, "OPTIONS"),
            Self::Patch => write!(f, "PATCH"),
            Self::Trace => write!(f, "TRACE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_http_method() {
        assert_eq!(Method::Get.to_http(), http::Method::GET);
        assert_eq!(Method::Patch.to_http(), http::Method::PATCH);
        assert_eq!(Method::Trace.to_http(), http::Method::TRACE);
    }

    #[test]
    fn displays_as_upper_case_verb() {
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Connect.to_string(), "CONNECT");
    }

    #[test]
    fn defaults_to_get() {
        assert_eq!(Method::default(), Method::Get);
    }
}
