//! Request authentication credentials.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Credentials that resolve to a single `Authorization` header value.
///
/// A credential can be attached per request or configured on the
/// [`RequestManager`](crate::RequestManager) as a backup used when a
/// request carries none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authentication {
    /// HTTP Basic authentication.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// Token authentication with an explicit scheme tag.
    Token {
        /// Scheme tag placed before the token (e.g. "Bearer").
        scheme: String,
        /// Token value.
        token: String,
    },
}

impl Authentication {
    /// Basic authentication from a username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Bearer token authentication.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::token("Bearer", token)
    }

    /// Token authentication with a custom scheme.
    pub fn token(scheme: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Token {
            scheme: scheme.into(),
            token: token.into(),
        }
    }

    /// Compute the `Authorization` header value for this credential.
    pub fn header_value(&self) -> String {
        match self {
            Self::Basic { username, password } => {
                let encoded = BASE64.encode(format!("{username}:{password}"));
                format!("Basic {encoded}")
            }
            Self::Token { scheme, token } => format!("{scheme} {token}"),
        }
    }
}
