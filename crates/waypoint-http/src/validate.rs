//! Response validation.

use crate::response::Response;

/// Classifies an assembled [`Response`] as accepted or as a typed
/// domain error.
///
/// A validator may transform the response it passes through. Failures
/// surface as [`RequestError::Validation`](crate::RequestError::Validation).
pub trait Validator<B, E>: Send + Sync {
    /// Validate `response`, passing it through (possibly transformed)
    /// or rejecting it.
    fn validate(&self, response: Response<B>) -> Result<Response<B>, E>;
}

impl<B, E, F> Validator<B, E> for F
where
    F: Fn(Response<B>) -> Result<Response<B>, E> + Send + Sync,
{
    fn validate(&self, response: Response<B>) -> Result<Response<B>, E> {
        self(response)
    }
}

/// Validator that accepts every response unchanged.
///
/// The default for requests that do not declare a validation error
/// type of their own.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughValidator;

impl<B, E> Validator<B, E> for PassthroughValidator {
    fn validate(&self, response: Response<B>) -> Result<Response<B>, E> {
        Ok(response)
    }
}

/// Validator that rejects responses with a status code outside
/// `[200, 300)`.
///
/// A response with no status code at all (e.g. from an opaque
/// transport reply) passes unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusCodeValidator;

impl<B> Validator<B, HttpResponseError> for StatusCodeValidator {
    fn validate(&self, response: Response<B>) -> Result<Response<B>, HttpResponseError> {
        match response.status_code {
            None => Ok(response),
            Some(code) if (200..300).contains(&code) => Ok(response),
            Some(code) => Err(HttpResponseError::from_status(code)),
        }
    }
}

/// Structured HTTP error classified from a response status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HttpResponseError {
    /// HTTP 400.
    #[error("HTTP 400 Bad Request")]
    BadRequest,
    /// HTTP 401.
    #[error("HTTP 401 Unauthorized")]
    Unauthorized,
    /// HTTP 403.
    #[error("HTTP 403 Forbidden")]
    Forbidden,
    /// HTTP 404.
    #[error("HTTP 404 Not Found")]
    NotFound,
    /// Any other 4xx status.
    #[error("HTTP {0} client error")]
    Client(u16),
    /// HTTP 500.
    #[error("HTTP 500 Internal Server Error")]
    ServerError,
    /// Any other 5xx status.
    #[error("HTTP {0} server error")]
    Server(u16),
    /// A non-2xx status outside the 4xx/5xx ranges.
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
}

impl HttpResponseError {
    /// Classify a non-2xx status code.
    pub fn from_status(code: u16) -> Self {
        match code {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            402 | 405..=499 => Self::Client(code),
            500 => Self::ServerError,
            501..=599 => Self::Server(code),
            other => Self::UnexpectedStatus(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_status(code: Option<u16>) -> Response<String> {
        Response {
            status_code: code,
            ..Response::empty()
        }
    }

    #[test]
    fn passthrough_accepts_everything() {
        let response = response_with_status(Some(500));
        let validated: Result<_, HttpResponseError> =
            PassthroughValidator.validate(response.clone());
        assert_eq!(validated.unwrap(), response);
    }

    #[test]
    fn status_validator_accepts_2xx_and_missing_status() {
        assert!(StatusCodeValidator.validate(response_with_status(Some(200))).is_ok());
        assert!(StatusCodeValidator.validate(response_with_status(Some(299))).is_ok());
        assert!(StatusCodeValidator.validate(response_with_status(None)).is_ok());
    }

    #[test]
    fn status_validator_classifies_failures() {
        let classify = |code| {
            StatusCodeValidator
                .validate(response_with_status(Some(code)))
                .unwrap_err()
        };
        assert_eq!(classify(400), HttpResponseError::BadRequest);
        assert_eq!(classify(401), HttpResponseError::Unauthorized);
        assert_eq!(classify(403), HttpResponseError::Forbidden);
        assert_eq!(classify(404), HttpResponseError::NotFound);
        assert_eq!(classify(402), HttpResponseError::Client(402));
        assert_eq!(classify(418), HttpResponseError::Client(418));
        assert_eq!(classify(500), HttpResponseError::ServerError);
        assert_eq!(classify(503), HttpResponseError::Server(503));
        assert_eq!(classify(302), HttpResponseError::UnexpectedStatus(302));
        assert_eq!(classify(199), HttpResponseError::UnexpectedStatus(199));
    }
}
