//! Declarative HTTP request execution for Waypoint.
//!
//! This crate separates *describing* an HTTP exchange from *running*
//! it. A request descriptor is an immutable value carrying the path,
//! method, headers, body, credentials, codec, validator, and timeout;
//! a [`RequestManager`] turns a descriptor into a network call with
//! retry, SLA-timeout, and fallback-response policy, delivered as a
//! cancellable single-value operation.
//!
//! # Executing a request
//!
//! ```ignore
//! use waypoint_http::{Method, RequestBuilder, RequestManager};
//!
//! let manager = RequestManager::new("https://api.example.com");
//!
//! let request = RequestBuilder::json(Method::Get, "/users")
//!     .query("page", "1")
//!     .bearer_auth("token")
//!     .validate_status()
//!     .build();
//!
//! let task = manager.execute(request);
//! match task.await {
//!     Some(Ok(response)) => println!("users: {:?}", response.body),
//!     Some(Err(error)) => eprintln!("failed: {error}"),
//!     None => eprintln!("cancelled"),
//! }
//! ```
//!
//! # Retry, SLA, and fallback
//!
//! ```ignore
//! use std::time::Duration;
//! use waypoint_http::{ExecuteOptions, Response};
//!
//! let task = manager.execute_with(
//!     request,
//!     ExecuteOptions::default()
//!         .retries(2)
//!         .sla(Duration::from_secs(5))
//!         .fallback(Response::with_status(200, cached_value)),
//! );
//! ```
//!
//! The whole pipeline (build → transport → assemble → validate) is
//! retried as a unit; the SLA bounds the full retry sequence; a
//! fallback response, whether from the descriptor or the call, is
//! still run through the validator before delivery.
//!
//! # Cancellation
//!
//! ```ignore
//! let task = manager.execute(request);
//! let handle = task.handle();
//!
//! // From anywhere else:
//! handle.cancel();
//! ```
//!
//! Exactly one of {success, failure, nothing-due-to-cancel} is ever
//! delivered, even when cancellation races completion.

mod auth;
mod codec;
mod error;
mod manager;
mod method;
mod request;
mod response;
mod task;
mod transport;
mod validate;
mod wire;

pub use auth::Authentication;
pub use codec::{BytesCodec, Decoder, Encoder, FormCodec, JsonCodec, TextCodec};
pub use error::{DecodingError, EncodingError, RequestError, TransportError};
pub use manager::{
    DEFAULT_SLA, ExecuteOptions, ManagerConfig, RequestManager, RequestManagerBuilder,
};
pub use method::Method;
pub use request::{AnyRequest, DEFAULT_REQUEST_TIMEOUT, Request, RequestBuilder, Requestable};
pub use response::Response;
pub use task::{Outcome, RequestId, RequestTask, TaskHandle};
pub use transport::{HttpMetadata, ReqwestTransport, Transport, TransportReply};
pub use validate::{HttpResponseError, PassthroughValidator, StatusCodeValidator, Validator};
pub use wire::WireRequest;
