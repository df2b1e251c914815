//! The request manager: execution orchestration.
//!
//! [`RequestManager`] turns a request descriptor into a network call:
//! build wire request → transport → assemble → validate, wrapped with
//! retry, SLA-timeout, and fallback-response policy, delivered through
//! a cancellable [`RequestTask`].

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use parking_lot::RwLock;

use crate::auth::Authentication;
use crate::error::{RequestError, TransportError};
use crate::request::Requestable;
use crate::response::{self, Response};
use crate::task::{Outcome, RequestTask};
use crate::transport::{ReqwestTransport, Transport};
use crate::wire;

/// Default bound on a full execution, retries included.
pub const DEFAULT_SLA: Duration = Duration::from_secs(180);

/// Manager-level configuration applied to every execution.
///
/// Executions read a snapshot taken when `execute` is called, so the
/// owning application may mutate this concurrently with in-flight
/// requests without affecting them.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Headers merged into every request at the highest precedence.
    pub additional_headers: HeaderMap,
    /// Whether to inject `User-Agent`/`Accept-Encoding`/`Accept-Language`
    /// defaults at the lowest precedence.
    pub inject_default_headers: bool,
    /// Backup credential used when a request carries none.
    pub request_authentication: Option<Authentication>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            additional_headers: HeaderMap::new(),
            inject_default_headers: true,
            request_authentication: None,
        }
    }
}

/// Per-call execution policy.
#[derive(Clone, Debug)]
pub struct ExecuteOptions<B> {
    /// Additional attempts after the first failure. Retries are
    /// unconditional on failure kind and run sequentially.
    pub retries: u32,
    /// Wall-clock bound on the whole retry sequence.
    pub sla: Duration,
    /// Response substituted if the execution ultimately fails and the
    /// descriptor itself has no fallback. Still validated.
    pub fallback: Option<Response<B>>,
}

impl<B> Default for ExecuteOptions<B> {
    fn default() -> Self {
        Self {
            retries: 0,
            sla: DEFAULT_SLA,
            fallback: None,
        }
    }
}

impl<B> ExecuteOptions<B> {
    /// Set the number of retries.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the SLA deadline.
    pub fn sla(mut self, sla: Duration) -> Self {
        self.sla = sla;
        self
    }

    /// Set the call-level fallback response.
    pub fn fallback(mut self, response: Response<B>) -> Self {
        self.fallback = Some(response);
        self
    }
}

struct ManagerInner {
    host: String,
    transport: Arc<dyn Transport>,
    config: RwLock<ManagerConfig>,
}

/// A host-bound request execution manager.
///
/// The manager is cheaply cloneable and safe to share across
/// concurrent executions: it holds no per-call state, only the host,
/// the injected transport, and configuration snapshotted per call.
#[derive(Clone)]
pub struct RequestManager {
    inner: Arc<ManagerInner>,
}

impl RequestManager {
    /// Create a manager for `host` with the default `reqwest`
    /// transport and default configuration.
    pub fn new(host: impl Into<String>) -> Self {
        Self::builder(host).build()
    }

    /// Create a builder for configuring a manager.
    pub fn builder(host: impl Into<String>) -> RequestManagerBuilder {
        RequestManagerBuilder::new(host)
    }

    /// The host every request path is resolved against.
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// A snapshot of the current configuration.
    pub fn config(&self) -> ManagerConfig {
        self.inner.config.read().clone()
    }

    /// Replace the whole configuration.
    pub fn set_config(&self, config: ManagerConfig) {
        *self.inner.config.write() = config;
    }

    /// Replace the headers merged into every request.
    pub fn set_additional_headers(&self, headers: HeaderMap) {
        self.inner.config.write().additional_headers = headers;
    }

    /// Toggle injection of the default headers.
    pub fn set_inject_default_headers(&self, inject: bool) {
        self.inner.config.write().inject_default_headers = inject;
    }

    /// Replace the backup credential.
    pub fn set_request_authentication(&self, auth: Option<Authentication>) {
        self.inner.config.write().request_authentication = auth;
    }

    /// Execute `request` with default policy (no retries, default
    /// SLA, no call-level fallback).
    pub fn execute<R>(&self, request: R) -> RequestTask<R::Body, R::Error>
    where
        R: Requestable + 'static,
    {
        self.execute_with(request, ExecuteOptions::default())
    }

    /// Execute `request` under an explicit retry/SLA/fallback policy.
    ///
    /// Nothing is dispatched until the returned task is polled; the
    /// SLA clock starts at that point and covers the full retry
    /// sequence.
    pub fn execute_with<R>(
        &self,
        request: R,
        options: ExecuteOptions<R::Body>,
    ) -> RequestTask<R::Body, R::Error>
    where
        R: Requestable + 'static,
    {
        let host = self.inner.host.clone();
        let transport = Arc::clone(&self.inner.transport);
        let config = self.inner.config.read().clone();
        RequestTask::new(run_execution(host, request, transport, config, options))
    }
}

impl std::fmt::Debug for RequestManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestManager")
            .field("host", &self.inner.host)
            .finish()
    }
}

/// Builder for [`RequestManager`].
pub struct RequestManagerBuilder {
    host: String,
    transport: Option<Arc<dyn Transport>>,
    config: ManagerConfig,
}

impl RequestManagerBuilder {
    fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            transport: None,
            config: ManagerConfig::default(),
        }
    }

    /// Inject a custom transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Inject a shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the headers merged into every request.
    pub fn additional_headers(mut self, headers: HeaderMap) -> Self {
        self.config.additional_headers = headers;
        self
    }

    /// Add one header merged into every request. Invalid names or
    /// values are skipped.
    pub fn additional_header(
        mut self,
        name: impl TryInto<HeaderName>,
        value: impl TryInto<HeaderValue>,
    ) -> Self {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.config.additional_headers.insert(name, value);
        } else {
            tracing::warn!(target: "waypoint_http::manager", "Skipping invalid additional header");
        }
        self
    }

    /// Toggle injection of the default headers (on by default).
    pub fn inject_default_headers(mut self, inject: bool) -> Self {
        self.config.inject_default_headers = inject;
        self
    }

    /// Set the backup credential used when a request carries none.
    pub fn request_authentication(mut self, auth: Authentication) -> Self {
        self.config.request_authentication = Some(auth);
        self
    }

    /// Build the manager, falling back to the default `reqwest`
    /// transport when none was injected.
    pub fn build(self) -> RequestManager {
        RequestManager {
            inner: Arc::new(ManagerInner {
                host: self.host,
                transport: self
                    .transport
                    .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
                config: RwLock::new(self.config),
            }),
        }
    }
}

/// One full execution: the retry loop bounded by the SLA, then
/// fallback substitution.
async fn run_execution<R>(
    host: String,
    request: R,
    transport: Arc<dyn Transport>,
    config: ManagerConfig,
    options: ExecuteOptions<R::Body>,
) -> Outcome<R::Body, R::Error>
where
    R: Requestable,
{
    let ExecuteOptions {
        retries,
        sla,
        fallback,
    } = options;

    let attempts = tokio::time::timeout(sla, async {
        let mut attempt: u32 = 0;
        loop {
            match run_attempt(&host, &request, transport.as_ref(), &config).await {
                Ok(response) => break Ok(response),
                Err(error) => {
                    if attempt >= retries {
                        break Err(error);
                    }
                    attempt += 1;
                    tracing::debug!(
                        target: "waypoint_http::manager",
                        attempt,
                        error = %error,
                        "Attempt failed, retrying"
                    );
                }
            }
        }
    })
    .await;

    let result = match attempts {
        Ok(result) => result,
        Err(_elapsed) => {
            tracing::warn!(
                target: "waypoint_http::manager",
                sla_ms = sla.as_millis() as u64,
                "Execution exceeded its SLA deadline"
            );
            Err(RequestError::SlaExceeded)
        }
    };

    match result {
        Ok(response) => Ok(response),
        Err(error) => {
            // The descriptor's fallback wins over the call-level one.
            match request.fallback_response().or(fallback) {
                Some(substitute) => request
                    .validator()
                    .validate(substitute)
                    .map_err(RequestError::Validation),
                None => Err(error),
            }
        }
    }
}

/// One attempt of the pipeline: build → transport → assemble →
/// validate.
async fn run_attempt<R>(
    host: &str,
    request: &R,
    transport: &dyn Transport,
    config: &ManagerConfig,
) -> Outcome<R::Body, R::Error>
where
    R: Requestable + ?Sized,
{
    let wire = match wire::build_wire_request(host, request, config) {
        Ok(wire) => wire,
        Err(error) => {
            tracing::debug!(
                target: "waypoint_http::manager",
                error = %error,
                "Failed to build wire request"
            );
            return Err(RequestError::MalformedRequest);
        }
    };

    let reply = transport.submit(wire).await.map_err(|error| match error {
        TransportError::Timeout => RequestError::TimedOut,
        other => RequestError::Transport(other),
    })?;

    let response =
        response::assemble(request.decoder().as_ref(), reply).map_err(RequestError::Decoding)?;

    request
        .validator()
        .validate(response)
        .map_err(RequestError::Validation)
}
