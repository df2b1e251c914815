//! Cancellable single-value request operations.
//!
//! A [`RequestTask`] is the handle returned by
//! [`RequestManager::execute`](crate::RequestManager::execute): a
//! future resolving to exactly one terminal outcome, or to `None` if
//! the task was cancelled first. The worker is spawned on first poll,
//! so no clock starts and no bytes move until delivery is requested.
//!
//! The terminal transition is guarded by a single mutex: of
//! {deliver success, deliver failure, deliver nothing due to cancel},
//! exactly one ever happens, even when cancellation races completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::RequestError;
use crate::response::Response;

/// The terminal outcome of one execution.
pub type Outcome<B, E> = Result<Response<B>, RequestError<E>>;

/// Unique identifier for an execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lifecycle of one execution. `Delivered` and `Cancelled` are
/// terminal; no transition ever leaves them.
enum TaskState {
    /// Not yet polled; the worker exists but is not running.
    Idle,
    /// The worker is running on the runtime.
    Running(tokio::task::JoinHandle<()>),
    /// The outcome was handed to the delivery channel.
    Delivered,
    /// Cancelled before delivery; nothing will be delivered.
    Cancelled,
}

struct TaskShared {
    state: Mutex<TaskState>,
}

impl TaskShared {
    /// Move to `Cancelled` unless already terminal. Returns whether
    /// cancellation was observed before delivery.
    fn cancel(&self, id: RequestId) -> bool {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, TaskState::Cancelled) {
            TaskState::Running(handle) => {
                // Aborting the worker drops any in-flight transport
                // future, cancelling the underlying exchange.
                handle.abort();
                tracing::debug!(target: "waypoint_http::task", ?id, "Cancelled in-flight request");
                true
            }
            TaskState::Idle => {
                tracing::debug!(target: "waypoint_http::task", ?id, "Cancelled request before dispatch");
                true
            }
            TaskState::Delivered => {
                // Completion won the race; the outcome stands.
                *state = TaskState::Delivered;
                false
            }
            TaskState::Cancelled => false,
        }
    }

    fn is_pending(&self) -> bool {
        matches!(
            *self.state.lock(),
            TaskState::Idle | TaskState::Running(_)
        )
    }
}

/// A cloneable handle for cancelling a [`RequestTask`] from elsewhere.
#[derive(Clone)]
pub struct TaskHandle {
    id: RequestId,
    shared: Arc<TaskShared>,
}

impl TaskHandle {
    /// The ID of the execution this handle controls.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Cancel the execution.
    ///
    /// Returns `true` if cancellation was observed before delivery;
    /// `false` if the outcome had already been delivered or the task
    /// was already cancelled.
    pub fn cancel(&self) -> bool {
        self.shared.cancel(self.id)
    }

    /// Whether the execution has reached no terminal state yet.
    pub fn is_pending(&self) -> bool {
        self.shared.is_pending()
    }
}

/// A cancellable, single-value asynchronous request operation.
///
/// Awaiting the task yields `Some(outcome)` exactly once, or `None`
/// if the task was cancelled before the outcome was delivered.
/// Dropping an unfinished task cancels it.
pub struct RequestTask<B, E> {
    id: RequestId,
    shared: Arc<TaskShared>,
    rx: oneshot::Receiver<Outcome<B, E>>,
    worker: Option<BoxFuture<'static, ()>>,
}

impl<B: Send + 'static, E: Send + 'static> RequestTask<B, E> {
    /// Wrap an execution future. The future is not spawned until the
    /// task is first polled.
    pub(crate) fn new(execution: impl Future<Output = Outcome<B, E>> + Send + 'static) -> Self {
        let (tx, rx) = oneshot::channel();
        let shared = Arc::new(TaskShared {
            state: Mutex::new(TaskState::Idle),
        });

        let worker = {
            let shared = Arc::clone(&shared);
            async move {
                let outcome = execution.await;
                let mut state = shared.state.lock();
                if !matches!(*state, TaskState::Cancelled) {
                    *state = TaskState::Delivered;
                    let _ = tx.send(outcome);
                }
            }
            .boxed()
        };

        Self {
            id: RequestId::next(),
            shared,
            rx,
            worker: Some(worker),
        }
    }

    /// The unique ID of this execution.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// A cloneable handle for cancelling this task from elsewhere.
    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            id: self.id,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cancel this task. See [`TaskHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.shared.cancel(self.id)
    }
}

impl<B: Send + 'static, E: Send + 'static> Future for RequestTask<B, E> {
    type Output = Option<Outcome<B, E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        // First poll starts the worker, unless cancellation got there
        // first.
        if let Some(worker) = this.worker.take() {
            let mut state = this.shared.state.lock();
            match &*state {
                TaskState::Cancelled => return Poll::Ready(None),
                TaskState::Idle => {
                    *state = TaskState::Running(tokio::spawn(worker));
                }
                _ => {}
            }
        }

        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(Some(outcome)),
            // Sender dropped without sending: cancelled.
            Poll::Ready(Err(_)) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<B, E> Drop for RequestTask<B, E> {
    fn drop(&mut self) {
        self.shared.cancel(self.id);
    }
}
