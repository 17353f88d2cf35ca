//! Session task scope.
//!
//! Every task a session starts (queue installation, pagination, library
//! writes, the event dispatcher) is spawned through one [`SessionScope`] so
//! that releasing the session cancels them together and waits for them to
//! finish.

use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::error::{PlaybackError, Result};

#[derive(Clone, Debug)]
pub struct SessionScope {
    handle: Handle,
    token: CancellationToken,
    tracker: TaskTracker,
}

impl SessionScope {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Scope on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Internal`] outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| PlaybackError::Internal(format!("no tokio runtime: {}", e)))
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn_on(future, &self.handle)
    }

    /// Token cancelled with the scope, used for one queue installation.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn task_count(&self) -> usize {
        self.tracker.len()
    }

    /// Cancels every task and waits for all of them to exit.
    ///
    /// Must not be awaited from inside a task of this scope.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.token.cancel();
        self.tracker.wait().await;
        debug!("Session scope shut down");
    }
}
