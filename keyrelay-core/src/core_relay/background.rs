//! Background execution tokens
//!
//! Some hosts (mobile OSes in particular) suspend work unless it is wrapped in
//! a "begin/end background task" pair. The dispatcher takes a token before
//! spawning and a [`BackgroundTaskGuard`] gives it back when the task is done,
//! whichever way it finishes.

use std::sync::Arc;
use tracing::trace;

/// Opaque token issued by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackgroundTaskId(pub u64);

/// Host facility for long-running work acknowledgment
pub trait BackgroundTaskHost: Send + Sync {
    fn begin(&self, name: &str) -> BackgroundTaskId;
    fn end(&self, id: BackgroundTaskId);
}

/// Host that needs no acknowledgment
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackgroundHost;

impl BackgroundTaskHost for NoopBackgroundHost {
    fn begin(&self, _name: &str) -> BackgroundTaskId {
        BackgroundTaskId(0)
    }

    fn end(&self, _id: BackgroundTaskId) {}
}

/// Releases its token on drop, including during unwinding
pub struct BackgroundTaskGuard {
    host: Arc<dyn BackgroundTaskHost>,
    id: BackgroundTaskId,
}

impl BackgroundTaskGuard {
    pub fn acquire(host: Arc<dyn BackgroundTaskHost>, name: &str) -> Self {
        let id = host.begin(name);
        trace!(task = name, id = id.0, "background task begin");
        Self { host, id }
    }

    pub fn id(&self) -> BackgroundTaskId {
        self.id
    }
}

impl Drop for BackgroundTaskGuard {
    fn drop(&mut self) {
        trace!(id = self.id.0, "background task end");
        self.host.end(self.id);
    }
}
