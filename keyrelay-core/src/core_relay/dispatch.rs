/*
    Dispatcher

    Entry point the vault engine holds a handle to. The vault calls submit()
    from its own callback thread; submit() must return immediately.

    Workflow:
    1. submit() logs the ingress record and takes a background-task token
    2. one tokio task is spawned per event on the configured runtime
    3. the task validates and plans the event without waiting on anything
    4. only the transport send waits for a worker permit (bounded pool)
    5. the token and the in-flight gauge are released when the task ends,
       whichever way it ends (including being dropped at runtime shutdown)

    Tasks run independently and may finish in any order. There is no
    cancellation and no durable queue: events in flight at process exit are
    lost, the vault's ack-driven protocol re-requests what it still needs.
*/

use super::background::{BackgroundTaskGuard, BackgroundTaskHost, NoopBackgroundHost};
use super::errors::{RelayError, RelayResult};
use super::metrics;
use super::router::{RelayOutcome, RelayRouter};
use super::status::RawStatusEvent;
use crate::config::DispatchConfig;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const TASK_NAME: &str = "keyrelay-dispatch";

/// Handle for submitting vault status events.
///
/// Cheap to clone; every clone feeds the same router and worker pool.
#[derive(Clone)]
pub struct Dispatcher {
    runtime: Handle,
    router: Arc<RelayRouter>,
    workers: Arc<Semaphore>,
    host: Arc<dyn BackgroundTaskHost>,
}

impl Dispatcher {
    /// Create a dispatcher spawning onto `runtime`.
    ///
    /// The handle may belong to a runtime the caller is not running on, so
    /// `submit` works from plain OS threads.
    pub fn new(runtime: Handle, router: Arc<RelayRouter>, config: &DispatchConfig) -> Self {
        Self {
            runtime,
            router,
            workers: Arc::new(Semaphore::new(config.max_concurrent_tasks)),
            host: Arc::new(NoopBackgroundHost),
        }
    }

    /// Use a host facility for background execution tokens
    pub fn with_background_host(mut self, host: Arc<dyn BackgroundTaskHost>) -> Self {
        self.host = host;
        self
    }

    pub fn router(&self) -> &Arc<RelayRouter> {
        &self.router
    }

    /// Refresh the account context after the host switched accounts
    pub async fn reload(&self) {
        self.router.reload().await;
    }

    /// Hand one event to its own task and return without waiting.
    ///
    /// The returned handle resolves to the event's outcome; dropping it does
    /// not cancel the task.
    pub fn submit(&self, raw: RawStatusEvent) -> JoinHandle<RelayOutcome> {
        info!(
            status_code = ?raw.status_code,
            chat_id = ?raw.chat_id,
            forward_chat_id = ?raw.forward_to_chat_id,
            pdu_len = raw.pdu.as_ref().map(Vec::len),
            "Vault status event received"
        );

        let guard = BackgroundTaskGuard::acquire(self.host.clone(), TASK_NAME);
        let inflight = metrics::InflightTask::start();
        let router = self.router.clone();
        let workers = self.workers.clone();

        self.runtime.spawn(async move {
            let _guards = (guard, inflight);
            let outcome = process(&router, &workers, raw).await;
            metrics::event_processed(outcome.label());
            outcome
        })
    }

    /// Parse a JSON ingress record and submit it.
    ///
    /// A record that does not parse is rejected as `MalformedEvent` without
    /// spawning anything.
    pub fn submit_json(&self, json: &str) -> RelayResult<JoinHandle<RelayOutcome>> {
        match RawStatusEvent::from_json(json) {
            Ok(raw) => Ok(self.submit(raw)),
            Err(err) => {
                warn!("Dropping vault status event: {}", err);
                metrics::event_processed(err.label());
                Err(err)
            }
        }
    }
}

async fn process(router: &RelayRouter, workers: &Semaphore, raw: RawStatusEvent) -> RelayOutcome {
    let event = match raw.validate() {
        Ok(event) => event,
        Err(RelayError::UnknownStatusKind(code)) => {
            debug!(status_code = code, "Ignoring unknown vault status");
            return RelayOutcome::Ignored(code);
        }
        Err(err) => {
            warn!("Dropping vault status event: {}", err);
            return RelayOutcome::Dropped(err);
        }
    };

    let outcome = router.relay_within(event, Some(workers)).await;
    if let RelayOutcome::Dropped(RelayError::MalformedEvent(reason)) = &outcome {
        warn!("Dropping vault status event: {}", reason);
    }
    outcome
}
