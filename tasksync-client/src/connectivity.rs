//! Connectivity tracking
//!
//! [`ConnectivityMonitor`] holds the last reported online/offline state and
//! fans transitions out to subscribers. Handlers run synchronously on the
//! thread that reports the transition, so they should only hand work off
//! (for example with `try_send`) rather than block.
//!
//! Something has to report state to the monitor: on a device that is the
//! platform's network service, here it is usually [`spawn_probe`], which polls
//! the backend's health endpoint.

use crate::remote::HttpTaskService;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, Weak,
};
use std::time::Duration;
use tokio::task::JoinHandle;

type Handler = Arc<dyn Fn(bool) + Send + Sync>;

struct MonitorInner {
    online: AtomicBool,
    // Held across swap and dispatch so reports are delivered in order
    reporting: Mutex<()>,
    handlers: Mutex<Vec<(u64, Handler)>>,
    next_id: AtomicU64,
}

#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<MonitorInner>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                online: AtomicBool::new(initially_online),
                reporting: Mutex::new(()),
                handlers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    /// Report the current state. Handlers fire only when it differs from the
    /// previous report.
    ///
    /// Concurrent reports are serialized, so handlers see transitions in the
    /// order the state actually changed. A handler must not call `set_online`.
    pub fn set_online(&self, online: bool) {
        let _reporting = match self.inner.reporting.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let previous = self.inner.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return;
        }

        if online {
            tracing::info!("Connection established");
        } else {
            tracing::info!("Connection lost");
        }

        // Snapshot so handlers can (un)subscribe without deadlocking
        let handlers: Vec<Handler> = match self.inner.handlers.lock() {
            Ok(handlers) => handlers.iter().map(|(_, h)| h.clone()).collect(),
            Err(_) => {
                tracing::error!("Failed to acquire connectivity handler lock");
                return;
            }
        };

        for handler in handlers {
            handler(online);
        }
    }

    /// Register `handler`. It is called once right away with the current
    /// state, then on every transition until the returned [`Subscription`]
    /// is dropped or unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let handler: Handler = Arc::new(handler);

        match self.inner.handlers.lock() {
            Ok(mut handlers) => handlers.push((id, handler.clone())),
            Err(_) => tracing::error!("Failed to acquire connectivity handler lock"),
        }

        handler(self.is_online());

        Subscription {
            id,
            monitor: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .handlers
            .lock()
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Handle returned by [`ConnectivityMonitor::subscribe`]. Dropping it detaches
/// the handler.
pub struct Subscription {
    id: u64,
    monitor: Weak<MonitorInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.monitor.upgrade() else {
            return;
        };
        match inner.handlers.lock() {
            Ok(mut handlers) => handlers.retain(|(id, _)| *id != self.id),
            Err(_) => tracing::error!("Failed to acquire connectivity handler lock"),
        };
    }
}

/// Poll the backend's health endpoint every `interval` and report the result
/// to `monitor`. The first probe happens immediately.
pub fn spawn_probe(
    monitor: ConnectivityMonitor,
    service: Arc<HttpTaskService>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let online = service.ping().await;
            tracing::trace!("Connectivity probe against {}: {}", service.base_url(), online);
            monitor.set_online(online);
        }
    })
}
