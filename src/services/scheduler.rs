//! Reference-counted background refresh.
//!
//! All consumers share one scheduler and one timer task. The timer starts
//! on the 0 -> 1 consumer transition and stops on 1 -> 0, so N mounted
//! consumers never means N poll loops. Session lifecycle events from the
//! host force-stop the timer and clear the inbox at logout.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::services::inbox::InboxService;
use crate::types::{FetchOptions, SessionEvent};

pub struct RefreshScheduler {
    inbox: Arc<InboxService>,
    interval: Duration,
    consumers: AtomicUsize,
    /// False between logout and the next login; blocks timer spawns.
    session_active: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(inbox: Arc<InboxService>, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            inbox,
            interval,
            consumers: AtomicUsize::new(0),
            session_active: AtomicBool::new(true),
            task: Mutex::new(None),
        })
    }

    /// Attach a consumer. The timer spawns only on the first attach.
    pub fn start_auto_refresh(&self) {
        let prev = self.consumers.fetch_add(1, Ordering::SeqCst);
        if prev == 0 && self.session_active.load(Ordering::SeqCst) {
            self.spawn_timer();
        }
    }

    /// Detach a consumer. The timer stops only when the last one leaves;
    /// extra calls with no consumers attached are a no-op.
    pub fn stop_auto_refresh(&self) {
        let mut current = self.consumers.load(Ordering::SeqCst);
        loop {
            if current == 0 {
                return;
            }
            match self.consumers.compare_exchange(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
        if current == 1 {
            self.stop_timer();
        }
    }

    /// React to the host application's session lifecycle.
    ///
    /// Logout stops the timer regardless of consumer count and clears the
    /// inbox; login restarts it when consumers are still attached.
    pub fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::LoggedIn => {
                info!("session started, resuming notification refresh");
                self.session_active.store(true, Ordering::SeqCst);
                if self.consumers.load(Ordering::SeqCst) > 0 {
                    self.spawn_timer();
                }
            }
            SessionEvent::LoggedOut => {
                info!("session ended, stopping notification refresh");
                self.session_active.store(false, Ordering::SeqCst);
                self.stop_timer();
                self.inbox.clear();
            }
        }
    }

    /// Whether the timer task is currently live.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.load(Ordering::SeqCst)
    }

    /// Spawn the interval task. Idempotent: a live task is left alone.
    fn spawn_timer(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            return;
        }

        let inbox = self.inbox.clone();
        let every = self.interval;
        debug!(interval_ms = every.as_millis() as u64, "starting refresh timer");

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval fires immediately; skip that tick so the cadence is
            // a pure background refresh after whatever fetch mounted us.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                // Non-forced: a tick inside the TTL window is a cache hit.
                inbox.fetch(1, FetchOptions::default()).await;
            }
        }));
    }

    /// Abort the task and always clear the stored handle, so a later start
    /// cannot no-op against a stale one.
    fn stop_timer(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
            debug!("refresh timer stopped");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self
            .task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}
