//! Announcement feed controller.
//!
//! Keeps a cached [`FeedSnapshot`] in sync with the remote feed and sends
//! batched "mark seen" acknowledgments once the announcements panel is shown.
//!
//! Scheduling rules:
//! - The next refresh is armed only after the previous fetch settles, so at
//!   most one fetch is ever in flight. Failures keep polling at the same
//!   interval and leave the cached list in place.
//! - `refresh_now` replaces the armed refresh timer with an immediate fetch;
//!   while a fetch is in flight it is absorbed by that fetch.
//! - Acknowledgment is debounced: each `on_panel_opened` re-arms a single
//!   delay timer. The batch is derived from the snapshot when the timer fires,
//!   minus ids already covered by an acknowledgment in flight. Failed
//!   acknowledgments are not retried; the next refresh reconciles.
//! - `stop` cancels both timers and any in-flight request. Every task checks
//!   the lifecycle epoch under the state lock before publishing, so nothing
//!   is published once `stop` has returned.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use navshell_core::{AnnouncementId, FeedSnapshot};
use navshell_feed::FeedClient;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

use crate::config::FeedConfig;
use crate::timer::{TimerSlot, sleep_or_cancel};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("announcement feed controller is not running")]
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, never started.
    Idle,
    Running,
    Stopped,
}

struct ControllerState {
    lifecycle: Lifecycle,
    /// Bumped on every start; settles from an older run are dropped.
    epoch: u64,
    /// Cancelled by `stop`; aborts requests in flight.
    shutdown: CancellationToken,
    refresh: TimerSlot,
    ack: TimerSlot,
    fetch_in_flight: bool,
    ack_in_flight: HashSet<AnnouncementId>,
}

impl ControllerState {
    fn is_live(&self, epoch: u64) -> bool {
        self.lifecycle == Lifecycle::Running && self.epoch == epoch
    }
}

struct Shared<C> {
    client: C,
    config: FeedConfig,
    snapshot: watch::Sender<FeedSnapshot>,
    state: Mutex<ControllerState>,
}

/// Cheap to clone; all clones drive the same controller.
pub struct AnnouncementFeed<C> {
    shared: Arc<Shared<C>>,
}

impl<C> Clone for AnnouncementFeed<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: FeedClient + 'static> AnnouncementFeed<C> {
    pub fn new(client: C, config: FeedConfig) -> Self {
        let (snapshot, _) = watch::channel(FeedSnapshot::initial());
        Self {
            shared: Arc::new(Shared {
                client,
                config,
                snapshot,
                state: Mutex::new(ControllerState {
                    lifecycle: Lifecycle::Idle,
                    epoch: 0,
                    shutdown: CancellationToken::new(),
                    refresh: TimerSlot::new(),
                    ack: TimerSlot::new(),
                    fetch_in_flight: false,
                    ack_in_flight: HashSet::new(),
                }),
            }),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.shared.config
    }

    /// Starts polling with an immediate first fetch. No-op while running.
    /// After `stop`, restarts from an empty loading snapshot.
    pub async fn start(&self) {
        let mut st = self.shared.state.lock().await;
        match st.lifecycle {
            Lifecycle::Running => {
                tracing::debug!("announcement feed already running");
                return;
            }
            Lifecycle::Stopped => {
                self.shared.snapshot.send_replace(FeedSnapshot::initial());
            }
            Lifecycle::Idle => {}
        }
        st.lifecycle = Lifecycle::Running;
        st.epoch += 1;
        st.shutdown = CancellationToken::new();
        st.fetch_in_flight = false;
        st.ack_in_flight.clear();
        tracing::info!(
            refresh_interval_ms = self.shared.config.refresh_interval_ms,
            ack_delay_ms = self.shared.config.ack_delay_ms,
            "announcement feed started"
        );
        schedule_refresh(&self.shared, &mut st, Duration::ZERO);
    }

    /// Fetches now and restarts the periodic schedule from this fetch.
    pub async fn refresh_now(&self) -> Result<(), ControllerError> {
        let mut st = self.shared.state.lock().await;
        if st.lifecycle != Lifecycle::Running {
            return Err(ControllerError::NotRunning);
        }
        if st.fetch_in_flight {
            tracing::debug!("refresh requested while a fetch is in flight; coalesced");
            return Ok(());
        }
        schedule_refresh(&self.shared, &mut st, Duration::ZERO);
        Ok(())
    }

    /// Cancels both timers and abandons requests in flight. Idempotent.
    pub async fn stop(&self) {
        let mut st = self.shared.state.lock().await;
        if st.lifecycle != Lifecycle::Running {
            return;
        }
        st.lifecycle = Lifecycle::Stopped;
        st.refresh.disarm();
        st.ack.disarm();
        st.shutdown.cancel();
        st.fetch_in_flight = false;
        st.ack_in_flight.clear();
        tracing::info!("announcement feed stopped");
    }

    /// The announcements panel became visible: (re)arms the acknowledgment delay.
    pub async fn on_panel_opened(&self) -> Result<(), ControllerError> {
        let mut st = self.shared.state.lock().await;
        if st.lifecycle != Lifecycle::Running {
            return Err(ControllerError::NotRunning);
        }
        let ticket = st.ack.arm();
        let epoch = st.epoch;
        let delay = self.shared.config.ack_delay();
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            if sleep_or_cancel(delay, &ticket.token).await {
                run_ack(shared, epoch, ticket.generation).await;
            }
        });
        Ok(())
    }

    /// The announcements panel was hidden before the delay elapsed: nothing
    /// was on screen long enough to count as seen.
    pub async fn on_panel_closed(&self) {
        let mut st = self.shared.state.lock().await;
        if st.ack.disarm() {
            tracing::debug!("pending acknowledgment cancelled");
        }
    }

    pub fn current_snapshot(&self) -> FeedSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn unseen_count(&self) -> usize {
        self.shared.snapshot.borrow().unseen_count()
    }

    /// Receiver that is notified on every snapshot replacement.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.shared.snapshot.subscribe()
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.shared.state.lock().await.lifecycle
    }
}

fn schedule_refresh<C: FeedClient + 'static>(
    shared: &Arc<Shared<C>>,
    st: &mut ControllerState,
    delay: Duration,
) {
    let ticket = st.refresh.arm();
    let epoch = st.epoch;
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        if sleep_or_cancel(delay, &ticket.token).await {
            run_refresh(shared, epoch, ticket.generation).await;
        }
    });
}

async fn run_refresh<C: FeedClient + 'static>(shared: Arc<Shared<C>>, epoch: u64, generation: u64) {
    let shutdown = {
        let mut st = shared.state.lock().await;
        if !st.is_live(epoch) || !st.refresh.fire(generation) {
            return;
        }
        if st.fetch_in_flight {
            tracing::debug!("refresh timer fired during a fetch; skipped");
            return;
        }
        st.fetch_in_flight = true;
        st.shutdown.clone()
    };

    let result = tokio::select! {
        biased;
        () = shutdown.cancelled() => return,
        result = shared.client.fetch_announcements() => result,
    };

    let mut st = shared.state.lock().await;
    if !st.is_live(epoch) {
        return;
    }
    st.fetch_in_flight = false;
    let next = match result {
        Ok(items) => {
            let next = FeedSnapshot::loaded(items, Utc::now());
            tracing::debug!(
                count = next.len(),
                unseen = next.unseen_count(),
                "announcement feed refreshed"
            );
            next
        }
        Err(e) => {
            tracing::warn!(error = %e, "announcement feed refresh failed; keeping cached list");
            shared.snapshot.borrow().failed()
        }
    };
    shared.snapshot.send_replace(next);
    schedule_refresh(&shared, &mut st, shared.config.refresh_interval());
}

async fn run_ack<C: FeedClient + 'static>(shared: Arc<Shared<C>>, epoch: u64, generation: u64) {
    let (batch, shutdown) = {
        let mut st = shared.state.lock().await;
        if !st.is_live(epoch) || !st.ack.fire(generation) {
            return;
        }
        let batch = shared.snapshot.borrow().ack_batch(&st.ack_in_flight);
        let Some(batch) = batch else {
            tracing::debug!("nothing unseen to acknowledge");
            return;
        };
        st.ack_in_flight.extend(batch.ids().iter().cloned());
        (batch, st.shutdown.clone())
    };

    let result = tokio::select! {
        biased;
        () = shutdown.cancelled() => return,
        result = shared.client.acknowledge(batch.ids()) => result,
    };

    let mut st = shared.state.lock().await;
    if !st.is_live(epoch) {
        return;
    }
    for id in batch.ids() {
        st.ack_in_flight.remove(id);
    }
    match result {
        Ok(()) => {
            let next = shared.snapshot.borrow().with_seen(batch.ids());
            shared.snapshot.send_replace(next);
            tracing::info!(count = batch.len(), "announcements marked seen");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                count = batch.len(),
                "acknowledgment failed; next refresh will reconcile"
            );
        }
    }
}
