//! Scripted in-memory feed used by the controller and shell tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use navshell_core::{Announcement, AnnouncementId};
use navshell_feed::{FeedClient, FeedError};

/// Acts like the server: returns scripted responses first, then the current
/// server-side list. Successful acknowledgments update that list.
pub(crate) struct MockFeed {
    server: Mutex<Vec<Announcement>>,
    script: Mutex<VecDeque<Result<Vec<Announcement>, u16>>>,
    fetch_latency: Duration,
    ack_latency: Duration,
    fail_acks: AtomicBool,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    acks: Mutex<Vec<Vec<AnnouncementId>>>,
}

impl MockFeed {
    pub(crate) fn new(server: Vec<Announcement>) -> Self {
        Self {
            server: Mutex::new(server),
            script: Mutex::new(VecDeque::new()),
            fetch_latency: Duration::ZERO,
            ack_latency: Duration::ZERO,
            fail_acks: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            acks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_fetch_latency(mut self, latency: Duration) -> Self {
        self.fetch_latency = latency;
        self
    }

    pub(crate) fn with_ack_latency(mut self, latency: Duration) -> Self {
        self.ack_latency = latency;
        self
    }

    /// Queues responses for the next fetches. `Err(status)` fails that fetch.
    pub(crate) fn script(&self, responses: Vec<Result<Vec<Announcement>, u16>>) {
        self.script.lock().unwrap().extend(responses);
    }

    pub(crate) fn set_server(&self, items: Vec<Announcement>) {
        *self.server.lock().unwrap() = items;
    }

    pub(crate) fn fail_acks(&self, fail: bool) {
        self.fail_acks.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn acks(&self) -> Vec<Vec<AnnouncementId>> {
        self.acks.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedClient for MockFeed {
    async fn fetch_announcements(&self) -> Result<Vec<Announcement>, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.fetch_latency.is_zero() {
            tokio::time::sleep(self.fetch_latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(items)) => Ok(items),
            Some(Err(status)) => Err(FeedError::Status {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(self.server.lock().unwrap().clone()),
        }
    }

    async fn acknowledge(&self, ids: &[AnnouncementId]) -> Result<(), FeedError> {
        self.acks.lock().unwrap().push(ids.to_vec());
        if !self.ack_latency.is_zero() {
            tokio::time::sleep(self.ack_latency).await;
        }
        if self.fail_acks.load(Ordering::SeqCst) {
            return Err(FeedError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        for item in self.server.lock().unwrap().iter_mut() {
            if ids.contains(&item.id) {
                item.has_seen = true;
            }
        }
        Ok(())
    }
}

pub(crate) fn unseen(id: &str) -> Announcement {
    Announcement::new(id, format!("announcement {id}"))
}

pub(crate) fn seen(id: &str) -> Announcement {
    unseen(id).seen(true)
}

pub(crate) fn ids(list: &[&str]) -> Vec<AnnouncementId> {
    list.iter().map(|s| AnnouncementId::from(*s)).collect()
}

/// Advances the paused clock by `ms`, letting spawned timer tasks run.
pub(crate) async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
