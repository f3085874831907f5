//! Host-event loop for the navigation shell.
//!
//! The host registers by holding a [`HostEvents`] sender and pushes pointer,
//! route and panel events into it. A single task owns the
//! [`PanelCoordinator`], applies each event, publishes the resulting panel
//! state, and gates the feed controller: showing the announcements panel arms
//! the acknowledgment delay, hiding it cancels a pending one.
//!
//! [`ShellHandle::teardown`] cancels the loop and waits for it to exit, then
//! stops the feed controller. Once it returns the event channel is closed and
//! no further panel state is published.

use navshell_core::{
    Badge, Bounds, FeedSnapshot, PanelCoordinator, PanelKey, PanelState, PanelTransition, Point,
    project_badge,
};
use navshell_feed::FeedClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::controller::AnnouncementFeed;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("navigation shell has been torn down")]
    TornDown,
}

/// Events the host forwards into the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// Pointer pressed anywhere on the page.
    PointerDown { x: f64, y: f64 },
    RouteChanged { previous: String, next: String },
    ShowPanel { panel: PanelKey },
    TogglePanel { panel: PanelKey },
    ClosePanel,
    /// Container rectangle changed (or was unmounted when `None`).
    ContainerBounds { bounds: Option<Bounds> },
    RefreshFeed,
}

/// Registration for a host event source. Cloneable; sends fail with
/// [`ShellError::TornDown`] once the shell is gone.
#[derive(Debug, Clone)]
pub struct HostEvents {
    tx: mpsc::Sender<HostEvent>,
}

impl HostEvents {
    pub async fn send(&self, event: HostEvent) -> Result<(), ShellError> {
        self.tx.send(event).await.map_err(|_| ShellError::TornDown)
    }
}

/// What the host renders from: panel, badge and feed status in one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellStatus {
    pub panel: PanelState,
    pub badge: Badge,
    pub announcements: usize,
    pub loading: bool,
    pub error: bool,
}

impl ShellStatus {
    pub fn new(panel: PanelState, snapshot: &FeedSnapshot) -> Self {
        Self {
            panel,
            badge: project_badge(snapshot, panel),
            announcements: snapshot.len(),
            loading: snapshot.loading(),
            error: snapshot.error(),
        }
    }
}

pub struct ShellHandle<C> {
    events: HostEvents,
    panel: watch::Receiver<PanelState>,
    feed: AnnouncementFeed<C>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Starts the feed controller and the host-event loop.
pub fn spawn_shell<C: FeedClient + 'static>(feed: AnnouncementFeed<C>, buffer: usize) -> ShellHandle<C> {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let (panel_tx, panel_rx) = watch::channel(PanelState::Closed);
    let cancel = CancellationToken::new();
    let shell = ShellLoop {
        coordinator: PanelCoordinator::new(),
        feed: feed.clone(),
        panel_tx,
        events: rx,
        cancel: cancel.clone(),
    };
    let task = tokio::spawn(shell.run());
    ShellHandle {
        events: HostEvents { tx },
        panel: panel_rx,
        feed,
        cancel,
        task,
    }
}

impl<C: FeedClient + 'static> ShellHandle<C> {
    /// Another sender for a separate host event source.
    pub fn events(&self) -> HostEvents {
        self.events.clone()
    }

    pub async fn send(&self, event: HostEvent) -> Result<(), ShellError> {
        self.events.send(event).await
    }

    pub async fn toggle(&self, panel: PanelKey) -> Result<(), ShellError> {
        self.send(HostEvent::TogglePanel { panel }).await
    }

    pub async fn show(&self, panel: PanelKey) -> Result<(), ShellError> {
        self.send(HostEvent::ShowPanel { panel }).await
    }

    pub async fn close(&self) -> Result<(), ShellError> {
        self.send(HostEvent::ClosePanel).await
    }

    pub async fn pointer_down(&self, target: Point) -> Result<(), ShellError> {
        self.send(HostEvent::PointerDown {
            x: target.x,
            y: target.y,
        })
        .await
    }

    pub async fn navigate(&self, previous: &str, next: &str) -> Result<(), ShellError> {
        self.send(HostEvent::RouteChanged {
            previous: previous.to_string(),
            next: next.to_string(),
        })
        .await
    }

    pub async fn set_container(&self, bounds: Option<Bounds>) -> Result<(), ShellError> {
        self.send(HostEvent::ContainerBounds { bounds }).await
    }

    pub async fn refresh(&self) -> Result<(), ShellError> {
        self.send(HostEvent::RefreshFeed).await
    }

    pub fn panel_state(&self) -> PanelState {
        *self.panel.borrow()
    }

    pub fn open_panel(&self) -> Option<PanelKey> {
        self.panel_state().open_key()
    }

    pub fn subscribe_panel(&self) -> watch::Receiver<PanelState> {
        self.panel.clone()
    }

    pub fn feed(&self) -> &AnnouncementFeed<C> {
        &self.feed
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.feed.current_snapshot()
    }

    pub fn unseen_count(&self) -> usize {
        self.feed.unseen_count()
    }

    pub fn badge(&self) -> Badge {
        project_badge(&self.feed.current_snapshot(), self.panel_state())
    }

    pub fn status(&self) -> ShellStatus {
        ShellStatus::new(self.panel_state(), &self.feed.current_snapshot())
    }

    /// Detaches all host event sources and stops the feed controller.
    pub async fn teardown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "navigation shell task ended abnormally");
        }
        self.feed.stop().await;
    }
}

struct ShellLoop<C> {
    coordinator: PanelCoordinator,
    feed: AnnouncementFeed<C>,
    panel_tx: watch::Sender<PanelState>,
    events: mpsc::Receiver<HostEvent>,
    cancel: CancellationToken,
}

impl<C: FeedClient + 'static> ShellLoop<C> {
    async fn run(mut self) {
        self.feed.start().await;
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
            }
        }
        self.events.close();
        self.feed.stop().await;
        tracing::info!("navigation shell torn down");
    }

    async fn handle(&mut self, event: HostEvent) {
        let transition = match event {
            HostEvent::PointerDown { x, y } => {
                self.coordinator.on_outside_interaction(Point::new(x, y))
            }
            HostEvent::RouteChanged { previous, next } => {
                self.coordinator.on_navigation(&previous, &next)
            }
            HostEvent::ShowPanel { panel } => self.coordinator.show(panel),
            HostEvent::TogglePanel { panel } => self.coordinator.toggle(panel),
            HostEvent::ClosePanel => self.coordinator.close(),
            HostEvent::ContainerBounds { bounds } => {
                self.coordinator.set_container(bounds);
                None
            }
            HostEvent::RefreshFeed => {
                if let Err(e) = self.feed.refresh_now().await {
                    tracing::warn!(error = %e, "refresh request dropped");
                }
                None
            }
        };
        if let Some(transition) = transition {
            self.apply(transition).await;
        }
    }

    async fn apply(&mut self, transition: PanelTransition) {
        tracing::debug!(from = ?transition.from, to = ?transition.to, "panel transition");
        self.panel_tx.send_replace(transition.to);

        if transition.closed() == Some(PanelKey::Announcements) {
            self.feed.on_panel_closed().await;
        }
        if transition.opened() == Some(PanelKey::Announcements) {
            if let Err(e) = self.feed.on_panel_opened().await {
                tracing::warn!(error = %e, "acknowledgment not scheduled");
            }
        }
    }
}
