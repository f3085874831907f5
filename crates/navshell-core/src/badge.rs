//! Notification badge projection.
//!
//! Derived on every read from the current snapshot; nothing here is cached.

use serde::Serialize;

use crate::panel::{PanelKey, PanelState};
use crate::types::FeedSnapshot;

/// What the sidebar item for the announcement feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    /// Number of unseen announcements.
    pub count: usize,
    /// The announcements panel is the one currently open.
    pub active: bool,
}

pub fn badge_count(snapshot: &FeedSnapshot) -> usize {
    snapshot.unseen_count()
}

pub fn project_badge(snapshot: &FeedSnapshot, panel: PanelState) -> Badge {
    Badge {
        count: badge_count(snapshot),
        active: panel.is_open(PanelKey::Announcements),
    }
}
