//! navshell-core: pure data model and state machines for the navigation shell.
//! Announcement snapshots, the exclusive panel coordinator and the badge
//! projection. No IO, no async.

pub mod badge;
pub mod panel;
pub mod types;

pub use badge::{Badge, badge_count, project_badge};
pub use panel::{Bounds, PanelCoordinator, PanelKey, PanelState, PanelTransition, Point};
pub use types::{AckBatch, Announcement, AnnouncementId, CoreError, FeedSnapshot};
