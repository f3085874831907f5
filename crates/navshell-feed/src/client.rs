//! FeedClient trait: the remote collaborator behind the announcement feed.

use std::sync::Arc;

use async_trait::async_trait;
use navshell_core::{Announcement, AnnouncementId};

use crate::error::FeedError;

/// Fetches announcements and acknowledges seen ones. Enables mock injection
/// for the controller's timer tests.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Full announcement list in server order.
    async fn fetch_announcements(&self) -> Result<Vec<Announcement>, FeedError>;

    /// Marks exactly `ids` as seen in one request.
    async fn acknowledge(&self, ids: &[AnnouncementId]) -> Result<(), FeedError>;
}

#[async_trait]
impl<T: FeedClient + ?Sized> FeedClient for Arc<T> {
    async fn fetch_announcements(&self) -> Result<Vec<Announcement>, FeedError> {
        (**self).fetch_announcements().await
    }

    async fn acknowledge(&self, ids: &[AnnouncementId]) -> Result<(), FeedError> {
        (**self).acknowledge(ids).await
    }
}
