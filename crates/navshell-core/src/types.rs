use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown panel key: {0}")]
    UnknownPanel(String),
}

// ─── Announcement ────────────────────────────────────────────────

/// Opaque announcement identifier.
///
/// The feed sends ids as strings, older payloads as integers. Both are
/// normalized to the string form so equality does not depend on the wire type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AnnouncementId(String);

impl AnnouncementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnouncementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnouncementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AnnouncementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for AnnouncementId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for AnnouncementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// A single feed item. Display text and link are opaque to the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: AnnouncementId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Server-authoritative; flipped locally only after a successful acknowledgment.
    #[serde(default)]
    pub has_seen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
}

impl Announcement {
    pub fn new(id: impl Into<AnnouncementId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            message: String::new(),
            link: None,
            has_seen: false,
            is_active: None,
            date_created: None,
        }
    }

    #[must_use]
    pub fn seen(mut self, has_seen: bool) -> Self {
        self.has_seen = has_seen;
        self
    }
}

// ─── Snapshot ────────────────────────────────────────────────────

/// Immutable view of the announcement cache plus its fetch status.
///
/// `loading` is true only until the first fetch settles. `error` reports that
/// the most recent fetch failed; the announcements are then the last good list.
/// Snapshots are replaced, never edited in place: every transition below
/// returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    announcements: Vec<Announcement>,
    loading: bool,
    error: bool,
    last_success_at: Option<DateTime<Utc>>,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

impl FeedSnapshot {
    /// Empty snapshot with a fetch outstanding.
    pub fn initial() -> Self {
        Self {
            announcements: Vec::new(),
            loading: true,
            error: false,
            last_success_at: None,
        }
    }

    /// Snapshot for a successful fetch. Keeps server order; a repeated id
    /// keeps its first occurrence.
    pub fn loaded(announcements: Vec<Announcement>, now: DateTime<Utc>) -> Self {
        let mut seen = HashSet::with_capacity(announcements.len());
        let announcements = announcements
            .into_iter()
            .filter(|a| seen.insert(a.id.clone()))
            .collect();
        Self {
            announcements,
            loading: false,
            error: false,
            last_success_at: Some(now),
        }
    }

    /// Same list, marked as a failed fetch.
    #[must_use]
    pub fn failed(&self) -> Self {
        Self {
            announcements: self.announcements.clone(),
            loading: false,
            error: true,
            last_success_at: self.last_success_at,
        }
    }

    /// Copy with `has_seen = true` for exactly the given ids. Ids not in the
    /// snapshot are ignored.
    #[must_use]
    pub fn with_seen(&self, ids: &[AnnouncementId]) -> Self {
        let ids: HashSet<&AnnouncementId> = ids.iter().collect();
        let announcements = self
            .announcements
            .iter()
            .map(|a| {
                if ids.contains(&a.id) {
                    a.clone().seen(true)
                } else {
                    a.clone()
                }
            })
            .collect();
        Self {
            announcements,
            ..self.clone()
        }
    }

    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    pub fn get(&self, id: &AnnouncementId) -> Option<&Announcement> {
        self.announcements.iter().find(|a| &a.id == id)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> bool {
        self.error
    }

    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }

    /// Ids with `has_seen == false`, in feed order.
    pub fn unseen_ids(&self) -> Vec<AnnouncementId> {
        self.announcements
            .iter()
            .filter(|a| !a.has_seen)
            .map(|a| a.id.clone())
            .collect()
    }

    pub fn unseen_count(&self) -> usize {
        self.announcements.iter().filter(|a| !a.has_seen).count()
    }

    /// Acknowledgment batch for the current unseen set, excluding ids already
    /// covered by a request in flight. `None` when nothing is left to send.
    pub fn ack_batch(&self, in_flight: &HashSet<AnnouncementId>) -> Option<AckBatch> {
        let ids: Vec<AnnouncementId> = self
            .unseen_ids()
            .into_iter()
            .filter(|id| !in_flight.contains(id))
            .collect();
        if ids.is_empty() {
            None
        } else {
            Some(AckBatch { ids })
        }
    }
}

/// Ids queued for one "mark seen" request. Built fresh per acknowledgment
/// cycle, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckBatch {
    ids: Vec<AnnouncementId>,
}

impl AckBatch {
    pub fn ids(&self) -> &[AnnouncementId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Announcement> {
        vec![
            Announcement::new("1", "Release notes"),
            Announcement::new("2", "Maintenance").seen(true),
            Announcement::new("3", "New dashboards"),
        ]
    }

    #[test]
    fn initial_snapshot_is_loading_and_empty() {
        let snap = FeedSnapshot::initial();
        assert!(snap.loading());
        assert!(!snap.error());
        assert!(snap.is_empty());
        assert_eq!(snap, FeedSnapshot::default());
    }

    #[test]
    fn loaded_snapshot_keeps_server_order() {
        let snap = FeedSnapshot::loaded(sample(), Utc::now());
        let ids: Vec<&str> = snap.announcements().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(!snap.loading());
        assert!(!snap.error());
        assert!(snap.last_success_at().is_some());
    }

    #[test]
    fn loaded_snapshot_drops_repeated_ids() {
        let mut items = sample();
        items.push(Announcement::new("1", "duplicate").seen(true));
        let snap = FeedSnapshot::loaded(items, Utc::now());
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.announcements()[0].title, "Release notes");
    }

    #[test]
    fn failed_keeps_list_and_clears_loading() {
        let snap = FeedSnapshot::loaded(sample(), Utc::now());
        let failed = snap.failed();
        assert_eq!(failed.announcements(), snap.announcements());
        assert!(failed.error());
        assert!(!failed.loading());
        assert_eq!(failed.last_success_at(), snap.last_success_at());
    }

    #[test]
    fn failed_from_initial_is_empty_error() {
        let failed = FeedSnapshot::initial().failed();
        assert!(failed.is_empty());
        assert!(failed.error());
        assert!(!failed.loading());
    }

    #[test]
    fn with_seen_flips_only_given_ids() {
        let snap = FeedSnapshot::loaded(sample(), Utc::now());
        let next = snap.with_seen(&[AnnouncementId::from("1"), AnnouncementId::from("99")]);
        assert!(next.get(&"1".into()).is_some_and(|a| a.has_seen));
        assert!(next.get(&"3".into()).is_some_and(|a| !a.has_seen));
        // Original is untouched.
        assert!(snap.get(&"1".into()).is_some_and(|a| !a.has_seen));
    }

    #[test]
    fn unseen_ids_and_count_agree() {
        let snap = FeedSnapshot::loaded(sample(), Utc::now());
        assert_eq!(snap.unseen_ids(), vec![AnnouncementId::from("1"), AnnouncementId::from("3")]);
        assert_eq!(snap.unseen_count(), 2);
    }

    #[test]
    fn ack_batch_excludes_in_flight_ids() {
        let snap = FeedSnapshot::loaded(sample(), Utc::now());
        let in_flight: HashSet<AnnouncementId> = [AnnouncementId::from("1")].into_iter().collect();
        let batch = snap.ack_batch(&in_flight).expect("id 3 is still unseen");
        assert_eq!(batch.ids(), &[AnnouncementId::from("3")]);
    }

    #[test]
    fn ack_batch_none_when_all_seen() {
        let snap = FeedSnapshot::loaded(vec![Announcement::new("2", "old").seen(true)], Utc::now());
        assert!(snap.ack_batch(&HashSet::new()).is_none());
    }

    #[test]
    fn deserialize_feed_payload() {
        let json = r#"[
            {"id": "7", "title": "Hello", "message": "World", "link": "https://example.com", "hasSeen": false, "isActive": true, "dateCreated": "2018-03-01T12:00:00Z"},
            {"id": 8, "title": "Numeric", "message": "", "link": null, "hasSeen": true, "extra": 1}
        ]"#;
        let items: Vec<Announcement> = serde_json::from_str(json).expect("valid payload");
        assert_eq!(items[0].id, AnnouncementId::from("7"));
        assert_eq!(items[0].link.as_deref(), Some("https://example.com"));
        assert_eq!(items[0].is_active, Some(true));
        assert!(items[0].date_created.is_some());
        assert_eq!(items[1].id, AnnouncementId::from("8"));
        assert!(items[1].has_seen);
        assert!(items[1].link.is_none());
    }

    #[test]
    fn serialize_uses_camel_case() {
        let json = serde_json::to_value(Announcement::new("5", "t").seen(true)).expect("serializable");
        assert_eq!(json["hasSeen"], serde_json::json!(true));
        assert_eq!(json["id"], serde_json::json!("5"));
        assert!(json.get("isActive").is_none());
    }
}
