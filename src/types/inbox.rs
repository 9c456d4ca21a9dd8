//! Inbox-level types: wire pages, snapshots, filters, and engine events.

use serde::{Deserialize, Serialize};

use super::notification::NotificationRecord;

/// Paginated list response from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub notifications: Vec<NotificationRecord>,
    /// Total record count on the server.
    pub total: i64,
    /// Current page (1-indexed).
    pub page: i64,
    pub page_size: i64,
    /// Server-reported unread count. Cross-checked against the merged set;
    /// the locally recomputed figure wins on disagreement.
    pub unread_count: i64,
}

/// Ordered view of the inbox handed to consumers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InboxSnapshot {
    /// Newest-first.
    pub notifications: Vec<NotificationRecord>,
    pub unread_count: usize,
}

/// Read-status filter for derived views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Unread,
    Read,
}

/// Filter state applied by `InboxService::filtered`.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub status: StatusFilter,
    /// Case-insensitive substring match over title and message.
    pub query: String,
}

/// Options for a list fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Skip the cache read (a successful response still populates it).
    pub force: bool,
    /// Ask the backend for unread records only.
    pub unread_only: bool,
}

/// Domain events fanned out to subscribers. Payloads are owned clones;
/// nothing here aliases engine-internal state.
#[derive(Debug, Clone, PartialEq)]
pub enum InboxEvent {
    Read { id: String },
    AllRead,
    Deleted { id: String },
    Created { notification: NotificationRecord },
}

impl InboxEvent {
    pub fn name(&self) -> &str {
        match self {
            InboxEvent::Read { .. } => "read",
            InboxEvent::AllRead => "all-read",
            InboxEvent::Deleted { .. } => "deleted",
            InboxEvent::Created { .. } => "created",
        }
    }
}

/// Session lifecycle events published by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}
