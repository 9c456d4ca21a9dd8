//! Remote access layer.
//!
//! Wraps the injected [`Transport`] and normalizes notification payloads.
//! Transport failures degrade instead of erroring: `list` falls back to a
//! fixed offline dataset and mutations report logical success, with the
//! outcome flagged so the inbox store knows what the server actually
//! confirmed. Validation failures on create are the one hard error.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::transport::{Clock, Transport};
use crate::types::{
    ListResponse, NotificationDraft, NotificationRecord, NotificationType, Priority,
};

/// A remote call result plus whether the server actually confirmed it.
#[derive(Debug, Clone)]
pub struct RemoteOutcome<T> {
    pub value: T,
    /// False when the value was synthesized locally after a transport
    /// failure and still needs reconciliation against the server.
    pub confirmed: bool,
}

impl<T> RemoteOutcome<T> {
    fn confirmed(value: T) -> Self {
        Self {
            value,
            confirmed: true,
        }
    }

    fn assumed(value: T) -> Self {
        Self {
            value,
            confirmed: false,
        }
    }
}

/// REST client for the notification backend.
pub struct RemoteClient {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl RemoteClient {
    pub fn new(transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Self { transport, clock }
    }

    /// Fetch one page of notifications.
    pub async fn list(
        &self,
        page: i64,
        page_size: i64,
        unread_only: bool,
    ) -> RemoteOutcome<ListResponse> {
        let params = [
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
            ("unreadOnly", unread_only.to_string()),
        ];

        match self.transport.get("/notifications", &params).await {
            Ok(value) => match serde_json::from_value(unwrap_data(value)) {
                Ok(response) => RemoteOutcome::confirmed(response),
                Err(e) => {
                    warn!("malformed notification list payload: {}", e);
                    RemoteOutcome::assumed(self.offline_list(page, page_size))
                }
            },
            Err(e) => {
                warn!("notification list fetch failed, serving offline data: {}", e);
                RemoteOutcome::assumed(self.offline_list(page, page_size))
            }
        }
    }

    /// Mark one notification read on the server.
    pub async fn mark_read(&self, id: &str) -> RemoteOutcome<()> {
        let path = format!("/notifications/{}/read", id);
        match self.transport.post(&path, json!({})).await {
            Ok(_) => RemoteOutcome::confirmed(()),
            Err(e) => {
                warn!(id, "mark-read not confirmed by server: {}", e);
                RemoteOutcome::assumed(())
            }
        }
    }

    /// Mark every notification read on the server.
    pub async fn mark_all_read(&self) -> RemoteOutcome<()> {
        match self.transport.post("/notifications/read-all", json!({})).await {
            Ok(_) => RemoteOutcome::confirmed(()),
            Err(e) => {
                warn!("mark-all-read not confirmed by server: {}", e);
                RemoteOutcome::assumed(())
            }
        }
    }

    /// Delete one notification on the server.
    pub async fn remove(&self, id: &str) -> RemoteOutcome<()> {
        let path = format!("/notifications/{}", id);
        match self.transport.delete(&path).await {
            Ok(_) => RemoteOutcome::confirmed(()),
            Err(e) => {
                warn!(id, "delete not confirmed by server: {}", e);
                RemoteOutcome::assumed(())
            }
        }
    }

    /// Create a notification. Drafts missing required fields are rejected
    /// outright; transport failures yield a locally synthesized record.
    pub async fn create(&self, draft: NotificationDraft) -> Result<RemoteOutcome<NotificationRecord>> {
        draft.validate()?;

        let body = serde_json::to_value(&draft)?;
        match self.transport.post("/notifications", body).await {
            Ok(value) => match serde_json::from_value(unwrap_data(value)) {
                Ok(record) => Ok(RemoteOutcome::confirmed(record)),
                Err(e) => {
                    warn!("malformed create-notification payload: {}", e);
                    Ok(RemoteOutcome::assumed(
                        draft.into_provisional(self.clock.now_ms()),
                    ))
                }
            },
            Err(e) => {
                warn!("create not confirmed by server, keeping local record: {}", e);
                Ok(RemoteOutcome::assumed(
                    draft.into_provisional(self.clock.now_ms()),
                ))
            }
        }
    }

    /// Deterministic offline dataset served when the backend is unreachable.
    /// Page 1 carries the records; later pages are empty so pagination
    /// terminates.
    fn offline_list(&self, page: i64, page_size: i64) -> ListResponse {
        let now = self.clock.now_ms();
        let notifications = if page <= 1 {
            offline_records(now)
        } else {
            Vec::new()
        };
        let unread_count = notifications.iter().filter(|n| !n.is_read).count() as i64;
        debug!(page, "serving {} offline notifications", notifications.len());

        ListResponse {
            total: notifications.len() as i64,
            notifications,
            page,
            page_size,
            unread_count,
        }
    }
}

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

fn offline_records(now_ms: i64) -> Vec<NotificationRecord> {
    vec![
        NotificationRecord {
            id: "offline-1".to_string(),
            notification_type: NotificationType::ApplicationStatus,
            priority: Priority::High,
            title: "Application moved forward".to_string(),
            message: "Your application for Senior Backend Engineer is now under review."
                .to_string(),
            is_read: false,
            created_at: now_ms - 12 * MINUTE_MS,
            action_url: Some("/applications".to_string()),
        },
        NotificationRecord {
            id: "offline-2".to_string(),
            notification_type: NotificationType::JobAlert,
            priority: Priority::Normal,
            title: "New jobs match your profile".to_string(),
            message: "3 new postings match your saved search \"Rust, remote\".".to_string(),
            is_read: false,
            created_at: now_ms - 2 * HOUR_MS,
            action_url: Some("/jobs".to_string()),
        },
        NotificationRecord {
            id: "offline-3".to_string(),
            notification_type: NotificationType::Message,
            priority: Priority::Normal,
            title: "Message from Acme Recruiting".to_string(),
            message: "Hi! We'd love to schedule a quick intro call this week.".to_string(),
            is_read: true,
            created_at: now_ms - 5 * HOUR_MS,
            action_url: None,
        },
        NotificationRecord {
            id: "offline-4".to_string(),
            notification_type: NotificationType::System,
            priority: Priority::Low,
            title: "Profile tip".to_string(),
            message: "Profiles with a summary get twice as many views.".to_string(),
            is_read: true,
            created_at: now_ms - 26 * HOUR_MS,
            action_url: Some("/profile".to_string()),
        },
    ]
}

fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_records_are_deterministic_and_nonempty() {
        let now = 1_700_000_000_000;
        let a = offline_records(now);
        let b = offline_records(now);
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_unwrap_data_peels_envelope() {
        let wrapped = json!({ "data": { "x": 1 } });
        assert_eq!(unwrap_data(wrapped), json!({ "x": 1 }));

        let bare = json!({ "x": 1 });
        assert_eq!(unwrap_data(bare), json!({ "x": 1 }));
    }
}
