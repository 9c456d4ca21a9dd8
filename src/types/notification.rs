//! Notification record types and render-time display metadata.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Notification type categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    ApplicationStatus,
    JobAlert,
    Message,
    #[default]
    System,
    Company,
    Payment,
    Promotion,
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::ApplicationStatus => "application-status",
            NotificationType::JobAlert => "job-alert",
            NotificationType::Message => "message",
            NotificationType::System => "system",
            NotificationType::Company => "company",
            NotificationType::Payment => "payment",
            NotificationType::Promotion => "promotion",
        }
    }

    /// Unknown categories map to System rather than failing the whole record.
    pub fn from_str(s: &str) -> Self {
        match s {
            "application-status" => NotificationType::ApplicationStatus,
            "job-alert" => NotificationType::JobAlert,
            "message" => NotificationType::Message,
            "system" => NotificationType::System,
            "company" => NotificationType::Company,
            "payment" => NotificationType::Payment,
            "promotion" => NotificationType::Promotion,
            _ => NotificationType::System,
        }
    }

    /// Icon shown next to the notification. Exhaustive on purpose: adding a
    /// variant without a glyph is a compile error, not a silent fallthrough.
    pub fn icon(&self) -> &str {
        match self {
            NotificationType::ApplicationStatus => "📋",
            NotificationType::JobAlert => "💼",
            NotificationType::Message => "✉️",
            NotificationType::System => "⚙️",
            NotificationType::Company => "🏢",
            NotificationType::Payment => "💳",
            NotificationType::Promotion => "📣",
        }
    }

    /// Accent color for the type badge.
    pub fn color(&self) -> &str {
        match self {
            NotificationType::ApplicationStatus => "#2563eb",
            NotificationType::JobAlert => "#0d9488",
            NotificationType::Message => "#7c3aed",
            NotificationType::System => "#64748b",
            NotificationType::Company => "#b45309",
            NotificationType::Payment => "#15803d",
            NotificationType::Promotion => "#db2777",
        }
    }
}

/// Notification priority levels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "urgent" => Priority::Urgent,
            "high" => Priority::High,
            "normal" => Priority::Normal,
            "low" => Priority::Low,
            _ => Priority::Normal,
        }
    }

    pub fn color(&self) -> &str {
        match self {
            Priority::Urgent => "#dc2626",
            Priority::High => "#ea580c",
            Priority::Normal => "#2563eb",
            Priority::Low => "#64748b",
        }
    }
}

/// How long a record counts as "recent" for badge purposes.
const RECENT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// A notification record held in the client inbox.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Server-issued id, or a `tmp-` prefixed id for optimistic creates.
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl NotificationRecord {
    /// Whether this record was created locally and not yet confirmed.
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with("tmp-")
    }

    /// Created within the last 24 hours. Computed per call, never stored.
    pub fn is_recent(&self, now_ms: i64) -> bool {
        now_ms - self.created_at < RECENT_WINDOW_MS
    }

    /// Human-relative age ("just now", "5m ago", "2h ago", "3d ago", or a
    /// calendar date once a delta stops being meaningful).
    pub fn relative_age(&self, now_ms: i64) -> String {
        let elapsed_ms = (now_ms - self.created_at).max(0);
        let minutes = elapsed_ms / 60_000;
        let hours = minutes / 60;
        let days = hours / 24;

        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if hours < 24 {
            format!("{}h ago", hours)
        } else if days < 7 {
            format!("{}d ago", days)
        } else {
            match chrono::DateTime::from_timestamp_millis(self.created_at) {
                Some(dt) => dt.format("%Y-%m-%d").to_string(),
                None => format!("{}d ago", days),
            }
        }
    }
}

/// Input for creating a notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[serde(rename = "type", default)]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl NotificationDraft {
    /// Required fields must be present; the engine never synthesizes them.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "notification title is required".to_string(),
            ));
        }
        if self.message.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "notification message is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Materialize the draft as a provisional record with a temp id.
    pub fn into_provisional(self, now_ms: i64) -> NotificationRecord {
        NotificationRecord {
            id: format!("tmp-{}", uuid::Uuid::new_v4()),
            notification_type: self.notification_type,
            priority: self.priority,
            title: self.title,
            message: self.message,
            is_read: false,
            created_at: now_ms,
            action_url: self.action_url,
        }
    }
}
