//! Unit tests for the leaf services and domain types via the public API.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use roost::{
    Clock, InboxEvent, ListenerRegistry, NotificationDraft, NotificationRecord, NotificationType,
    Priority, QueryCache,
};

struct ManualClock(AtomicI64);

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

const HOUR_MS: i64 = 3_600_000;

fn sample_record(created_at: i64) -> NotificationRecord {
    NotificationRecord {
        id: "n1".to_string(),
        notification_type: NotificationType::JobAlert,
        priority: Priority::High,
        title: "New matching jobs".to_string(),
        message: "2 new postings".to_string(),
        is_read: false,
        created_at,
        action_url: None,
    }
}

#[test]
fn test_cache_ttl_law() {
    // Hit iff now - lastSet <= ttl.
    let clock = Arc::new(ManualClock(AtomicI64::new(0)));
    let cache: QueryCache<i32> = QueryCache::new(Duration::from_millis(100), clock.clone());

    cache.set("k".to_string(), 7);
    assert_eq!(cache.get("k"), Some(7));

    clock.0.store(100, Ordering::SeqCst);
    assert_eq!(cache.get("k"), Some(7));

    clock.0.store(101, Ordering::SeqCst);
    assert_eq!(cache.get("k"), None);
}

#[test]
fn test_registry_fanout_isolation() {
    let registry = ListenerRegistry::new();
    let delivered = Arc::new(AtomicUsize::new(0));

    registry.subscribe(|_| panic!("subscriber bug"));
    let counter = delivered.clone();
    registry.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    registry.publish(&InboxEvent::AllRead);
    registry.publish(&InboxEvent::Deleted { id: "x".to_string() });

    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}

#[test]
fn test_notification_type_round_trip_and_fallback() {
    for t in [
        NotificationType::ApplicationStatus,
        NotificationType::JobAlert,
        NotificationType::Message,
        NotificationType::System,
        NotificationType::Company,
        NotificationType::Payment,
        NotificationType::Promotion,
    ] {
        assert_eq!(NotificationType::from_str(t.as_str()), t);
        assert!(!t.icon().is_empty());
        assert!(t.color().starts_with('#'));
    }

    // Unknown categories degrade to System.
    assert_eq!(
        NotificationType::from_str("quantum-alert"),
        NotificationType::System
    );
}

#[test]
fn test_priority_colors_and_fallback() {
    for p in [
        Priority::Urgent,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ] {
        assert_eq!(Priority::from_str(p.as_str()), p);
        assert!(p.color().starts_with('#'));
    }
    assert_eq!(Priority::from_str("whatever"), Priority::Normal);
}

#[test]
fn test_relative_age_tiers() {
    let record = sample_record(0);

    assert_eq!(record.relative_age(30_000), "just now");
    assert_eq!(record.relative_age(5 * 60_000), "5m ago");
    assert_eq!(record.relative_age(2 * HOUR_MS), "2h ago");
    assert_eq!(record.relative_age(3 * 24 * HOUR_MS), "3d ago");

    // A week out the age collapses to a calendar date (epoch day here).
    assert_eq!(record.relative_age(8 * 24 * HOUR_MS), "1970-01-01");
}

#[test]
fn test_is_recent_window() {
    let record = sample_record(0);
    assert!(record.is_recent(23 * HOUR_MS));
    assert!(!record.is_recent(25 * HOUR_MS));
}

#[test]
fn test_draft_validation() {
    let valid = NotificationDraft {
        title: "t".to_string(),
        message: "m".to_string(),
        ..Default::default()
    };
    assert!(valid.validate().is_ok());

    let blank_title = NotificationDraft {
        title: "  ".to_string(),
        message: "m".to_string(),
        ..Default::default()
    };
    assert!(blank_title.validate().is_err());

    let blank_message = NotificationDraft {
        title: "t".to_string(),
        message: "".to_string(),
        ..Default::default()
    };
    assert!(blank_message.validate().is_err());
}

#[test]
fn test_provisional_record_shape() {
    let draft = NotificationDraft {
        title: "t".to_string(),
        message: "m".to_string(),
        notification_type: NotificationType::Payment,
        priority: Priority::Urgent,
        action_url: Some("/billing".to_string()),
    };

    let record = draft.into_provisional(42);
    assert!(record.is_provisional());
    assert!(!record.is_read);
    assert_eq!(record.created_at, 42);
    assert_eq!(record.notification_type, NotificationType::Payment);
    assert_eq!(record.priority, Priority::Urgent);
}

#[test]
fn test_wire_deserialization_casing() {
    let json = r#"{
        "id": "n-1",
        "type": "application-status",
        "priority": "urgent",
        "title": "Shortlisted",
        "message": "You made the shortlist",
        "isRead": false,
        "createdAt": 1700000000000,
        "actionUrl": "/applications/1"
    }"#;

    let record: NotificationRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.notification_type, NotificationType::ApplicationStatus);
    assert_eq!(record.priority, Priority::Urgent);
    assert!(!record.is_read);
    assert_eq!(record.action_url.as_deref(), Some("/applications/1"));
}
