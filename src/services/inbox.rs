//! Reconciling inbox store.
//!
//! The one authoritative in-memory view of "notifications known to this
//! client". All consumers share a single instance, constructed once at the
//! application composition root and handed around by `Arc`. Mutations apply
//! optimistically, fire listener events immediately, invalidate the list
//! caches, and only then wait on the server.

use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::services::cache::QueryCache;
use crate::services::events::{ListenerRegistry, SubscriptionId};
use crate::services::remote::RemoteClient;
use crate::transport::{Clock, Transport};
use crate::types::{
    FetchOptions, FilterState, InboxEvent, InboxSnapshot, ListResponse, NotificationDraft,
    NotificationRecord, StatusFilter,
};

/// Cache key prefix shared by every list page; mutations invalidate on it.
const LIST_CACHE_PREFIX: &str = "notifications:list";

fn list_key(page: i64, page_size: i64, unread_only: bool) -> String {
    // `force` is deliberately not part of the signature.
    format!(
        "{}:p{}:s{}:u{}",
        LIST_CACHE_PREFIX, page, page_size, unread_only as u8
    )
}

struct InboxState {
    /// Newest-first.
    records: Vec<NotificationRecord>,
    /// Always recomputed from `records`, never taken from a server payload.
    unread_count: usize,
}

impl InboxState {
    fn recompute_unread(&mut self) {
        self.unread_count = self.records.iter().filter(|n| !n.is_read).count();
    }

    fn snapshot(&self) -> InboxSnapshot {
        InboxSnapshot {
            notifications: self.records.clone(),
            unread_count: self.unread_count,
        }
    }
}

/// Reconciling notification inbox shared by all UI consumers.
pub struct InboxService {
    state: RwLock<InboxState>,
    cache: QueryCache<ListResponse>,
    remote: RemoteClient,
    listeners: ListenerRegistry,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl InboxService {
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(InboxState {
                records: Vec::new(),
                unread_count: 0,
            }),
            cache: QueryCache::new(config.list_ttl, clock.clone()),
            remote: RemoteClient::new(transport, clock.clone()),
            listeners: ListenerRegistry::new(),
            clock,
            config,
        })
    }

    // =========================================================================
    // Query API
    // =========================================================================

    /// Fetch one page of notifications, cache-aware unless forced, and merge
    /// it into the in-memory set.
    pub async fn fetch(&self, page: i64, opts: FetchOptions) -> InboxSnapshot {
        let page = page.max(1);
        let page_size = self.config.page_size;
        let key = list_key(page, page_size, opts.unread_only);

        if !opts.force {
            if let Some(cached) = self.cache.get(&key) {
                debug!(page, "notification list served from cache");
                return self.merge(&cached, page);
            }
        }

        let outcome = self.remote.list(page, page_size, opts.unread_only).await;
        if outcome.confirmed {
            self.cache.set(key, outcome.value.clone());
        }
        self.merge(&outcome.value, page)
    }

    /// Current in-memory view without touching cache or network.
    pub fn snapshot(&self) -> InboxSnapshot {
        self.read_state().snapshot()
    }

    /// Current unread count.
    pub fn unread_count(&self) -> usize {
        self.read_state().unread_count
    }

    /// Derived view: status filter first, then case-insensitive substring
    /// match over title and message. Never mutates the canonical set.
    pub fn filtered(&self, filter: &FilterState) -> Vec<NotificationRecord> {
        let query = filter.query.trim().to_lowercase();
        self.read_state()
            .records
            .iter()
            .filter(|n| match filter.status {
                StatusFilter::All => true,
                StatusFilter::Unread => !n.is_read,
                StatusFilter::Read => n.is_read,
            })
            .filter(|n| {
                query.is_empty()
                    || n.title.to_lowercase().contains(&query)
                    || n.message.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    // =========================================================================
    // Mutation API (optimistic)
    // =========================================================================

    /// Mark one notification read. Unknown ids are a no-op since deletes may
    /// race with reads; marking twice is idempotent.
    pub async fn mark_as_read(&self, id: &str) {
        {
            let mut state = self.write_state();
            match state.records.iter_mut().find(|n| n.id == id) {
                Some(record) if !record.is_read => {
                    record.is_read = true;
                    state.recompute_unread();
                }
                // Already read or already deleted.
                _ => return,
            }
        }

        self.listeners.publish(&InboxEvent::Read { id: id.to_string() });
        self.cache.invalidate_prefix(LIST_CACHE_PREFIX);

        let outcome = self.remote.mark_read(id).await;
        if !outcome.confirmed && self.config.rollback_on_failure {
            let mut state = self.write_state();
            if let Some(record) = state.records.iter_mut().find(|n| n.id == id) {
                record.is_read = false;
                state.recompute_unread();
            }
            self.cache.invalidate_prefix(LIST_CACHE_PREFIX);
            warn!(id, "rolled back optimistic mark-read");
        }
    }

    /// Mark every notification read.
    pub async fn mark_all_as_read(&self) {
        let previously_unread: Vec<String> = {
            let mut state = self.write_state();
            let ids: Vec<String> = state
                .records
                .iter()
                .filter(|n| !n.is_read)
                .map(|n| n.id.clone())
                .collect();
            if ids.is_empty() {
                return;
            }
            for record in state.records.iter_mut() {
                record.is_read = true;
            }
            state.recompute_unread();
            ids
        };

        self.listeners.publish(&InboxEvent::AllRead);
        self.cache.invalidate_prefix(LIST_CACHE_PREFIX);

        let outcome = self.remote.mark_all_read().await;
        if !outcome.confirmed && self.config.rollback_on_failure {
            let mut state = self.write_state();
            for record in state.records.iter_mut() {
                if previously_unread.contains(&record.id) {
                    record.is_read = false;
                }
            }
            state.recompute_unread();
            self.cache.invalidate_prefix(LIST_CACHE_PREFIX);
            warn!("rolled back optimistic mark-all-read");
        }
    }

    /// Delete one notification. Unknown ids are a no-op.
    pub async fn delete_notification(&self, id: &str) {
        let removed = {
            let mut state = self.write_state();
            let position = match state.records.iter().position(|n| n.id == id) {
                Some(p) => p,
                None => return,
            };
            let record = state.records.remove(position);
            state.recompute_unread();
            (position, record)
        };

        self.listeners
            .publish(&InboxEvent::Deleted { id: id.to_string() });
        self.cache.invalidate_prefix(LIST_CACHE_PREFIX);

        let outcome = self.remote.remove(id).await;
        if !outcome.confirmed && self.config.rollback_on_failure {
            let (position, record) = removed;
            let mut state = self.write_state();
            let position = position.min(state.records.len());
            state.records.insert(position, record);
            state.recompute_unread();
            self.cache.invalidate_prefix(LIST_CACHE_PREFIX);
            warn!(id, "rolled back optimistic delete");
        }
    }

    /// Create a notification. The record appears immediately under a temp
    /// id; a confirmed server response swaps the real id in.
    pub async fn create_notification(&self, draft: NotificationDraft) -> Result<NotificationRecord> {
        draft.validate()?;

        let provisional = {
            let mut state = self.write_state();
            let record = draft.clone().into_provisional(self.clock.now_ms());
            state.records.insert(0, record.clone());
            state.recompute_unread();
            record
        };

        self.listeners.publish(&InboxEvent::Created {
            notification: provisional.clone(),
        });
        self.cache.invalidate_prefix(LIST_CACHE_PREFIX);

        let outcome = self.remote.create(draft).await?;
        if outcome.confirmed {
            let confirmed = outcome.value;
            let mut state = self.write_state();
            if let Some(record) = state
                .records
                .iter_mut()
                .find(|n| n.id == provisional.id)
            {
                *record = confirmed.clone();
            }
            state.recompute_unread();
            return Ok(confirmed);
        }

        if self.config.rollback_on_failure {
            let mut state = self.write_state();
            state.records.retain(|n| n.id != provisional.id);
            state.recompute_unread();
            drop(state);
            self.cache.invalidate_prefix(LIST_CACHE_PREFIX);
            warn!("rolled back optimistic create");
            return Err(EngineError::Transport(
                "create was not confirmed by the server".to_string(),
            ));
        }

        Ok(provisional)
    }

    /// Drop all local state. Called at logout so the next session starts
    /// from an empty inbox.
    pub fn clear(&self) {
        let mut state = self.write_state();
        state.records.clear();
        state.unread_count = 0;
        drop(state);
        self.cache.clear();
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&InboxEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.unsubscribe(id);
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Merge a list response into the in-memory set by id.
    ///
    /// Page 1 replaces the visible order; later pages upsert records the
    /// client already holds and append the genuinely new ids. A locally
    /// read record stays read even when the incoming copy predates the
    /// mutation, and provisional (`tmp-`) records survive until the server
    /// hands back their confirmed counterpart.
    fn merge(&self, response: &ListResponse, page: i64) -> InboxSnapshot {
        let mut state = self.write_state();

        if page <= 1 {
            let mut merged: Vec<NotificationRecord> = Vec::with_capacity(
                response.notifications.len() + state.records.len(),
            );

            // Unconfirmed local creates stay at the top.
            for record in state.records.iter() {
                if record.is_provisional()
                    && !response.notifications.iter().any(|n| n.id == record.id)
                {
                    merged.push(record.clone());
                }
            }

            for incoming in &response.notifications {
                let mut record = incoming.clone();
                if let Some(local) = state.records.iter().find(|n| n.id == incoming.id) {
                    // is_read only ever moves false -> true.
                    record.is_read = record.is_read || local.is_read;
                }
                merged.push(record);
            }

            state.records = merged;
        } else {
            for incoming in &response.notifications {
                if let Some(local) = state.records.iter_mut().find(|n| n.id == incoming.id) {
                    let was_read = local.is_read;
                    *local = incoming.clone();
                    local.is_read = was_read || incoming.is_read;
                } else {
                    state.records.push(incoming.clone());
                }
            }
        }

        state.recompute_unread();

        // The server figure may cover records this client has not merged
        // yet (pagination); the locally recomputed count wins.
        if response.unread_count >= 0 && response.unread_count as usize != state.unread_count {
            warn!(
                server = response.unread_count,
                local = state.unread_count as u64,
                "unread count disagreement after merge, preferring local"
            );
        }

        state.snapshot()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, InboxState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, InboxState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
