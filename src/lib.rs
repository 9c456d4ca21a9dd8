//! Roost - Client-side notification inbox synchronization engine
//!
//! Keeps a client-held notification inbox consistent with a remote,
//! authoritative store over an unreliable network: TTL-bounded list caching,
//! optimistic mutations with merge-by-id reconciliation, event fan-out to
//! multiple UI consumers, and a reference-counted background refresh timer.
//!
//! The host application composes the engine once at its root:
//!
//! ```no_run
//! use std::sync::Arc;
//! use roost::{
//!     EngineConfig, HttpTransport, InboxService, RefreshScheduler, SystemClock, TokenSlot,
//! };
//!
//! let config = EngineConfig::from_env();
//! let session = Arc::new(TokenSlot::new());
//! let transport = Arc::new(HttpTransport::new(config.api_url.clone(), session));
//! let inbox = InboxService::new(config.clone(), transport, Arc::new(SystemClock));
//! let scheduler = RefreshScheduler::new(inbox.clone(), config.refresh_interval);
//! scheduler.start_auto_refresh();
//! ```

pub mod config;
pub mod error;
pub mod services;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use services::{
    InboxService, ListenerRegistry, QueryCache, RefreshScheduler, RemoteClient, RemoteOutcome,
    SubscriptionId,
};
pub use transport::{Clock, HttpTransport, SessionProvider, SystemClock, TokenSlot, Transport};
pub use types::*;
