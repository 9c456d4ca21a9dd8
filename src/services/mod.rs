pub mod cache;
pub mod events;
pub mod inbox;
pub mod remote;
pub mod scheduler;

pub use cache::QueryCache;
pub use events::{ListenerRegistry, SubscriptionId};
pub use inbox::InboxService;
pub use remote::{RemoteClient, RemoteOutcome};
pub use scheduler::RefreshScheduler;
