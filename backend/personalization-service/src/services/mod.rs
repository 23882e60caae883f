pub mod conversation;
pub mod personalization;
pub mod snapshot;

pub use conversation::ConversationContextStore;
pub use personalization::{PatternStore, PersonalizationEngine};
pub use snapshot::{PatternSnapshotStore, RedisSnapshotStore, SnapshotWriter};
