pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use crate::config::{Config, EngineConfig};
pub use error::{AppError, Result};
pub use services::{
    ConversationContextStore, PatternSnapshotStore, PatternStore, PersonalizationEngine,
    RedisSnapshotStore, SnapshotWriter,
};
