//! # Storage Layer
//!
//! `MetricsStore` backends (in-memory, Redis) plus the helpers every
//! component uses on top of them:
//! - `MetricsStoreExt`: zero-degrading reads and JSON values
//! - `RollingWindow`: fixed-capacity FIFO list persisted under one key

pub mod ext;
pub mod memory;
pub mod redis;
pub mod window;

pub use ext::MetricsStoreExt;
pub use memory::InMemoryStore;
pub use redis::RedisStore;
pub use window::{RollingWindow, mean};
