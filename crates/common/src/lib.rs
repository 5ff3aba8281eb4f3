pub mod config;
pub mod error;
pub mod queue;
pub mod redis_pool;
pub mod types;
