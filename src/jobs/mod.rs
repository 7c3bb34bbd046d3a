//! Job queue system for background learning runs

pub mod context;
pub mod dispatch;
pub mod handlers;
pub mod types;

pub use context::JobContext;
pub use dispatch::RedisLearningDispatcher;
pub use types::LearnFromFeedbackJob;
