//! Feedback-driven learning of persona, platform and format weights.

pub mod adjustment;
pub mod aggregation;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod merge;
pub mod scoring;
pub mod service;
pub mod tracker;
pub mod verticals;

pub use adjustment::{
    adjust_recommendation, LearningData, RecommendationAdjustment, RecommendationRequest,
    VerticalInsight,
};
pub use config::LearningConfig;
pub use dispatch::{DispatchError, InProcessLearningQueue, LearningDispatcher, LearningTrigger};
pub use engine::{LearningOutcome, LearningSummary, LearningWeightsEngine};
pub use merge::{merge_weights, WeightsAnalysis};
pub use service::{LearningError, LearningRunReport, LearningService};
pub use tracker::{RunRecord, RunStatus, RunTracker};
