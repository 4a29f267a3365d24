//! Training infrastructure for segmentation models.
//!
//! This module holds the per-compound analyses, the batch trainer that
//! re-analyses them, and the frequency queue used for reports.

pub mod queue;
pub mod state;
pub mod trainer;

pub use queue::{most_common, FrequencyQueue};
pub use state::{Analysis, SegmentationState};
pub use trainer::{
    BatchTrainer, StopReason, TrainingAlgorithm, TrainingConfig, TrainingConfigBuilder,
    TrainingReport, DEFAULT_FINISH_THRESHOLD,
};
