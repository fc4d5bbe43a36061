//! hiring-pipeline - A kanban-style recruiting pipeline engine

pub mod board;
pub mod builder;
pub mod cli;
pub mod core;
pub mod drag;
pub mod grouping;
pub mod layout;
pub mod persistence;

// Re-export commonly used types
pub use board::PipelineBoard;
pub use builder::{SavedPipeline, StageBuilder, StageReassignment};
pub use core::{Candidate, CandidateSnapshot, Pipeline, PipelineError, Stage, StagePatch, StoreError};
pub use drag::{DragCoordinator, DragEvent, DragState, DropOutcome, PendingCommit};
pub use grouping::{group_candidates, GroupingCache, StageGrouping};
pub use layout::{ColumnLayout, LayoutConstants, LayoutEngine, LayoutTrigger, WidthProvider};
pub use persistence::{CandidateStore, InMemoryCandidateStore, InMemoryPipelineStore, PipelinePersistence};
