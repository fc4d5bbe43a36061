//! Drag-and-drop reassignment of candidates between stages

pub mod coordinator;
pub mod state;

pub use coordinator::{DragCoordinator, DragEventHandler};
pub use state::{DragEvent, DragState, DropOutcome, PendingCommit};
