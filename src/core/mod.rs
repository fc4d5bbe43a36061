//! Core domain models for hiring pipelines
//!
//! This module defines pipelines, stages, candidate application records,
//! template configuration and the error taxonomy shared by the engines.

pub mod candidate;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stage;
pub mod templates;

pub use candidate::*;
pub use error::*;
pub use pipeline::*;
pub use stage::*;
