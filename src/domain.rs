//! Domain models for requirement aggregation.
//!
//! This module contains the priority levels, requirement sets and their merge
//! algorithms, per-analysis catalogs, the analysis hierarchy and the
//! aggregation configuration.

mod level;
pub use level::{ParseLevelError, PriorityLevel};

pub mod requirement_set;
pub use requirement_set::RequirementSet;

mod catalog;
pub use catalog::RequirementCatalog;

mod config;
pub use config::{Config, ConfigError, LevelUpdatePolicy};

pub mod graph;
pub use graph::{AnalysisGraph, GraphError};
