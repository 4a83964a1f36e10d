//! Requirement aggregation for analyses
//!
//! An analysis declares, per type, the values it needs in order to run, each
//! with a [`PriorityLevel`]. Analyses built from sub-analyses merge the
//! requirements of their sub-analyses into their own, optionally capping how
//! important those inherited values may become.

pub mod domain;
pub use domain::{
    AnalysisGraph, Config, ConfigError, GraphError, LevelUpdatePolicy, ParseLevelError,
    PriorityLevel, RequirementCatalog, RequirementSet,
};
