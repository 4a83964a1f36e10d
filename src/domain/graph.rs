//! A hierarchy of analyses and the sub-analyses they are built from.
//!
//! The [`AnalysisGraph`] stores the requirements each analysis declares for
//! itself, and the links to the sub-analyses it depends on. Aggregating an
//! analysis folds the requirements of its whole sub-tree into its own,
//! applying the cap of every link along the way.

use std::collections::HashMap;

use petgraph::{
    Direction,
    algo::has_path_connecting,
    graph::{DiGraph, NodeIndex},
    visit::{DfsPostOrder, EdgeRef},
};
use tracing::instrument;

use crate::domain::{Config, PriorityLevel, RequirementCatalog};

/// Errors raised when building or querying an [`AnalysisGraph`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    /// No analysis with this name exists in the graph.
    #[error("Analysis '{0}' not found")]
    UnknownAnalysis(String),

    /// An analysis with this name already exists in the graph.
    #[error("Analysis '{0}' already exists")]
    DuplicateAnalysis(String),

    /// Linking the two analyses would make an analysis depend on itself.
    #[error("Adding '{child}' as a sub-analysis of '{parent}' would create a cycle")]
    WouldCreateCycle {
        /// The analysis that would gain a sub-analysis.
        parent: String,
        /// The analysis that would become a sub-analysis.
        child: String,
    },
}

#[derive(Debug, Clone)]
struct Analysis {
    name: String,
    requirements: RequirementCatalog,
}

/// Analyses and their sub-analyses.
///
/// Nodes are analyses, identified by a unique name. Edges point from an
/// analysis to one of its sub-analyses and carry an optional cap; links
/// without a cap use [`Config::default_cap`].
///
/// ```
/// use analysis_requirements::{AnalysisGraph, PriorityLevel, RequirementCatalog, RequirementSet};
///
/// let mut graph = AnalysisGraph::default();
///
/// let own: RequirementCatalog =
///     [RequirementSet::with_values("event", ["sched_switch"], PriorityLevel::Mandatory)]
///         .into_iter()
///         .collect();
/// graph.add_analysis("cpu-usage", own).unwrap();
///
/// let sub: RequirementCatalog =
///     [RequirementSet::with_values("event", ["sched_process_fork"], PriorityLevel::Mandatory)]
///         .into_iter()
///         .collect();
/// graph.add_analysis("process-tree", sub).unwrap();
///
/// graph
///     .add_sub_analysis("cpu-usage", "process-tree", Some(PriorityLevel::Optional))
///     .unwrap();
///
/// let aggregate = graph.aggregate("cpu-usage").unwrap();
/// let events = aggregate.get("event").unwrap();
/// assert_eq!(events.value_level("sched_switch"), Some(PriorityLevel::Mandatory));
/// assert_eq!(
///     events.value_level("sched_process_fork"),
///     Some(PriorityLevel::Optional)
/// );
/// ```
#[derive(Debug, Default)]
pub struct AnalysisGraph {
    config: Config,

    /// Edges point from an analysis to its sub-analyses.
    graph: DiGraph<Analysis, Option<PriorityLevel>>,

    /// Lookup from analysis name to node.
    index: HashMap<String, NodeIndex>,
}

impl AnalysisGraph {
    /// Creates an empty graph with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with the given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Adds an analysis along with the requirements it declares for itself.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateAnalysis`] if an analysis with the same
    /// name already exists.
    pub fn add_analysis(
        &mut self,
        name: impl Into<String>,
        requirements: RequirementCatalog,
    ) -> Result<(), GraphError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(GraphError::DuplicateAnalysis(name));
        }

        tracing::debug!(
            "Added analysis '{name}' with {} requirement type(s)",
            requirements.len()
        );
        let node = self.graph.add_node(Analysis {
            name: name.clone(),
            requirements,
        });
        self.index.insert(name, node);
        Ok(())
    }

    /// The names of all analyses, in insertion order.
    pub fn analyses(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|analysis| analysis.name.as_str())
    }

    /// The requirements an analysis declares for itself.
    ///
    /// These do not include the requirements of its sub-analyses; see
    /// [`aggregate`](Self::aggregate).
    #[must_use]
    pub fn requirements(&self, name: &str) -> Option<&RequirementCatalog> {
        self.index
            .get(name)
            .map(|&node| &self.graph[node].requirements)
    }

    /// Mutable access to the requirements an analysis declares for itself.
    pub fn requirements_mut(&mut self, name: &str) -> Option<&mut RequirementCatalog> {
        let node = *self.index.get(name)?;
        Some(&mut self.graph[node].requirements)
    }

    /// Changes the level of a value declared by an analysis, subject to the
    /// configured [`LevelUpdatePolicy`](crate::domain::LevelUpdatePolicy).
    ///
    /// Returns `Ok(false)` if the type or value is absent, or if the policy
    /// refuses the change.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownAnalysis`] if the analysis does not exist.
    pub fn modify_value_level(
        &mut self,
        name: &str,
        requirement_type: &str,
        value: &str,
        level: PriorityLevel,
    ) -> Result<bool, GraphError> {
        let policy = self.config.level_updates;
        let requirements = self
            .requirements_mut(name)
            .ok_or_else(|| GraphError::UnknownAnalysis(name.to_string()))?;

        Ok(requirements
            .get_mut(requirement_type)
            .is_some_and(|set| set.modify_value_level_with(value, level, policy)))
    }

    /// Declares `child` as a sub-analysis of `parent`.
    ///
    /// Requirements of `child` reach `parent` no stronger than `cap` (or the
    /// configured default cap when `cap` is `None`). Linking the same pair
    /// again replaces the cap.
    ///
    /// # Errors
    ///
    /// Returns an error if either analysis does not exist, or if `child`
    /// already depends (directly or not) on `parent`.
    #[instrument(skip(self))]
    pub fn add_sub_analysis(
        &mut self,
        parent: &str,
        child: &str,
        cap: Option<PriorityLevel>,
    ) -> Result<(), GraphError> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;

        if has_path_connecting(&self.graph, child_node, parent_node, None) {
            return Err(GraphError::WouldCreateCycle {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        self.graph.update_edge(parent_node, child_node, cap);
        tracing::debug!("Linked '{child}' as a sub-analysis of '{parent}'");
        Ok(())
    }

    /// Removes `child` from the sub-analyses of `parent`.
    ///
    /// Returns `true` if the link existed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownAnalysis`] if either analysis does not
    /// exist.
    #[instrument(skip(self))]
    pub fn remove_sub_analysis(&mut self, parent: &str, child: &str) -> Result<bool, GraphError> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;

        Ok(self
            .graph
            .find_edge(parent_node, child_node)
            .and_then(|edge| self.graph.remove_edge(edge))
            .is_some())
    }

    /// The direct sub-analyses of an analysis with the cap applied to each,
    /// ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownAnalysis`] if the analysis does not exist.
    pub fn sub_analyses(&self, name: &str) -> Result<Vec<(&str, PriorityLevel)>, GraphError> {
        let node = self.node(name)?;
        let mut children: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| {
                (
                    self.graph[edge.target()].name.as_str(),
                    self.config.effective_cap(*edge.weight()),
                )
            })
            .collect();
        children.sort_unstable();
        Ok(children)
    }

    /// The requirements of an analysis merged with those of all its
    /// sub-analyses.
    ///
    /// Sub-analyses are aggregated first, then merged into their parent with
    /// the cap of the link. A requirement therefore reaches the analysis no
    /// stronger than the weakest cap on its path; when it is reachable through
    /// several paths, the strongest result wins.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownAnalysis`] if the analysis does not exist.
    #[instrument(skip(self))]
    pub fn aggregate(&self, name: &str) -> Result<RequirementCatalog, GraphError> {
        let root = self.node(name)?;
        let mut aggregates: HashMap<NodeIndex, RequirementCatalog> = HashMap::new();

        // Post-order visits every sub-analysis before the analyses using it.
        let mut dfs = DfsPostOrder::new(&self.graph, root);
        while let Some(node) = dfs.next(&self.graph) {
            let mut catalog = self.graph[node].requirements.clone();
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                if let Some(sub) = aggregates.get(&edge.target()) {
                    catalog.merge_capped(sub, self.config.effective_cap(*edge.weight()));
                }
            }
            aggregates.insert(node, catalog);
        }

        let aggregate = aggregates.remove(&root).unwrap_or_default();
        tracing::debug!(
            "Aggregated '{name}' from {} analyses into {} requirement type(s)",
            aggregates.len() + 1,
            aggregate.len()
        );
        Ok(aggregate)
    }

    fn node(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownAnalysis(name.to_string()))
    }
}
