//! Requirement sets and the merge algorithms used to compose them.

use std::collections::{HashMap, hash_map::Entry};

use crate::domain::{LevelUpdatePolicy, PriorityLevel};

/// All the values of one type that an analysis needs in order to run.
///
/// The type gives an indication of what the values describe. For instance, a
/// requirement of type `"event"` would hold the names of the events an
/// analysis handles. Each value is paired with a [`PriorityLevel`] stating
/// how important it is.
///
/// Values are unique. Adding a value never changes the level of a value that
/// is already present; use [`modify_value_level`](Self::modify_value_level)
/// for that.
///
/// ```
/// use analysis_requirements::{PriorityLevel, RequirementSet};
///
/// let mut events = RequirementSet::with_values(
///     "event",
///     ["sched_switch", "sched_wakeup"],
///     PriorityLevel::Mandatory,
/// );
///
/// let mut sub = RequirementSet::new("event");
/// sub.add_value("sched_switch", PriorityLevel::Optional);
/// sub.add_value("irq_handler_entry", PriorityLevel::Mandatory);
///
/// events.merge_capped(&sub, PriorityLevel::Optional);
///
/// assert_eq!(events.value_level("sched_switch"), Some(PriorityLevel::Mandatory));
/// assert_eq!(
///     events.value_level("irq_handler_entry"),
///     Some(PriorityLevel::Optional)
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSet {
    requirement_type: String,
    values: HashMap<String, PriorityLevel>,
    informations: Vec<String>,
}

impl RequirementSet {
    /// Creates an empty requirement set of the given type.
    #[must_use]
    pub fn new(requirement_type: impl Into<String>) -> Self {
        Self {
            requirement_type: requirement_type.into(),
            values: HashMap::new(),
            informations: Vec::new(),
        }
    }

    /// Creates a requirement set where every value shares the same level.
    ///
    /// Duplicate values collapse into a single entry.
    #[must_use]
    pub fn with_values<I, S>(
        requirement_type: impl Into<String>,
        values: I,
        level: PriorityLevel,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new(requirement_type);
        set.add_values(values, level);
        set
    }

    /// The type of the requirement. It is fixed at construction.
    #[must_use]
    pub fn requirement_type(&self) -> &str {
        &self.requirement_type
    }

    /// Adds a value with its level.
    ///
    /// Returns `true` if the value was inserted, or `false` if it was already
    /// present, in which case its level is left untouched.
    pub fn add_value(&mut self, value: impl Into<String>, level: PriorityLevel) -> bool {
        match self.values.entry(value.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(level);
                true
            }
        }
    }

    /// Adds every value with the same level.
    ///
    /// Values that are already present (or repeated in the input) are
    /// skipped.
    pub fn add_values<I, S>(&mut self, values: I, level: PriorityLevel)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.add_value(value, level);
        }
    }

    /// Replaces the level of a value that is already present.
    ///
    /// Returns `false` without inserting anything if the value is absent.
    /// Any level is accepted, including a weaker one; see
    /// [`modify_value_level_with`](Self::modify_value_level_with) for a
    /// restricted variant.
    pub fn modify_value_level(&mut self, value: &str, level: PriorityLevel) -> bool {
        self.modify_value_level_with(value, level, LevelUpdatePolicy::Unrestricted)
    }

    /// Replaces the level of a present value if `policy` permits the change.
    ///
    /// Returns `true` only if the stored level was updated.
    pub fn modify_value_level_with(
        &mut self,
        value: &str,
        level: PriorityLevel,
        policy: LevelUpdatePolicy,
    ) -> bool {
        let Some(current) = self.values.get_mut(value) else {
            return false;
        };
        if !policy.permits(*current, level) {
            tracing::debug!(
                "Refused to change '{value}' in '{}' from {current} to {level}",
                self.requirement_type
            );
            return false;
        }
        *current = level;
        true
    }

    /// The level of a value, or `None` if the value is absent.
    #[must_use]
    pub fn value_level(&self, value: &str) -> Option<PriorityLevel> {
        self.values.get(value).copied()
    }

    /// Whether the value is present.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains_key(value)
    }

    /// A snapshot of the values in the set, in no particular order.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Iterate over the values and their levels, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PriorityLevel)> {
        self.values
            .iter()
            .map(|(value, &level)| (value.as_str(), level))
    }

    /// The number of distinct values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Appends a note about the requirement.
    pub fn add_information(&mut self, information: impl Into<String>) {
        self.informations.push(information.into());
    }

    /// The notes about the requirement, in the order they were added.
    #[must_use]
    pub fn informations(&self) -> &[String] {
        &self.informations
    }

    pub(crate) fn extend_informations(&mut self, informations: &[String]) {
        self.informations.extend_from_slice(informations);
    }

    /// Merges the values of `source` into this set.
    ///
    /// New values keep the level stated by `source`. For values present on
    /// both sides, the stronger of the two levels is kept. `source` is not
    /// modified, and its informations are not copied.
    pub fn merge(&mut self, source: &Self) {
        for (value, level) in source.iter() {
            self.combine(value, level);
        }
    }

    /// Merges the values of `source` into this set, weakening any value
    /// stronger than `cap` down to `cap` first.
    ///
    /// This models a sub-analysis that matters to its parent only up to a
    /// certain level. With `cap` set to [`PriorityLevel::Mandatory`] it
    /// behaves exactly like [`merge`](Self::merge).
    pub fn merge_capped(&mut self, source: &Self, cap: PriorityLevel) {
        for (value, level) in source.iter() {
            self.combine(value, level.capped_at(cap));
        }
    }

    fn combine(&mut self, value: &str, level: PriorityLevel) {
        if let Some(current) = self.values.get_mut(value) {
            let merged = current.stronger(level);
            if merged != *current {
                tracing::trace!(
                    "'{value}' in '{}' strengthened from {current} to {merged}",
                    self.requirement_type
                );
                *current = merged;
            }
        } else {
            tracing::trace!("'{value}' added to '{}' as {level}", self.requirement_type);
            self.values.insert(value.to_string(), level);
        }
    }
}
