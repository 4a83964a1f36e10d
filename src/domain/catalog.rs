use std::collections::{BTreeMap, btree_map::Entry};

use crate::domain::{PriorityLevel, RequirementSet};

/// All the requirement sets declared by one analysis, keyed by type.
///
/// Iteration is ordered by type name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequirementCatalog {
    sets: BTreeMap<String, RequirementSet>,
}

impl RequirementCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a requirement set to the catalog.
    ///
    /// If a set of the same type is already present, the values of `set` are
    /// merged into it (stronger level wins) and its informations are
    /// appended.
    pub fn insert(&mut self, set: RequirementSet) {
        match self.sets.entry(set.requirement_type().to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(set);
            }
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.merge(&set);
                existing.extend_informations(set.informations());
            }
        }
    }

    /// The requirement set of the given type, if any.
    #[must_use]
    pub fn get(&self, requirement_type: &str) -> Option<&RequirementSet> {
        self.sets.get(requirement_type)
    }

    /// Mutable access to the requirement set of the given type, if any.
    pub fn get_mut(&mut self, requirement_type: &str) -> Option<&mut RequirementSet> {
        self.sets.get_mut(requirement_type)
    }

    /// The requirement set of the given type, created empty if missing.
    pub fn entry(&mut self, requirement_type: &str) -> &mut RequirementSet {
        self.sets
            .entry(requirement_type.to_string())
            .or_insert_with(|| RequirementSet::new(requirement_type))
    }

    /// Whether the catalog holds a set of the given type.
    #[must_use]
    pub fn contains_type(&self, requirement_type: &str) -> bool {
        self.sets.contains_key(requirement_type)
    }

    /// The requirement types in the catalog, in order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    /// Iterate over the requirement sets, ordered by type.
    pub fn iter(&self) -> impl Iterator<Item = &RequirementSet> {
        self.sets.values()
    }

    /// The number of requirement types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Merges every set of `source` into the set of the same type.
    ///
    /// See [`RequirementSet::merge`].
    pub fn merge(&mut self, source: &Self) {
        for set in source.iter() {
            self.entry(set.requirement_type()).merge(set);
        }
    }

    /// Merges every set of `source` into the set of the same type, capping
    /// the contributed levels at `cap`.
    ///
    /// See [`RequirementSet::merge_capped`].
    pub fn merge_capped(&mut self, source: &Self, cap: PriorityLevel) {
        for set in source.iter() {
            self.entry(set.requirement_type()).merge_capped(set, cap);
        }
    }
}

impl FromIterator<RequirementSet> for RequirementCatalog {
    fn from_iter<T: IntoIterator<Item = RequirementSet>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for set in iter {
            catalog.insert(set);
        }
        catalog
    }
}

impl Extend<RequirementSet> for RequirementCatalog {
    fn extend<T: IntoIterator<Item = RequirementSet>>(&mut self, iter: T) {
        for set in iter {
            self.insert(set);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RequirementCatalog;
    use crate::domain::{
        PriorityLevel::{Informative, Mandatory, Optional},
        RequirementSet,
    };

    fn catalog() -> RequirementCatalog {
        [
            RequirementSet::with_values("event", ["sched_switch", "sched_wakeup"], Mandatory),
            RequirementSet::with_values("domain", ["kernel"], Mandatory),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn types_are_ordered() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.types().collect::<Vec<_>>(), ["domain", "event"]);
    }

    #[test]
    fn insert_same_type_merges() {
        let mut catalog = catalog();

        let mut extra = RequirementSet::new("event");
        extra.add_value("sched_switch", Informative);
        extra.add_value("irq_handler_entry", Optional);
        extra.add_information("irq events improve accuracy");
        catalog.insert(extra);

        let events = catalog.get("event").unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(events.len(), 3);
        assert_eq!(events.value_level("sched_switch"), Some(Mandatory));
        assert_eq!(events.value_level("irq_handler_entry"), Some(Optional));
        assert_eq!(events.informations(), ["irq events improve accuracy"]);
    }

    #[test]
    fn entry_creates_missing_type() {
        let mut catalog = RequirementCatalog::new();
        assert!(!catalog.contains_type("event"));

        catalog.entry("event").add_value("sched_switch", Optional);
        catalog.entry("event").add_value("sched_switch", Mandatory);

        assert!(catalog.contains_type("event"));
        assert_eq!(
            catalog.get("event").unwrap().value_level("sched_switch"),
            Some(Optional)
        );
    }

    #[test]
    fn get_mut_does_not_create() {
        let mut catalog = RequirementCatalog::new();
        assert!(catalog.get_mut("event").is_none());
        assert!(catalog.is_empty());
    }

    #[test]
    fn merge_capped_applies_per_type() {
        let mut aggregate = RequirementCatalog::new();
        aggregate.entry("event").add_value("sched_switch", Optional);

        aggregate.merge_capped(&catalog(), Optional);

        let events = aggregate.get("event").unwrap();
        assert_eq!(events.value_level("sched_switch"), Some(Optional));
        assert_eq!(events.value_level("sched_wakeup"), Some(Optional));
        assert_eq!(
            aggregate.get("domain").unwrap().value_level("kernel"),
            Some(Optional)
        );
    }

    #[test]
    fn merge_without_cap_keeps_levels() {
        let mut aggregate = RequirementCatalog::new();
        aggregate.entry("domain").add_value("kernel", Informative);

        aggregate.merge(&catalog());

        assert_eq!(
            aggregate.get("domain").unwrap().value_level("kernel"),
            Some(Mandatory)
        );
        assert_eq!(aggregate.get("event").unwrap().len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut aggregate = RequirementCatalog::new();
        aggregate.merge_capped(&catalog(), Optional);
        let once = aggregate.clone();
        aggregate.merge_capped(&catalog(), Optional);
        assert_eq!(aggregate, once);
    }

    #[test]
    fn merge_does_not_copy_informations() {
        let mut source = catalog();
        source.entry("event").add_information("from sub-analysis");

        let mut aggregate = RequirementCatalog::new();
        aggregate.merge(&source);

        assert!(aggregate.get("event").unwrap().informations().is_empty());
    }
}
