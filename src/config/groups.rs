use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::*;

/// Maps unit-type references used in configuration documents to the
/// numeric ids the engine reports.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    by_name: HashMap<String, u32>,
}

impl UnitRegistry {
    pub fn new(extra: &BTreeMap<String, u32>) -> Self {
        let by_name = SC2_UNIT_TYPES
            .iter()
            .map(|(name, id)| (name.to_string(), *id))
            .chain(extra.iter().map(|(name, id)| (name.clone(), *id)))
            .collect();
        Self { by_name }
    }

    pub fn id_for(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Resolves a single unit-type reference into its label and id. A
    /// reference is either a known name, qualified (`Terran.Marine`) or
    /// declared in the configuration, or a literal numeric id. The label of
    /// a named type drops the race qualifier.
    pub fn resolve(&self, reference: &str) -> FeatureExtractorResult<(String, u32)> {
        let reference = reference.trim();
        if let Some(id) = self.id_for(reference) {
            let label = reference
                .rsplit_once('.')
                .map_or(reference, |(_, name)| name);
            return Ok((label.to_string(), id));
        }
        if let Ok(id) = reference.parse::<u32>() {
            return Ok((reference.to_string(), id));
        }
        if reference.contains('.') {
            FeatureExtractorError::new_result(FeatureExtractorErrorVariant::UnknownUnitType {
                reference: reference.to_string(),
            })
        } else {
            FeatureExtractorError::new_result(FeatureExtractorErrorVariant::UnknownUnitGroup {
                name: reference.to_string(),
            })
        }
    }
}

/// An ordered mapping from group labels to the unit types they contain. The
/// order of the groups is the order of the references the filter was
/// resolved from, and fixes the order of the feature columns built on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupFilter {
    groups: Vec<(String, BTreeSet<u32>)>,
}

impl GroupFilter {
    /// Resolves a list of references against the configuration's `groups`
    /// table. Each reference is a group name, a unit-type reference, or
    /// [`ALL_UNITS_GROUP`], which stands for the union of every other entry.
    /// Groups may only contain unit types, never other groups.
    pub fn resolve(
        config: &FeatureExtractorConfig,
        refs: &[String],
    ) -> FeatureExtractorResult<Self> {
        let registry = config.unit_registry();
        let mut groups: Vec<(String, BTreeSet<u32>)> = Vec::with_capacity(refs.len());
        for reference in refs.iter() {
            let reference = reference.trim();
            if reference == ALL_UNITS_GROUP {
                groups.push((ALL_UNITS_GROUP.to_string(), BTreeSet::new()));
            } else if let Some(members) = config.groups.get(reference) {
                groups.push((
                    reference.to_string(),
                    resolve_group(config, &registry, reference, members)?,
                ));
            } else {
                let (label, id) = registry.resolve(reference)?;
                groups.push((label, BTreeSet::from([id])));
            }
        }

        let all: BTreeSet<u32> = groups
            .iter()
            .filter(|(label, _)| label != ALL_UNITS_GROUP)
            .flat_map(|(_, types)| types.iter().copied())
            .collect();
        for (label, types) in groups.iter_mut() {
            if label == ALL_UNITS_GROUP {
                *types = all.clone();
            }
        }
        Ok(Self { groups })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<u32>)> {
        self.groups
            .iter()
            .map(|(label, types)| (label.as_str(), types))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(label, _)| label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&BTreeSet<u32>> {
        self.groups
            .iter()
            .find(|(group, _)| group == label)
            .map(|(_, types)| types)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every `(self group, other group)` label combination, with this
    /// filter's groups varying slowest.
    pub fn product<'a>(&'a self, other: &'a GroupFilter) -> Vec<(&'a str, &'a str)> {
        self.labels()
            .flat_map(|a| other.labels().map(move |b| (a, b)))
            .collect()
    }

    /// Sum of the per-type maxima of every type in each group, in group
    /// order.
    pub fn max_counts(&self, max_units: &HashMap<u32, u32>) -> Vec<i64> {
        self.groups
            .iter()
            .map(|(_, types)| {
                types
                    .iter()
                    .map(|t| max_units.get(t).copied().unwrap_or(0) as i64)
                    .sum()
            })
            .collect()
    }
}

fn resolve_group(
    config: &FeatureExtractorConfig,
    registry: &UnitRegistry,
    group: &str,
    members: &[String],
) -> FeatureExtractorResult<BTreeSet<u32>> {
    if members.is_empty() {
        return FeatureExtractorError::new_result(FeatureExtractorErrorVariant::EmptyGroup {
            group: group.to_string(),
        });
    }
    members
        .iter()
        .map(|member| {
            let member = member.trim();
            if config.groups.contains_key(member) || member == ALL_UNITS_GROUP {
                FeatureExtractorError::new_result(
                    FeatureExtractorErrorVariant::NestedGroupReference {
                        group: group.to_string(),
                        member: member.to_string(),
                    },
                )
            } else {
                Ok(registry.resolve(member)?.1)
            }
        })
        .collect()
}
