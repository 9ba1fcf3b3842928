use std::collections::HashSet;

use crate::*;

/// Detects the presence of friendly and enemy unit groups, and counts their
/// units.
#[derive(Debug, Clone)]
pub struct UnitGroupExtractor {
    output: OutputModes,
    friendly: GroupFilter,
    enemy: GroupFilter,
    max_friendly: Vec<i64>,
    max_enemy: Vec<i64>,
}

impl UnitGroupExtractor {
    pub fn new(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        let section = config.unit_group()?;
        let friendly = config.resolve_filter(&section.friendly_filter)?;
        let enemy = config.resolve_filter(&section.enemy_filter)?;
        let max_friendly = friendly.max_counts(&config.max_units_by_type(Side::Friendly)?);
        let max_enemy = enemy.max_counts(&config.max_units_by_type(Side::Enemy)?);
        Ok(Self {
            output: section.output,
            friendly,
            enemy,
            max_friendly,
            max_enemy,
        })
    }

    fn filter(&self, side: Side) -> &GroupFilter {
        match side {
            Side::Friendly => &self.friendly,
            Side::Enemy => &self.enemy,
        }
    }
}

impl FeatureExtractor for UnitGroupExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(side_group_labels("Present_", &self.friendly, &self.enemy));
        }
        if self.output.numeric {
            labels.extend(side_group_labels("Number_", &self.friendly, &self.enemy));
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            descriptors.extend(
                side_group_labels("Present_", &self.friendly, &self.enemy)
                    .into_iter()
                    .map(FeatureDescriptor::boolean),
            );
        }
        if self.output.numeric {
            let maxima = self.max_friendly.iter().chain(self.max_enemy.iter());
            descriptors.extend(
                side_group_labels("Number_", &self.friendly, &self.enemy)
                    .into_iter()
                    .zip(maxima)
                    .map(|(label, max)| FeatureDescriptor::integer(label, 0, *max)),
            );
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        if self.output.categorical {
            for side in [Side::Friendly, Side::Enemy] {
                let present: HashSet<u32> = obs.units_of(side).map(|u| u.unit_type).collect();
                row.extend(self.filter(side).iter().map(|(_, types)| {
                    FeatureValue::Bool(types.iter().any(|t| present.contains(t)))
                }));
            }
        }
        if self.output.numeric {
            for side in [Side::Friendly, Side::Enemy] {
                row.extend(self.filter(side).iter().map(|(_, types)| {
                    FeatureValue::Int(obs.group_units(side, types).count() as i64)
                }));
            }
        }
    }
}
