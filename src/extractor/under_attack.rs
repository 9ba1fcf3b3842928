use std::collections::{BTreeSet, HashMap};

use crate::*;

/// Detects groups losing health between consecutive observations.
#[derive(Debug, Clone)]
pub struct UnderAttackExtractor {
    output: OutputModes,
    friendly: GroupFilter,
    enemy: GroupFilter,
    first_observation: bool,
    /// Summed health of each group at the previous observation, friendly
    /// groups first. `None` when the group had no units.
    previous_health: Vec<Option<f64>>,
}

impl UnderAttackExtractor {
    pub fn new(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        let section = config.under_attack()?;
        let mut extractor = Self {
            output: section.output,
            friendly: config.resolve_filter(&section.friendly_filter)?,
            enemy: config.resolve_filter(&section.enemy_filter)?,
            first_observation: true,
            previous_health: Vec::new(),
        };
        extractor.reset();
        Ok(extractor)
    }

    fn labels(&self, numeric: bool) -> Vec<String> {
        if numeric {
            side_group_labels("HealthDiff_", &self.friendly, &self.enemy)
        } else {
            self.friendly
                .labels()
                .map(|g| format!("Attacking_{}_Red_{}", ENEMY_LABEL, g))
                .chain(
                    self.enemy
                        .labels()
                        .map(|g| format!("Attacking_{}_Blue_{}", FRIENDLY_LABEL, g)),
                )
                .collect()
        }
    }
}

fn group_health(obs: &Observation, side: Side, types: &BTreeSet<u32>) -> Option<f64> {
    group_factor(
        obs,
        side,
        types,
        UnitFactor::Health,
        AggregationOp::Sum,
        &HashMap::new(),
    )
}

impl FeatureExtractor for UnderAttackExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(self.labels(false));
        }
        if self.output.numeric {
            labels.extend(self.labels(true));
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            descriptors.extend(
                self.labels(false)
                    .into_iter()
                    .map(FeatureDescriptor::boolean),
            );
        }
        if self.output.numeric {
            descriptors.extend(
                self.labels(true)
                    .into_iter()
                    .map(|label| FeatureDescriptor::real(label, f64::MIN, f64::MAX)),
            );
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let health: Vec<Option<f64>> = self
            .friendly
            .iter()
            .map(|(_, types)| group_health(obs, Side::Friendly, types))
            .chain(
                self.enemy
                    .iter()
                    .map(|(_, types)| group_health(obs, Side::Enemy, types)),
            )
            .collect();
        let changes: Vec<Option<(f64, f64)>> = health
            .iter()
            .zip(self.previous_health.iter())
            .map(|(now, before)| now.zip(*before))
            .collect();

        if self.output.categorical {
            row.extend(changes.iter().map(|change| match change {
                None => FeatureValue::Undefined,
                Some((now, before)) => FeatureValue::Bool(!self.first_observation && now < before),
            }));
        }
        if self.output.numeric {
            row.extend(changes.iter().map(|change| match change {
                None => FeatureValue::nan(),
                Some(_) if self.first_observation => FeatureValue::Real(0.0),
                Some((now, before)) => FeatureValue::Real(now - before),
            }));
        }

        self.previous_health = health;
        self.first_observation = false;
    }

    fn reset(&mut self) {
        self.first_observation = true;
        self.previous_health = vec![Some(0.0); self.friendly.len() + self.enemy.len()];
    }
}
