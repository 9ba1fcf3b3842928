use std::collections::{BTreeSet, HashMap};

use crate::*;

/// Aggregates a unit factor over the units of a group. `None` when no unit
/// of the group is on the map.
pub fn group_factor(
    obs: &Observation,
    side: Side,
    types: &BTreeSet<u32>,
    factor: UnitFactor,
    op: AggregationOp,
    costs: &HashMap<u32, [f64; 2]>,
) -> Option<f64> {
    let values: Vec<f64> = obs
        .group_units(side, types)
        .map(|unit| factor.value(unit, costs))
        .collect();
    op.apply(&values)
}

#[derive(Debug, Clone)]
struct ResolvedForceFactor {
    config: ForceFactorConfig,
    friendly: GroupFilter,
    enemy: GroupFilter,
}

impl ResolvedForceFactor {
    fn labels(&self, infix: &str) -> Vec<String> {
        side_group_labels(
            &format!("{}{}_", self.config.name, infix),
            &self.friendly,
            &self.enemy,
        )
    }

    fn level(&self, value: f64) -> FeatureValue {
        self.config
            .levels
            .iter()
            .find(|level| value <= level.value)
            .map_or(FeatureValue::Undefined, |level| {
                FeatureValue::label(&level.name)
            })
    }

    fn normalized(&self, value: f64) -> f64 {
        let max = self.config.levels.last().map_or(1.0, |level| level.value);
        (value / max).min(1.0)
    }

    fn aggregates(&self, obs: &Observation, costs: &HashMap<u32, [f64; 2]>) -> Vec<Option<f64>> {
        let aggregate = |side: Side, types: &BTreeSet<u32>| {
            group_factor(obs, side, types, self.config.factor, self.config.op, costs)
        };
        self.friendly
            .iter()
            .map(|(_, types)| aggregate(Side::Friendly, types))
            .chain(
                self.enemy
                    .iter()
                    .map(|(_, types)| aggregate(Side::Enemy, types)),
            )
            .collect()
    }
}

/// Buckets, or normalizes, aggregated unit factors such as health or cost
/// for every group of both sides.
#[derive(Debug, Clone)]
pub struct ForceFactorsExtractor {
    output: OutputModes,
    factors: Vec<ResolvedForceFactor>,
    costs: HashMap<u32, [f64; 2]>,
}

impl ForceFactorsExtractor {
    pub fn new(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        let section = config.force_factors()?;
        let factors = section
            .factors
            .iter()
            .map(|factor| {
                Ok(ResolvedForceFactor {
                    friendly: config.resolve_filter(&factor.friendly_filter)?,
                    enemy: config.resolve_filter(&factor.enemy_filter)?,
                    config: factor.clone(),
                })
            })
            .collect::<FeatureExtractorResult<Vec<_>>>()?;
        Ok(Self {
            output: section.output,
            factors,
            costs: config.unit_costs_by_type()?,
        })
    }
}

impl FeatureExtractor for ForceFactorsExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(self.factors.iter().flat_map(|f| f.labels("Cat")));
        }
        if self.output.numeric {
            labels.extend(self.factors.iter().flat_map(|f| f.labels("")));
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            for factor in self.factors.iter() {
                let levels: Vec<&str> = factor
                    .config
                    .levels
                    .iter()
                    .map(|level| level.name.as_str())
                    .collect();
                descriptors.extend(
                    factor
                        .labels("Cat")
                        .into_iter()
                        .map(|label| FeatureDescriptor::categorical(label, &levels)),
                );
            }
        }
        if self.output.numeric {
            descriptors.extend(self.factors.iter().flat_map(|factor| {
                factor
                    .labels("")
                    .into_iter()
                    .map(|label| FeatureDescriptor::real(label, 0.0, 1.0))
            }));
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let aggregates: Vec<Vec<Option<f64>>> = self
            .factors
            .iter()
            .map(|factor| factor.aggregates(obs, &self.costs))
            .collect();

        if self.output.categorical {
            for (factor, values) in self.factors.iter().zip(aggregates.iter()) {
                row.extend(
                    values
                        .iter()
                        .map(|v| v.map_or(FeatureValue::Undefined, |v| factor.level(v))),
                );
            }
        }
        if self.output.numeric {
            for (factor, values) in self.factors.iter().zip(aggregates.iter()) {
                row.extend(
                    values
                        .iter()
                        .map(|v| FeatureValue::real_or_nan(v.map(|v| factor.normalized(v)))),
                );
            }
        }
    }
}
