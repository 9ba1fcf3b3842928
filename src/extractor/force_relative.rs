use std::collections::{BTreeSet, HashMap};

use crate::*;

/// Outcome of comparing a friendly force to an enemy force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceBalance {
    Advantage,
    Disadvantage,
    Balanced,
}

/// Classifies the friendly/enemy factor ratio against `threshold`: below it
/// the friendly force is at a disadvantage, and when the inverse ratio is
/// below it the friendly force has the advantage. A zero enemy factor sits
/// on the advantage boundary and counts as balanced.
pub fn force_balance(friendly: f64, enemy: f64, threshold: f64) -> ForceBalance {
    if enemy == 0.0 {
        return ForceBalance::Balanced;
    }
    let ratio = friendly / enemy;
    if ratio < threshold {
        ForceBalance::Disadvantage
    } else if 1.0 / ratio < threshold {
        ForceBalance::Advantage
    } else {
        ForceBalance::Balanced
    }
}

/// Signed comparison in `[-1, 1]`: positive when the friendly force is
/// larger, negative when the enemy force is, zero when they are equal.
pub fn relative_force(friendly: f64, enemy: f64) -> f64 {
    if friendly == enemy {
        0.0
    } else if friendly > enemy {
        1.0 - enemy / friendly
    } else {
        -1.0 + friendly / enemy
    }
}

#[derive(Debug, Clone)]
struct ResolvedRelativeFactor {
    config: ForceRelativeFactorConfig,
    friendly: GroupFilter,
    enemy: GroupFilter,
    pairs: Vec<(String, String)>,
}

impl ResolvedRelativeFactor {
    fn labels(&self, suffix: &str) -> Vec<String> {
        pair_labels(
            &format!("Relative{}{}", self.config.name, suffix),
            &self.pairs,
        )
    }

    fn balance_label(&self, balance: ForceBalance) -> &str {
        match balance {
            ForceBalance::Advantage => &self.config.advantage,
            ForceBalance::Disadvantage => &self.config.disadvantage,
            ForceBalance::Balanced => &self.config.balanced,
        }
    }

    /// Summed factor of every (friendly group, enemy group) pair.
    fn sums(
        &self,
        obs: &Observation,
        costs: &HashMap<u32, [f64; 2]>,
    ) -> Vec<Option<(f64, f64)>> {
        let sum = |side: Side, types: &BTreeSet<u32>| {
            group_factor(obs, side, types, self.config.factor, AggregationOp::Sum, costs)
        };
        let friendly: Vec<Option<f64>> = self
            .friendly
            .iter()
            .map(|(_, types)| sum(Side::Friendly, types))
            .collect();
        let enemy: Vec<Option<f64>> = self
            .enemy
            .iter()
            .map(|(_, types)| sum(Side::Enemy, types))
            .collect();
        friendly
            .iter()
            .flat_map(|f| enemy.iter().map(move |e| f.zip(*e)))
            .collect()
    }
}

/// Compares aggregated unit factors of friendly and enemy groups pairwise.
#[derive(Debug, Clone)]
pub struct ForceRelativeFactorsExtractor {
    output: OutputModes,
    factors: Vec<ResolvedRelativeFactor>,
    costs: HashMap<u32, [f64; 2]>,
}

impl ForceRelativeFactorsExtractor {
    pub fn new(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        let section = config.force_relative_factors()?;
        let factors = section
            .factors
            .iter()
            .map(|factor| {
                let friendly = config.resolve_filter(&factor.friendly_filter)?;
                let enemy = config.resolve_filter(&factor.enemy_filter)?;
                Ok(ResolvedRelativeFactor {
                    pairs: owned_product(&friendly, &enemy),
                    friendly,
                    enemy,
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

impl FeatureExtractor for ForceRelativeFactorsExtractor {
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
                let values = [
                    factor.config.advantage.as_str(),
                    factor.config.disadvantage.as_str(),
                    factor.config.balanced.as_str(),
                ];
                descriptors.extend(
                    factor
                        .labels("Cat")
                        .into_iter()
                        .map(|label| FeatureDescriptor::categorical(label, &values)),
                );
            }
        }
        if self.output.numeric {
            descriptors.extend(self.factors.iter().flat_map(|factor| {
                factor
                    .labels("")
                    .into_iter()
                    .map(|label| FeatureDescriptor::real(label, -1.0, 1.0))
            }));
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let sums: Vec<Vec<Option<(f64, f64)>>> = self
            .factors
            .iter()
            .map(|factor| factor.sums(obs, &self.costs))
            .collect();

        if self.output.categorical {
            for (factor, pairs) in self.factors.iter().zip(sums.iter()) {
                row.extend(pairs.iter().map(|pair| match pair {
                    None => FeatureValue::Undefined,
                    Some((f, e)) => FeatureValue::label(
                        factor.balance_label(force_balance(*f, *e, factor.config.ratio)),
                    ),
                }));
            }
        }
        if self.output.numeric {
            for pairs in sums.iter() {
                row.extend(
                    pairs
                        .iter()
                        .map(|pair| FeatureValue::real_or_nan(pair.map(|(f, e)| relative_force(f, e)))),
                );
            }
        }
    }
}
