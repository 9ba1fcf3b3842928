use glam::DVec2;

use crate::*;

/// Detects whether enemy "barrier" units stand between friendly and enemy
/// units, for every (barrier group, friendly group, enemy group) triple.
#[derive(Debug, Clone)]
pub struct BetweenExtractor {
    output: OutputModes,
    friendly: GroupFilter,
    enemy: GroupFilter,
    barrier: GroupFilter,
    units_ratio: f64,
    angle_threshold: f64,
}

/// How many (friendly unit, enemy unit) pairs have a barrier unit on the
/// path between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedPairs {
    pub blocked: usize,
    pub total: usize,
    pub required: usize,
}

impl BlockedPairs {
    pub fn is_between(&self) -> bool {
        self.blocked >= self.required
    }

    pub fn ratio(&self) -> f64 {
        self.blocked as f64 / self.total as f64
    }
}

impl BetweenExtractor {
    pub fn new(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        let section = config.between()?;
        Ok(Self {
            output: section.output,
            friendly: config.resolve_filter(&section.friendly_filter)?,
            enemy: config.resolve_filter(&section.enemy_filter)?,
            barrier: config.resolve_filter(&section.barrier_filter)?,
            units_ratio: section.between_units_ratio,
            angle_threshold: section.barrier_angle_threshold,
        })
    }

    fn triples(&self) -> Vec<(&str, &str, &str)> {
        self.barrier
            .labels()
            .flat_map(|b| {
                self.friendly
                    .product(&self.enemy)
                    .into_iter()
                    .map(move |(f, e)| (b, f, e))
            })
            .collect()
    }

    fn labels(&self, prefix: &str) -> Vec<String> {
        self.triples()
            .into_iter()
            .map(|(b, f, e)| format!("{}_{}_{}_{}", prefix, b, f, e))
            .collect()
    }

    /// Counts the blocked pairs between `friendly` and `enemy` locations.
    /// Barrier locations coinciding with an enemy unit are ignored. `None`
    /// when any of the groups, or the remaining barriers, is empty. With
    /// `stop_early` the count stops as soon as the outcome of
    /// [`BlockedPairs::is_between`] is settled.
    pub fn count_blocked_pairs(
        &self,
        barrier: &[DVec2],
        friendly: &[DVec2],
        enemy: &[DVec2],
        stop_early: bool,
    ) -> Option<BlockedPairs> {
        if barrier.is_empty() || friendly.is_empty() || enemy.is_empty() {
            return None;
        }
        let barrier: Vec<DVec2> = barrier
            .iter()
            .filter(|b| !enemy.contains(b))
            .copied()
            .collect();
        if barrier.is_empty() {
            return None;
        }

        let total = friendly.len() * enemy.len();
        let required = (total as f64 * self.units_ratio).floor() as usize;
        let mut blocked = 0;
        let mut unchecked = total;
        'pairs: for f in friendly.iter() {
            for e in enemy.iter() {
                if barrier
                    .iter()
                    .any(|b| is_on_path(*b, *f, *e, self.angle_threshold))
                {
                    blocked += 1;
                }
                unchecked -= 1;
                if stop_early && (blocked >= required || blocked + unchecked < required) {
                    break 'pairs;
                }
            }
        }
        Some(BlockedPairs {
            blocked,
            total,
            required,
        })
    }
}

impl FeatureExtractor for BetweenExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(self.labels("IsBetween"));
        }
        if self.output.numeric {
            labels.extend(self.labels("Between"));
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            descriptors.extend(
                self.labels("IsBetween")
                    .into_iter()
                    .map(FeatureDescriptor::boolean),
            );
        }
        if self.output.numeric {
            descriptors.extend(
                self.labels("Between")
                    .into_iter()
                    .map(|label| FeatureDescriptor::real(label, 0.0, 1.0)),
            );
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let locations = |filter: &GroupFilter, side: Side| -> Vec<Vec<DVec2>> {
            filter
                .iter()
                .map(|(_, types)| obs.group_locations(side, types))
                .collect()
        };
        let barrier = locations(&self.barrier, Side::Enemy);
        let friendly = locations(&self.friendly, Side::Friendly);
        let enemy = locations(&self.enemy, Side::Enemy);

        let (friendly, enemy) = (&friendly, &enemy);
        let triples: Vec<(&Vec<DVec2>, &Vec<DVec2>, &Vec<DVec2>)> = barrier
            .iter()
            .flat_map(move |b| {
                friendly
                    .iter()
                    .flat_map(move |f| enemy.iter().map(move |e| (b, f, e)))
            })
            .collect();

        if self.output.categorical {
            for (b, f, e) in triples.iter() {
                row.push(
                    self.count_blocked_pairs(b, f, e, true)
                        .map_or(FeatureValue::Undefined, |pairs| {
                            FeatureValue::Bool(pairs.is_between())
                        }),
                );
            }
        }
        if self.output.numeric {
            for (b, f, e) in triples.iter() {
                row.push(FeatureValue::real_or_nan(
                    self.count_blocked_pairs(b, f, e, false)
                        .map(|pairs| pairs.ratio()),
                ));
            }
        }
    }
}
