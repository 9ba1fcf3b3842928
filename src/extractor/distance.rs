use crate::*;

static RANGES: [&str; 3] = [MELEE_RANGE, CLOSE_RANGE, FAR_RANGE];

/// Measures how far each friendly group is from each enemy group, relative
/// to the size of the map.
#[derive(Debug, Clone)]
pub struct DistanceExtractor {
    output: OutputModes,
    friendly: GroupFilter,
    enemy: GroupFilter,
    pairs: Vec<(String, String)>,
    range_ratios: [f64; 3],
}

impl DistanceExtractor {
    pub fn new(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        let section = config.distance()?;
        let friendly = config.resolve_filter(&section.friendly_filter)?;
        let enemy = config.resolve_filter(&section.enemy_filter)?;
        Ok(Self {
            output: section.output,
            pairs: owned_product(&friendly, &enemy),
            friendly,
            enemy,
            range_ratios: [
                section.melee_range_ratio,
                section.close_range_ratio,
                section.far_range_ratio,
            ],
        })
    }

    /// The range band a distance falls in, or undefined beyond far range.
    pub fn range_category(&self, distance: Option<f64>, diagonal: f64) -> FeatureValue {
        match distance {
            None => FeatureValue::Undefined,
            Some(d) => category(
                first_level_not_exceeded(d, &self.range_ratios, diagonal),
                &RANGES,
            ),
        }
    }
}

impl FeatureExtractor for DistanceExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(pair_labels("DistanceCat", &self.pairs));
        }
        if self.output.numeric {
            labels.extend(pair_labels("Distance", &self.pairs));
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            descriptors.extend(
                pair_labels("DistanceCat", &self.pairs)
                    .into_iter()
                    .map(|label| FeatureDescriptor::categorical(label, &RANGES)),
            );
        }
        if self.output.numeric {
            descriptors.extend(
                pair_labels("Distance", &self.pairs)
                    .into_iter()
                    .map(|label| FeatureDescriptor::real(label, 0.0, 1.0)),
            );
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let diagonal = obs.map_diagonal();
        let friendly: Vec<_> = self
            .friendly
            .iter()
            .map(|(_, types)| obs.group_locations(Side::Friendly, types))
            .collect();
        let enemy: Vec<_> = self
            .enemy
            .iter()
            .map(|(_, types)| obs.group_locations(Side::Enemy, types))
            .collect();
        let distances: Vec<Option<f64>> = friendly
            .iter()
            .flat_map(|f| enemy.iter().map(move |e| min_distance(f, e)))
            .collect();

        if self.output.categorical {
            row.extend(
                distances
                    .iter()
                    .map(|d| self.range_category(*d, diagonal)),
            );
        }
        if self.output.numeric {
            row.extend(
                distances
                    .iter()
                    .map(|d| FeatureValue::real_or_nan(d.map(|d| (d / diagonal).min(1.0)))),
            );
        }
    }
}
