use crate::*;

static ELEVATIONS: [&str; 3] = [LOW_ELEVATION, MEDIUM_ELEVATION, HIGH_ELEVATION];

/// Mean terrain height under the units of each group.
#[derive(Debug, Clone)]
pub struct ElevationExtractor {
    output: OutputModes,
    friendly: GroupFilter,
    enemy: GroupFilter,
    levels: [f64; 3],
}

impl ElevationExtractor {
    pub fn new(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        let section = config.elevation()?;
        Ok(Self {
            output: section.output,
            friendly: config.resolve_filter(&section.friendly_filter)?,
            enemy: config.resolve_filter(&section.enemy_filter)?,
            levels: [
                section.low_elevation,
                section.medium_elevation,
                section.high_elevation,
            ],
        })
    }
}

fn mean_height(obs: &Observation, side: Side, types: &std::collections::BTreeSet<u32>) -> Option<f64> {
    let heights: Vec<f64> = obs
        .group_units(side, types)
        .filter_map(|unit| obs.height_map.height_at(unit.pos))
        .map(f64::from)
        .collect();
    AggregationOp::Mean.apply(&heights)
}

impl FeatureExtractor for ElevationExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(side_group_labels("ElevationCat_", &self.friendly, &self.enemy));
        }
        if self.output.numeric {
            labels.extend(side_group_labels("Elevation_", &self.friendly, &self.enemy));
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            descriptors.extend(
                side_group_labels("ElevationCat_", &self.friendly, &self.enemy)
                    .into_iter()
                    .map(|label| FeatureDescriptor::categorical(label, &ELEVATIONS)),
            );
        }
        if self.output.numeric {
            descriptors.extend(
                side_group_labels("Elevation_", &self.friendly, &self.enemy)
                    .into_iter()
                    .map(|label| FeatureDescriptor::real(label, 0.0, f64::MAX)),
            );
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let heights: Vec<Option<f64>> = self
            .friendly
            .iter()
            .map(|(_, types)| mean_height(obs, Side::Friendly, types))
            .chain(
                self.enemy
                    .iter()
                    .map(|(_, types)| mean_height(obs, Side::Enemy, types)),
            )
            .collect();

        if self.output.categorical {
            row.extend(heights.iter().map(|height| match height {
                None => FeatureValue::Undefined,
                Some(h) => category(first_level_not_exceeded(*h, &self.levels, 1.0), &ELEVATIONS),
            }));
        }
        if self.output.numeric {
            row.extend(heights.iter().map(|h| FeatureValue::real_or_nan(*h)));
        }
    }
}
