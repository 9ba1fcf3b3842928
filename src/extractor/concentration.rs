use crate::*;

static CONCENTRATIONS: [&str; 3] = [COMPACT, SPREAD, SCATTERED];

/// Measures how spread out the units of each group are, from the mean
/// distance between any two of them.
#[derive(Debug, Clone)]
pub struct ConcentrationExtractor {
    output: OutputModes,
    friendly: GroupFilter,
    enemy: GroupFilter,
    ratios: [f64; 3],
}

impl ConcentrationExtractor {
    pub fn new(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        let section = config.concentration()?;
        Ok(Self {
            output: section.output,
            friendly: config.resolve_filter(&section.friendly_filter)?,
            enemy: config.resolve_filter(&section.enemy_filter)?,
            ratios: [
                section.compact_ratio,
                section.spread_ratio,
                section.scattered_ratio,
            ],
        })
    }
}

impl FeatureExtractor for ConcentrationExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(side_group_labels(
                "Concentration_Cat",
                &self.friendly,
                &self.enemy,
            ));
        }
        if self.output.numeric {
            labels.extend(side_group_labels(
                "Concentration_",
                &self.friendly,
                &self.enemy,
            ));
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            descriptors.extend(
                side_group_labels("Concentration_Cat", &self.friendly, &self.enemy)
                    .into_iter()
                    .map(|label| FeatureDescriptor::categorical(label, &CONCENTRATIONS)),
            );
        }
        if self.output.numeric {
            descriptors.extend(
                side_group_labels("Concentration_", &self.friendly, &self.enemy)
                    .into_iter()
                    .map(|label| FeatureDescriptor::real(label, 0.0, 1.0)),
            );
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let diagonal = obs.map_diagonal();
        let spreads: Vec<Option<f64>> = self
            .friendly
            .iter()
            .map(|(_, types)| (Side::Friendly, types))
            .chain(self.enemy.iter().map(|(_, types)| (Side::Enemy, types)))
            .map(|(side, types)| mean_pairwise_distance(&obs.group_locations(side, types)))
            .collect();

        if self.output.categorical {
            row.extend(spreads.iter().map(|spread| match spread {
                None => FeatureValue::Undefined,
                Some(s) => category(
                    first_level_not_exceeded(*s, &self.ratios, diagonal),
                    &CONCENTRATIONS,
                ),
            }));
        }
        if self.output.numeric {
            row.extend(spreads.iter().map(|spread| {
                FeatureValue::real_or_nan(spread.map(|s| 1.0 - (s / diagonal).min(1.0)))
            }));
        }
    }
}
