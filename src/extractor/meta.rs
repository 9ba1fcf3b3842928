use crate::*;

/// Prefixes every row with the episode, the timestep and the replay it was
/// observed in.
#[derive(Debug, Clone, Default)]
pub struct MetaExtractor;

impl FeatureExtractor for MetaExtractor {
    fn features_labels(&self) -> Vec<String> {
        vec![
            EPISODE_COLUMN.to_string(),
            TIMESTEP_COLUMN.to_string(),
            REPLAY_FILE_COLUMN.to_string(),
        ]
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        vec![
            FeatureDescriptor::integer(EPISODE_COLUMN.to_string(), 0, i64::MAX),
            FeatureDescriptor::integer(TIMESTEP_COLUMN.to_string(), 0, i64::MAX),
            FeatureDescriptor::new(REPLAY_FILE_COLUMN.to_string(), FeatureType::String, None),
        ]
    }

    fn add_features(&mut self, step: &StepInfo, _obs: &Observation, row: &mut Vec<FeatureValue>) {
        row.extend([
            FeatureValue::Int(step.episode as i64),
            FeatureValue::Int(step.timestep as i64),
            FeatureValue::label(step.replay_name),
        ]);
    }
}
