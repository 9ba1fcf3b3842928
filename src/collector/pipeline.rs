use std::path::Path;

use crate::*;

/// Extractors run for observations made from the friendly player's
/// perspective, in column order.
pub static STANDARD_FRIENDLY_EXTRACTORS: [&str; 12] = [
    "meta",
    "unit_group",
    "distance",
    "concentration",
    "force_factors",
    "force_relative_factors",
    "under_attack",
    "elevation",
    "friendly_movement",
    "enemy_movement",
    "between",
    "friendly_orders",
];

/// Extractors run for observations made from the enemy player's
/// perspective. Unit orders are only reported for the observing player's
/// own units.
pub static STANDARD_ENEMY_EXTRACTORS: [&str; 1] = ["enemy_orders"];

/// An ordered list of extractors whose outputs are concatenated into one
/// feature row per observation.
#[derive(Debug, Clone)]
pub struct ExtractorPipeline {
    extractors: Vec<Extractor>,
    width: usize,
    last_episode: Option<usize>,
}

impl ExtractorPipeline {
    pub fn new(extractors: Vec<Extractor>) -> Self {
        let width = extractors.iter().map(|e| e.features_added()).sum();
        Self {
            extractors,
            width,
            last_episode: None,
        }
    }

    pub fn from_names<S: AsRef<str>>(
        names: &[S],
        config: &FeatureExtractorConfig,
    ) -> FeatureExtractorResult<Self> {
        Ok(Self::new(
            names
                .iter()
                .map(|name| Extractor::from_name(name.as_ref(), config))
                .collect::<FeatureExtractorResult<Vec<_>>>()?,
        ))
    }

    pub fn standard(config: &FeatureExtractorConfig, side: Side) -> FeatureExtractorResult<Self> {
        match side {
            Side::Friendly => Self::from_names(&STANDARD_FRIENDLY_EXTRACTORS, config),
            Side::Enemy => Self::from_names(&STANDARD_ENEMY_EXTRACTORS, config),
        }
    }

    pub fn extractors(&self) -> &[Extractor] {
        &self.extractors
    }

    /// Number of values in every extracted row.
    pub fn features_added(&self) -> usize {
        self.width
    }

    pub fn features_labels(&self) -> Vec<String> {
        self.extractors
            .iter()
            .flat_map(|e| e.features_labels())
            .collect()
    }

    pub fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        self.extractors
            .iter()
            .flat_map(|e| e.features_descriptors())
            .collect()
    }

    pub fn reset(&mut self) {
        for extractor in self.extractors.iter_mut() {
            extractor.reset();
        }
    }

    /// Extracts one feature row. Stateful extractors are reset first when
    /// the observation starts a new episode.
    pub fn extract_row(&mut self, step: &StepInfo, obs: &Observation) -> Vec<FeatureValue> {
        if self
            .last_episode
            .is_some_and(|episode| episode != step.episode)
        {
            log::debug!("Episode {} started, resetting extractors", step.episode);
            self.reset();
        }
        self.last_episode = Some(step.episode);

        let mut row = Vec::with_capacity(self.width);
        for extractor in self.extractors.iter_mut() {
            extractor.add_features(step, obs, &mut row);
        }
        row
    }

    /// Forgets the episode of the last extracted row.
    pub fn start_replay(&mut self) {
        self.last_episode = None;
    }

    pub fn save_descriptors<P: AsRef<Path>>(&self, path: P) -> FeatureExtractorResult<()> {
        let json = serde_json::to_string_pretty(&self.features_descriptors())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
