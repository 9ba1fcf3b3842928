use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::*;

/// A replay already played back and saved as JSON, with the observations of
/// every recorded perspective keyed by player id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct RecordedReplay {
    pub info: ReplayInfo,
    #[new(default)]
    pub perspectives: BTreeMap<u32, Vec<EngineStep>>,
}

impl RecordedReplay {
    pub fn with_perspective(mut self, player_id: u32, steps: Vec<EngineStep>) -> Self {
        self.perspectives.insert(player_id, steps);
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> FeatureExtractorResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return FeatureExtractorError::new_result(FeatureExtractorErrorVariant::ReplayNotFound(
                path.to_path_buf(),
            ));
        }
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> FeatureExtractorResult<()> {
        let writer = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
}

/// A [`ReplayEngine`] that plays back [`RecordedReplay`] files.
#[derive(Debug, Default)]
pub struct RecordedReplayEngine {
    loaded: Option<(PathBuf, RecordedReplay)>,
    pending: VecDeque<EngineStep>,
}

impl RecordedReplayEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn replay(&mut self, path: &Path) -> FeatureExtractorResult<&RecordedReplay> {
        let cached = self
            .loaded
            .as_ref()
            .is_some_and(|(loaded_path, _)| loaded_path == path);
        if !cached {
            log::debug!("Loading recorded replay {:?}", path);
            self.loaded = Some((path.to_path_buf(), RecordedReplay::load(path)?));
        }
        match &self.loaded {
            Some((_, replay)) => Ok(replay),
            None => FeatureExtractorError::new_result(FeatureExtractorErrorVariant::ReplayNotFound(
                path.to_path_buf(),
            )),
        }
    }
}

impl ReplayEngine for RecordedReplayEngine {
    fn replay_info(&mut self, path: &Path) -> FeatureExtractorResult<ReplayInfo> {
        Ok(self.replay(path)?.info.clone())
    }

    fn start_replay(&mut self, path: &Path, player_id: u32) -> FeatureExtractorResult<()> {
        let steps = self
            .replay(path)?
            .perspectives
            .get(&player_id)
            .cloned()
            .ok_or_else(|| {
                FeatureExtractorError::new(FeatureExtractorErrorVariant::PerspectiveNotRecorded {
                    path: path.to_path_buf(),
                    player_id,
                })
            })?;
        self.pending = steps.into();
        Ok(())
    }

    fn observe(&mut self) -> FeatureExtractorResult<Option<EngineStep>> {
        Ok(self.pending.pop_front())
    }
}
