use std::path::{Path, PathBuf};

use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    ReplayStarted,
    Stepping,
    ReplayFinished,
}

impl CollectorState {
    fn name(self) -> &'static str {
        match self {
            CollectorState::Idle => "idle",
            CollectorState::ReplayStarted => "starting a replay",
            CollectorState::Stepping => "stepping through a replay",
            CollectorState::ReplayFinished => "done with a replay",
        }
    }
}

/// Collects the feature rows of a replay from both players' perspectives
/// and joins them into a single table once the replay is finished.
#[derive(Debug, Clone)]
pub struct ReplayFeatureCollector {
    sample_int: usize,
    friendly_id: u32,
    friendly: ExtractorPipeline,
    enemy: ExtractorPipeline,
    friendly_rows: Vec<Vec<FeatureValue>>,
    enemy_rows: Vec<Vec<FeatureValue>>,
    replay_path: Option<PathBuf>,
    replay_name: String,
    num_players: usize,
    side: Side,
    state: CollectorState,
    last_episode: usize,
}

impl ReplayFeatureCollector {
    pub fn new(
        config: &FeatureExtractorConfig,
        friendly: ExtractorPipeline,
        enemy: ExtractorPipeline,
    ) -> Self {
        Self {
            sample_int: config.sample_int.max(1),
            friendly_id: config.friendly_id,
            friendly,
            enemy,
            friendly_rows: Vec::new(),
            enemy_rows: Vec::new(),
            replay_path: None,
            replay_name: String::new(),
            num_players: 0,
            side: Side::Friendly,
            state: CollectorState::Idle,
            last_episode: 0,
        }
    }

    pub fn standard(config: &FeatureExtractorConfig) -> FeatureExtractorResult<Self> {
        Ok(Self::new(
            config,
            ExtractorPipeline::standard(config, Side::Friendly)?,
            ExtractorPipeline::standard(config, Side::Enemy)?,
        ))
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn pipeline(&self, side: Side) -> &ExtractorPipeline {
        match side {
            Side::Friendly => &self.friendly,
            Side::Enemy => &self.enemy,
        }
    }

    fn pipeline_mut(&mut self, side: Side) -> &mut ExtractorPipeline {
        match side {
            Side::Friendly => &mut self.friendly,
            Side::Enemy => &mut self.enemy,
        }
    }

    /// Column labels of the tables this collector emits for replays with
    /// `num_players` players.
    pub fn features_labels(&self, num_players: usize) -> Vec<String> {
        let mut labels = self.friendly.features_labels();
        if num_players == 2 {
            labels.extend(self.enemy.features_labels());
        }
        labels
    }

    pub fn features_descriptors(&self, num_players: usize) -> Vec<FeatureDescriptor> {
        let mut descriptors = self.friendly.features_descriptors();
        if num_players == 2 {
            descriptors.extend(self.enemy.features_descriptors());
        }
        descriptors
    }

    pub fn save_descriptors<P: AsRef<Path>>(
        &self,
        path: P,
        num_players: usize,
    ) -> FeatureExtractorResult<()> {
        let json = serde_json::to_string_pretty(&self.features_descriptors(num_players))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[CollectorState],
    ) -> FeatureExtractorResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            FeatureExtractorError::new_result(FeatureExtractorErrorVariant::InvalidCollectorState {
                operation,
                state: self.state.name(),
            })
        }
    }

    /// Starts processing `path` from `player_id`'s perspective. Rows
    /// collected for other perspectives of the same replay are kept.
    pub fn begin_replay(
        &mut self,
        path: &Path,
        info: &ReplayInfo,
        player_id: u32,
    ) -> FeatureExtractorResult<()> {
        self.expect_state(
            "start_replay",
            &[CollectorState::Idle, CollectorState::ReplayFinished],
        )?;
        if self.replay_path.as_deref() != Some(path) {
            self.replay_path = Some(path.to_path_buf());
            self.replay_name = replay_name(path);
            self.num_players = info.num_players();
            self.friendly_rows.clear();
            self.enemy_rows.clear();
            self.last_episode = 0;
        }
        self.side = if player_id == self.friendly_id {
            Side::Friendly
        } else {
            Side::Enemy
        };
        self.pipeline_mut(self.side).start_replay();
        self.state = CollectorState::ReplayStarted;
        log::info!(
            "Extracting features from {:?} in player {}'s perspective ({} side)",
            path,
            player_id,
            self.side
        );
        Ok(())
    }

    /// Drops everything collected for the current replay and returns to
    /// [`CollectorState::Idle`].
    pub fn abort(&mut self) {
        self.friendly_rows.clear();
        self.enemy_rows.clear();
        self.replay_path = None;
        self.replay_name.clear();
        self.num_players = 0;
        self.last_episode = 0;
        self.state = CollectorState::Idle;
    }

    pub fn reset_extractors(&mut self) -> FeatureExtractorResult<()> {
        self.expect_state(
            "reset",
            &[CollectorState::ReplayStarted, CollectorState::Stepping],
        )?;
        self.pipeline_mut(self.side).reset();
        Ok(())
    }

    /// Extracts a row for the observation unless the timestep falls between
    /// samples.
    pub fn record_step(
        &mut self,
        episode: usize,
        timestep: usize,
        obs: &Observation,
    ) -> FeatureExtractorResult<()> {
        self.expect_state(
            "step",
            &[CollectorState::ReplayStarted, CollectorState::Stepping],
        )?;
        self.state = CollectorState::Stepping;
        self.last_episode = episode;
        if timestep % self.sample_int != 0 {
            return Ok(());
        }

        let step = StepInfo::new(episode, timestep, &self.replay_name);
        let row = match self.side {
            Side::Friendly => self.friendly.extract_row(&step, obs),
            Side::Enemy => self.enemy.extract_row(&step, &obs.relabeled()),
        };
        match self.side {
            Side::Friendly => self.friendly_rows.push(row),
            Side::Enemy => self.enemy_rows.push(row),
        }
        Ok(())
    }

    /// Builds the replay's table, if the required perspectives produced
    /// matching rows.
    pub fn build_table(&mut self) -> FeatureExtractorResult<Option<FeatureTable>> {
        self.expect_state(
            "finish_replay",
            &[CollectorState::ReplayStarted, CollectorState::Stepping],
        )?;
        self.state = CollectorState::ReplayFinished;

        let two_players = self.num_players == 2;
        if self.friendly_rows.is_empty() || (two_players && self.enemy_rows.is_empty()) {
            return Ok(None);
        }
        if two_players && self.friendly_rows.len() != self.enemy_rows.len() {
            log::warn!(
                "Discarding {}: {} friendly rows but {} enemy rows",
                self.replay_name,
                self.friendly_rows.len(),
                self.enemy_rows.len()
            );
            return Ok(None);
        }

        let mut table = FeatureTable::from_rows(
            self.friendly.features_labels(),
            std::mem::take(&mut self.friendly_rows),
        )?;
        if two_players {
            table = table.hstack(FeatureTable::from_rows(
                self.enemy.features_labels(),
                std::mem::take(&mut self.enemy_rows),
            )?)?;
        }
        table.sort_by_episode()?;
        log::info!(
            "Finished {} on episode {} with {} rows",
            self.replay_name,
            self.last_episode,
            table.len()
        );
        Ok(Some(table))
    }
}

impl StepListener for ReplayFeatureCollector {
    fn start_replay(&mut self, path: &Path, info: &ReplayInfo, player_id: u32) {
        if let Err(err) = self.begin_replay(path, info, player_id) {
            log::error!("{}", err);
        }
    }

    fn reset(&mut self, _first: &Observation) {
        if let Err(err) = self.reset_extractors() {
            log::error!("{}", err);
        }
    }

    fn step(&mut self, episode: usize, timestep: usize, obs: &Observation, _actions: &[RawAction]) {
        if let Err(err) = self.record_step(episode, timestep, obs) {
            log::error!("{}", err);
        }
    }

    fn finish_replay(&mut self) -> Option<FeatureTable> {
        match self.build_table() {
            Ok(table) => table,
            Err(err) => {
                log::error!("Could not build feature table: {}", err);
                None
            }
        }
    }
}
