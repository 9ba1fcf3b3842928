use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::*;

/// One observation produced by a replay engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStep {
    pub observation: Observation,
    #[serde(default)]
    pub actions: Vec<RawAction>,
    /// Set on the first observation of a new episode.
    #[serde(default)]
    pub new_episode: bool,
    /// Set on the last observation of the game.
    #[serde(default)]
    pub game_over: bool,
}

impl EngineStep {
    pub fn new(observation: Observation) -> Self {
        Self {
            observation,
            actions: Vec::new(),
            new_episode: false,
            game_over: false,
        }
    }
}

/// The external source of observations: plays a replay back from one
/// player's perspective.
pub trait ReplayEngine {
    fn replay_info(&mut self, path: &Path) -> FeatureExtractorResult<ReplayInfo>;

    fn start_replay(&mut self, path: &Path, player_id: u32) -> FeatureExtractorResult<()>;

    /// The next observation, or `None` once the replay is over.
    fn observe(&mut self) -> FeatureExtractorResult<Option<EngineStep>>;
}

/// Options shared by every replay processed in a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayOptions {
    /// Global step indices after which a new episode starts.
    pub episode_breaks: HashSet<usize>,
    /// Perspectives to play back; every player when `None`.
    pub player_ids: Option<Vec<u32>>,
}

impl ReplayOptions {
    /// Reads episode breaks from the `episodes.csv` file in `replay_dir`, if
    /// there is one.
    pub fn from_replay_dir(replay_dir: &Path) -> FeatureExtractorResult<Self> {
        let breaks_file = replay_dir.join(EPISODE_BREAKS_FILE);
        let episode_breaks = if breaks_file.is_file() {
            parse_episode_breaks(&std::fs::read_to_string(&breaks_file)?)?
                .into_iter()
                .collect()
        } else {
            HashSet::new()
        };
        if !episode_breaks.is_empty() {
            log::info!("Using {} episode breaks", episode_breaks.len());
        }
        Ok(Self {
            episode_breaks,
            player_ids: None,
        })
    }

    fn plays(&self, player_id: u32) -> bool {
        self.player_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&player_id))
    }
}

/// Plays a replay back from one player's perspective, feeding every
/// observation to `listener`. The first observation only resets the
/// listener; every following one is a step.
pub fn process_perspective<E, L>(
    engine: &mut E,
    path: &Path,
    info: &ReplayInfo,
    player_id: u32,
    options: &ReplayOptions,
    listener: &mut L,
) -> FeatureExtractorResult<Option<FeatureTable>>
where
    E: ReplayEngine + ?Sized,
    L: StepListener + ?Sized,
{
    engine.start_replay(path, player_id)?;
    listener.start_replay(path, info, player_id);

    if let Some(first) = engine.observe()? {
        listener.reset(&first.observation);
        let mut episode = 0;
        let mut episode_steps = 0;
        let mut total_steps = 0;
        while let Some(step) = engine.observe()? {
            if step.new_episode {
                log::debug!("Episode {} ended at step {}", episode, total_steps);
                episode += 1;
                episode_steps = 0;
            }
            listener.step(episode, episode_steps, &step.observation, &step.actions);
            if step.game_over {
                break;
            }
            if options.episode_breaks.contains(&total_steps) {
                log::debug!("Episode {} ended at step {}", episode, total_steps);
                episode += 1;
                episode_steps = 0;
            } else {
                episode_steps += 1;
            }
            total_steps += 1;
        }
        log::debug!("Episode {} ended at step {}", episode, total_steps);
    }
    Ok(listener.finish_replay())
}

/// Plays a replay back from the perspective of every selected player.
/// Returns the table emitted after the last perspective, if any.
pub fn process_replay<E, L>(
    engine: &mut E,
    path: &Path,
    options: &ReplayOptions,
    listener: &mut L,
) -> FeatureExtractorResult<Option<FeatureTable>>
where
    E: ReplayEngine + ?Sized,
    L: StepListener + ?Sized,
{
    let info = engine.replay_info(path)?;
    let mut table = None;
    for player in info.players.iter().filter(|p| options.plays(p.player_id)) {
        log::info!(
            "Starting {:?} from player {}'s perspective ({} game loops)",
            path,
            player.player_id,
            info.game_duration_loops
        );
        table = process_perspective(engine, path, &info, player.player_id, options, listener)?;
    }
    if table.is_none() {
        log::warn!("No features extracted from {:?}, replay discarded", path);
    }
    Ok(table)
}

/// Sorted paths of the recorded replays in `replay_dir`, or `replay_dir`
/// itself when it is a replay file.
pub fn replay_paths(replay_dir: &Path) -> FeatureExtractorResult<Vec<PathBuf>> {
    if !replay_dir.exists() {
        return FeatureExtractorError::new_result(
            FeatureExtractorErrorVariant::ReplayDirectoryNotFound(replay_dir.to_path_buf()),
        );
    }
    if replay_dir.is_file() {
        return Ok(vec![replay_dir.to_path_buf()]);
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(replay_dir)? {
        let path = entry?.path();
        let is_replay = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(RECORDED_REPLAY_EXTENSION));
        if path.is_file() && is_replay {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// The result of processing one replay in a worker.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub path: PathBuf,
    pub worker: usize,
    pub result: FeatureExtractorResult<Option<FeatureTable>>,
}

/// Processes a directory of replays with a pool of worker threads fed from
/// a bounded queue. Each worker owns its engine and collector.
pub struct ReplayProcessRunner {
    config: Arc<FeatureExtractorConfig>,
    replay_dir: PathBuf,
    parallel: usize,
    amount: Option<usize>,
    options: ReplayOptions,
    stop: Arc<AtomicBool>,
}

impl ReplayProcessRunner {
    pub fn new(
        config: Arc<FeatureExtractorConfig>,
        replay_dir: PathBuf,
        parallel: usize,
    ) -> FeatureExtractorResult<Self> {
        let options = ReplayOptions::from_replay_dir(&replay_dir)?;
        Ok(Self {
            config,
            replay_dir,
            parallel: parallel.max(1),
            amount: None,
            options,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_amount(mut self, amount: Option<usize>) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_episode_breaks(mut self, episode_breaks: HashSet<usize>) -> Self {
        self.options.episode_breaks = episode_breaks;
        self
    }

    pub fn with_player_ids(mut self, player_ids: Option<Vec<u32>>) -> Self {
        self.options.player_ids = player_ids;
        self
    }

    pub fn options(&self) -> &ReplayOptions {
        &self.options
    }

    /// Setting the returned flag stops the run after the replays currently
    /// being processed.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn replay_list(&self) -> FeatureExtractorResult<Vec<PathBuf>> {
        let mut replays = replay_paths(&self.replay_dir)?;
        log::info!("{} replays found in {:?}", replays.len(), self.replay_dir);
        if let Some(amount) = self.amount {
            if replays.len() > amount {
                replays.truncate(amount);
                log::info!("Selected the first {} replays", amount);
            }
        }
        Ok(replays)
    }

    /// Processes every replay in the replay directory.
    pub fn run<E, F, H>(&self, engine_factory: F, on_outcome: H) -> FeatureExtractorResult<usize>
    where
        E: ReplayEngine,
        F: Fn() -> E + Sync,
        H: FnMut(ReplayOutcome),
    {
        self.run_replays(self.replay_list()?, engine_factory, on_outcome)
    }

    /// Processes `replays`, handing each outcome to `on_outcome` on the
    /// calling thread as workers complete them. `engine_factory` builds one
    /// engine per worker. Returns the number of replays processed.
    pub fn run_replays<E, F, H>(
        &self,
        replays: Vec<PathBuf>,
        engine_factory: F,
        mut on_outcome: H,
    ) -> FeatureExtractorResult<usize>
    where
        E: ReplayEngine,
        F: Fn() -> E + Sync,
        H: FnMut(ReplayOutcome),
    {
        if replays.is_empty() {
            return Ok(0);
        }
        // Fails before any worker starts if the pipelines cannot be built.
        ReplayFeatureCollector::standard(&self.config)?;

        let (queue_tx, queue_rx) =
            mpsc::sync_channel::<PathBuf>(self.parallel * QUEUE_CAPACITY_PER_WORKER);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let (outcome_tx, outcome_rx) = mpsc::channel::<ReplayOutcome>();

        let mut processed = 0;
        std::thread::scope(|scope| {
            let stop = &self.stop;
            scope.spawn(move || fill_queue(queue_tx, replays, stop));

            for worker in 0..self.parallel {
                let queue_rx = queue_rx.clone();
                let outcome_tx = outcome_tx.clone();
                let engine_factory = &engine_factory;
                scope.spawn(move || {
                    self.work(worker, engine_factory(), &queue_rx, &outcome_tx);
                });
            }
            drop(queue_rx);
            drop(outcome_tx);

            for outcome in outcome_rx {
                processed += 1;
                on_outcome(outcome);
            }
        });
        log::info!("Processed {} replays", processed);
        Ok(processed)
    }

    fn work<E: ReplayEngine>(
        &self,
        worker: usize,
        mut engine: E,
        queue: &Mutex<Receiver<PathBuf>>,
        outcomes: &mpsc::Sender<ReplayOutcome>,
    ) {
        let mut collector = match ReplayFeatureCollector::standard(&self.config) {
            Ok(collector) => collector,
            Err(err) => {
                log::error!("[{}] Could not build extractors: {}", worker, err);
                return;
            }
        };
        let poll = Duration::from_millis(QUEUE_POLL_INTERVAL_MS);
        while !self.stop.load(Ordering::SeqCst) {
            let next = match queue.lock() {
                Ok(receiver) => receiver.recv_timeout(poll),
                Err(_) => break,
            };
            let path = match next {
                Ok(path) => path,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            log::info!("[{}] Got replay {:?}", worker, path);
            let result = process_replay(&mut engine, &path, &self.options, &mut collector);
            if let Err(err) = &result {
                log::error!("[{}] Failed to process {:?}: {}", worker, path, err);
                collector.abort();
            }
            let outcome = ReplayOutcome {
                path,
                worker,
                result,
            };
            if outcomes.send(outcome).is_err() {
                break;
            }
        }
        log::info!("[{}] Worker done", worker);
    }
}

fn fill_queue(queue: SyncSender<PathBuf>, replays: Vec<PathBuf>, stop: &AtomicBool) {
    for path in replays {
        if stop.load(Ordering::SeqCst) || queue.send(path).is_err() {
            log::info!("Stopped filling the replay queue");
            return;
        }
    }
    log::info!("Done filling the replay queue");
}
