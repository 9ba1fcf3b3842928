pub mod pipeline;
pub mod replay;
pub mod table;

pub use pipeline::*;
pub use replay::*;
pub use table::*;

use std::path::Path;

use crate::*;

/// Receives the observations of a replay as it is played back from one
/// player's perspective.
pub trait StepListener {
    /// Called before the first observation of each perspective.
    fn start_replay(&mut self, _path: &Path, _info: &ReplayInfo, _player_id: u32) {}

    /// Called with the first observation of each perspective.
    fn reset(&mut self, _first: &Observation) {}

    fn step(&mut self, episode: usize, timestep: usize, obs: &Observation, actions: &[RawAction]);

    /// Called once a perspective has been played back. Returns the replay's
    /// feature table once every required perspective has been seen.
    fn finish_replay(&mut self) -> Option<FeatureTable> {
        None
    }
}

impl<G> StepListener for G
where
    G: FnMut(usize, usize, &Observation, &[RawAction]),
{
    fn step(&mut self, episode: usize, timestep: usize, obs: &Observation, actions: &[RawAction]) {
        self(episode, timestep, obs, actions)
    }
}
