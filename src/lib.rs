//! # sc2-feature-extractor
//!
//! Turns StarCraft II replays into per-timestep tables of symbolic
//! features: distance bands between unit groups, concentration, elevation,
//! force comparisons, under-attack detection, movement classification,
//! line-of-sight blocking and order detection.
//!
//! A [`FeatureExtractorConfig`] declares the unit groups and thresholds.
//! Each feature kind is a [`FeatureExtractor`]; an [`ExtractorPipeline`]
//! concatenates the outputs of several extractors into one row per
//! observation, and a [`ReplayFeatureCollector`] joins the rows produced
//! from both players' perspectives into a [`FeatureTable`].
//!
//! Observations come from a [`ReplayEngine`]. [`process_replay`] drives one
//! replay through a [`StepListener`], and [`ReplayProcessRunner`] processes
//! a directory of replays on a pool of worker threads.
//!
//! Per-replay tables are joined with [`DatasetMerger`] and summarized with
//! [`StatsAggregator`].

mod collector;
mod config;
mod constants;
mod error;
mod extractor;
mod merge;
mod observation;
mod recorded;
mod runner;
mod stats;
mod util;


pub use crate::collector::*;
pub use crate::config::*;
pub use crate::constants::*;
pub use crate::error::*;
pub use crate::extractor::*;
pub use crate::merge::*;
pub use crate::observation::*;
pub use crate::recorded::*;
pub use crate::runner::*;
pub use crate::stats::*;
pub use crate::util::*;

#[macro_use]
extern crate derive_new;
