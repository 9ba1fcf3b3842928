use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::*;

/// Distribution summary of a set of numbers. NaN values are counted but
/// otherwise ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Summary {
    pub count: usize,
    pub nan_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn of<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let (valid, nan): (Vec<f64>, Vec<f64>) = values.into_iter().partition(|v| !v.is_nan());
        Self {
            count: valid.len(),
            nan_count: nan.len(),
            mean: AggregationOp::Mean.apply(&valid),
            std: AggregationOp::Std.apply(&valid),
            min: AggregationOp::Min.apply(&valid),
            median: AggregationOp::Median.apply(&valid),
            max: AggregationOp::Max.apply(&valid),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct CategoricalStats {
    /// Occurrences of each value over every step.
    pub all_steps: BTreeMap<String, usize>,
    /// Occurrences of each value on the first step of an episode.
    pub first_step: BTreeMap<String, usize>,
    /// Occurrences of each value on the last step of an episode.
    pub last_step: BTreeMap<String, usize>,
    /// Number of episodes in which each value appears at least once.
    pub episodes: BTreeMap<String, usize>,
    /// Longest run of consecutive steps holding each value, averaged over
    /// episodes. Episodes where the value never appears count as zero.
    pub mean_longest_run: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct NumericStats {
    pub all_steps: Summary,
    pub episode_means: Summary,
    pub last_step: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DatasetStats {
    pub num_steps: usize,
    pub num_episodes: usize,
    pub episode_length: Summary,
    pub categorical: BTreeMap<String, CategoricalStats>,
    pub numeric: BTreeMap<String, NumericStats>,
}

impl DatasetStats {
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> FeatureExtractorResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Computes descriptive statistics over a merged dataset. Columns holding
/// only numbers are summarized numerically; all others are treated as
/// categorical.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator;

impl StatsAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, table: &FeatureTable) -> FeatureExtractorResult<DatasetStats> {
        let episodes = episode_rows(table)?;
        let skipped = [
            table.require_column(EPISODE_COLUMN)?,
            table.require_column(TIMESTEP_COLUMN)?,
            table.column_index(REPLAY_FILE_COLUMN).unwrap_or(usize::MAX),
        ];

        let mut stats = DatasetStats {
            num_steps: table.len(),
            num_episodes: episodes.len(),
            episode_length: Summary::of(episodes.iter().map(|rows| rows.len() as f64)),
            ..Default::default()
        };
        for (index, column) in table.columns.iter().enumerate() {
            if skipped.contains(&index) {
                continue;
            }
            let numeric = table
                .column(index)
                .all(|value| value.is_missing() || value.is_numeric());
            if numeric {
                stats
                    .numeric
                    .insert(column.clone(), numeric_stats(table, index, &episodes));
            } else {
                stats
                    .categorical
                    .insert(column.clone(), categorical_stats(table, index, &episodes));
            }
        }
        log::info!(
            "Computed statistics for {} categorical and {} numeric features over {} episodes",
            stats.categorical.len(),
            stats.numeric.len(),
            stats.num_episodes
        );
        Ok(stats)
    }
}

/// Row indices of each episode, ordered by timestep.
fn episode_rows(table: &FeatureTable) -> FeatureExtractorResult<Vec<Vec<usize>>> {
    let keys = table.episode_keys()?;
    let mut episodes: BTreeMap<Option<i64>, Vec<usize>> = BTreeMap::new();
    for (row, (episode, _)) in keys.iter().enumerate() {
        episodes.entry(*episode).or_default().push(row);
    }
    Ok(episodes
        .into_values()
        .map(|mut rows| {
            rows.sort_by_key(|&row| keys[row].1);
            rows
        })
        .collect())
}

fn category_label(value: &FeatureValue) -> String {
    match value {
        FeatureValue::Real(v) if v.is_nan() => "NaN".to_string(),
        _ => value.to_cell(),
    }
}

fn categorical_stats(table: &FeatureTable, column: usize, episodes: &[Vec<usize>]) -> CategoricalStats {
    let mut stats = CategoricalStats::default();
    let mut run_totals: BTreeMap<String, usize> = BTreeMap::new();
    for rows in episodes.iter() {
        let values: Vec<String> = rows
            .iter()
            .map(|&row| category_label(&table.rows[row][column]))
            .collect();
        if let (Some(first), Some(last)) = (values.first(), values.last()) {
            *stats.first_step.entry(first.clone()).or_default() += 1;
            *stats.last_step.entry(last.clone()).or_default() += 1;
        }

        let mut longest: BTreeMap<&str, usize> = BTreeMap::new();
        let mut run = 0;
        for (i, value) in values.iter().enumerate() {
            *stats.all_steps.entry(value.clone()).or_default() += 1;
            run = if i > 0 && values[i - 1] == *value { run + 1 } else { 1 };
            let best = longest.entry(value.as_str()).or_default();
            *best = (*best).max(run);
        }
        for (value, best) in longest {
            *stats.episodes.entry(value.to_string()).or_default() += 1;
            *run_totals.entry(value.to_string()).or_default() += best;
        }
    }
    let num_episodes = episodes.len().max(1) as f64;
    stats.mean_longest_run = run_totals
        .into_iter()
        .map(|(value, total)| (value, total as f64 / num_episodes))
        .collect();
    stats
}

fn numeric_stats(table: &FeatureTable, column: usize, episodes: &[Vec<usize>]) -> NumericStats {
    let value = |row: usize| table.rows[row][column].as_f64().unwrap_or(f64::NAN);
    NumericStats {
        all_steps: Summary::of(table.column(column).map(|v| v.as_f64().unwrap_or(f64::NAN))),
        episode_means: Summary::of(episodes.iter().map(|rows| {
            let valid: Vec<f64> = rows.iter().map(|&row| value(row)).filter(|v| !v.is_nan()).collect();
            AggregationOp::Mean.apply(&valid).unwrap_or(f64::NAN)
        })),
        last_step: Summary::of(
            episodes
                .iter()
                .filter_map(|rows| rows.last().map(|&row| value(row))),
        ),
    }
}
