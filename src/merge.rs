use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::*;

/// The type feature columns are converted to when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Real,
    Integer,
    Boolean,
}

impl ScalarKind {
    /// Converts a single value. Missing values stay missing.
    pub fn coerce(self, value: FeatureValue) -> FeatureValue {
        if value.is_missing() {
            return value;
        }
        match self {
            ScalarKind::String => FeatureValue::Str(value.to_cell()),
            ScalarKind::Real => match &value {
                FeatureValue::Str(s) => FeatureValue::real_or_nan(s.parse().ok()),
                _ => FeatureValue::real_or_nan(value.as_f64()),
            },
            ScalarKind::Integer => match value.as_f64() {
                Some(v) => FeatureValue::Int(v as i64),
                None => match &value {
                    FeatureValue::Str(s) => s
                        .parse::<i64>()
                        .map_or_else(|_| FeatureValue::nan(), FeatureValue::Int),
                    _ => FeatureValue::nan(),
                },
            },
            ScalarKind::Boolean => match &value {
                FeatureValue::Bool(_) => value,
                FeatureValue::Str(s) if s == TRUE_VALUE => FeatureValue::Bool(true),
                FeatureValue::Str(s) if s == FALSE_VALUE => FeatureValue::Bool(false),
                _ => value
                    .as_f64()
                    .map_or(FeatureValue::Undefined, |v| FeatureValue::Bool(v != 0.0)),
            },
        }
    }
}

impl FromStr for ScalarKind {
    type Err = FeatureExtractorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(ScalarKind::String),
            "real" | "float" => Ok(ScalarKind::Real),
            "integer" | "int" => Ok(ScalarKind::Integer),
            "boolean" | "bool" => Ok(ScalarKind::Boolean),
            _ => FeatureExtractorError::new_result(FeatureExtractorErrorVariant::InvalidParameter {
                parameter: "coerce".to_string(),
                reason: format!("{:?} is not a scalar type", s),
            }),
        }
    }
}

/// Joins per-replay feature tables into one dataset with globally unique
/// episode ids, sorted by episode and timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct DatasetMerger {
    /// Take episode ids from the `epN` marker in the replay name, when
    /// present, instead of numbering episodes sequentially.
    pub use_replay_derived_ids: bool,
    pub coerce: Option<ScalarKind>,
}

impl Default for DatasetMerger {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl DatasetMerger {
    pub fn merge(&self, tables: Vec<FeatureTable>) -> FeatureExtractorResult<FeatureTable> {
        merge(tables, self.use_replay_derived_ids, self.coerce)
    }

    pub fn merge_directory(&self, dir: &Path) -> FeatureExtractorResult<FeatureTable> {
        let tables = load_feature_tables(dir)?
            .into_iter()
            .map(|(_, table)| table)
            .collect();
        self.merge(tables)
    }
}

/// The episodes of one table, in order of first appearance, with the id
/// derived from the replay name when there is one.
fn table_episodes(
    table: &FeatureTable,
    use_replay_derived_ids: bool,
    derived_ids: &mut HashMap<i64, String>,
) -> FeatureExtractorResult<Vec<(Option<i64>, Option<i64>)>> {
    let episode_col = table.require_column(EPISODE_COLUMN)?;
    table.require_column(TIMESTEP_COLUMN)?;
    let file_col = table.require_column(REPLAY_FILE_COLUMN)?;

    let mut seen = HashSet::new();
    let mut episodes = Vec::new();
    for row in table.rows.iter() {
        let key = row[episode_col].as_i64();
        if !seen.insert(key) {
            continue;
        }
        let replay_file = row[file_col].to_cell();
        let derived = use_replay_derived_ids
            .then(|| episode_from_name(&replay_file))
            .flatten();
        if let Some(id) = derived {
            if derived_ids.contains_key(&id) {
                return FeatureExtractorError::new_result(
                    FeatureExtractorErrorVariant::DuplicateEpisodeId {
                        episode: id,
                        replay_file,
                    },
                );
            }
            derived_ids.insert(id, replay_file);
        }
        episodes.push((key, derived));
    }
    Ok(episodes)
}

/// Hands out the lowest sequential id not taken by a derived id.
fn next_sequential_id(next: &mut i64, derived_ids: &HashMap<i64, String>) -> i64 {
    while derived_ids.contains_key(next) {
        *next += 1;
    }
    *next += 1;
    *next - 1
}

/// Joins `tables` into one table sorted by episode and timestep. Ids derived
/// from replay names are reserved first; every other episode gets the next
/// free sequential id, in table order. Merging a merged table yields the
/// same table.
pub fn merge(
    tables: Vec<FeatureTable>,
    use_replay_derived_ids: bool,
    coerce: Option<ScalarKind>,
) -> FeatureExtractorResult<FeatureTable> {
    let num_tables = tables.len();
    let mut derived_ids: HashMap<i64, String> = HashMap::new();
    let episodes = tables
        .iter()
        .map(|table| table_episodes(table, use_replay_derived_ids, &mut derived_ids))
        .collect::<FeatureExtractorResult<Vec<_>>>()?;

    let mut merged: Option<FeatureTable> = None;
    let mut next_id = 0;
    let mut num_episodes = 0;
    for (index, (table, episodes)) in tables.into_iter().zip(episodes).enumerate() {
        let episode_col = table.require_column(EPISODE_COLUMN)?;
        let episode_ids: HashMap<Option<i64>, i64> = episodes
            .into_iter()
            .map(|(key, derived)| {
                let id = derived.unwrap_or_else(|| next_sequential_id(&mut next_id, &derived_ids));
                (key, id)
            })
            .collect();
        num_episodes += episode_ids.len();

        let mut rows = table.rows;
        for row in rows.iter_mut() {
            if let Some(id) = episode_ids.get(&row[episode_col].as_i64()) {
                row[episode_col] = FeatureValue::Int(*id);
            }
        }
        let table = FeatureTable {
            columns: table.columns,
            rows,
        };

        merged = Some(match merged {
            None => table,
            Some(mut merged) => {
                append_aligned(&mut merged, table)?;
                merged
            }
        });
        log::debug!("Merged table {}/{}", index + 1, num_tables);
    }

    let mut merged = merged.unwrap_or_else(|| {
        FeatureTable::new(
            [EPISODE_COLUMN, TIMESTEP_COLUMN, REPLAY_FILE_COLUMN]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        )
    });
    if let Some(kind) = coerce {
        coerce_feature_columns(&mut merged, kind)?;
    }
    merged.sort_by_episode()?;
    log::info!(
        "Merged {} tables into {} episodes and {} rows",
        num_tables,
        num_episodes,
        merged.len()
    );
    Ok(merged)
}

/// Appends the rows of `table`, reordering its columns to match `merged`.
fn append_aligned(merged: &mut FeatureTable, table: FeatureTable) -> FeatureExtractorResult<()> {
    let file_col = table.require_column(REPLAY_FILE_COLUMN)?;
    let order = (table.columns.len() == merged.columns.len())
        .then(|| {
            merged
                .columns
                .iter()
                .map(|column| table.column_index(column))
                .collect::<Option<Vec<_>>>()
        })
        .flatten();
    let Some(order) = order else {
        let replay_file = table
            .rows
            .first()
            .map(|row| row[file_col].to_cell())
            .unwrap_or_default();
        return FeatureExtractorError::new_result(FeatureExtractorErrorVariant::ColumnMismatch {
            replay_file,
        });
    };
    for row in table.rows {
        let mut row: Vec<Option<FeatureValue>> = row.into_iter().map(Some).collect();
        merged.push_row(
            order
                .iter()
                .map(|&i| row[i].take().unwrap_or(FeatureValue::Undefined))
                .collect(),
        )?;
    }
    Ok(())
}

/// Converts every feature column after the replay file column that holds
/// non-numeric values.
fn coerce_feature_columns(table: &mut FeatureTable, kind: ScalarKind) -> FeatureExtractorResult<()> {
    let file_col = table.require_column(REPLAY_FILE_COLUMN)?;
    let targets: Vec<usize> = (file_col + 1..table.columns.len())
        .filter(|&i| table.column(i).any(|v| !v.is_missing() && !v.is_numeric()))
        .collect();
    for row in table.rows.iter_mut() {
        for &i in targets.iter() {
            let value = std::mem::replace(&mut row[i], FeatureValue::Undefined);
            row[i] = kind.coerce(value);
        }
    }
    Ok(())
}

/// Reads every feature table in `dir`, in file name order.
pub fn load_feature_tables(dir: &Path) -> FeatureExtractorResult<Vec<(PathBuf, FeatureTable)>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_table = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(FEATURE_TABLE_EXTENSION));
        if path.is_file() && is_table {
            paths.push(path);
        }
    }
    paths.sort();
    log::info!("Loading {} feature tables from {:?}", paths.len(), dir);

    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        let table = FeatureTable::load_csv(&path)?;
        log::debug!("Loaded {:?} with {} rows", path, table.len());
        tables.push((path, table));
    }
    Ok(tables)
}
