use std::backtrace::Backtrace;
use std::path::PathBuf;
use thiserror::Error;

/// [`FeatureExtractorErrorVariant`] enumerates everything that can go wrong
/// while resolving a configuration, driving the extractors over a replay or
/// merging the resulting tables. Configuration variants are fatal and are
/// raised before any replay is processed; the rest are scoped to a single
/// replay or input file.
#[derive(Error, Debug)]
pub enum FeatureExtractorErrorVariant {
    #[error("{reference:?} is not a known unit type")]
    UnknownUnitType { reference: String },

    #[error("{name:?} is not a unit group defined in the configuration")]
    UnknownUnitGroup { name: String },

    #[error("Group {group:?} references {member:?}, which is itself a group")]
    NestedGroupReference { group: String, member: String },

    #[error("Group {group:?} has no unit types")]
    EmptyGroup { group: String },

    #[error("Missing parameter {parameter:?} for the {extractor} extractor")]
    MissingParameter {
        extractor: &'static str,
        parameter: String,
    },

    #[error("Invalid value for {parameter:?}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("{0:?} was not a recognized feature extractor")]
    UnknownExtractorName(String),

    #[error("Episode id {episode} derived from {replay_file:?} was already used by another episode")]
    DuplicateEpisodeId { episode: i64, replay_file: String },

    #[error("Table has no {column:?} column")]
    MissingColumn { column: &'static str },

    #[error("Table from {replay_file:?} does not have the columns of the first table")]
    ColumnMismatch { replay_file: String },

    #[error("Row has {actual} values, expected {expected}")]
    RowLengthMismatch { expected: usize, actual: usize },

    #[error("Replay {0:?} not found")]
    ReplayNotFound(PathBuf),

    #[error("Replay directory {0:?} does not exist")]
    ReplayDirectoryNotFound(PathBuf),

    #[error("Replay {path:?} has no observations recorded for player {player_id}")]
    PerspectiveNotRecorded { path: PathBuf, player_id: u32 },

    #[error("{operation} called while the collector was {state}")]
    InvalidCollectorState {
        operation: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FeatureExtractorErrorVariant {
    /// Whether this error invalidates the whole run rather than a single
    /// replay or input file.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownUnitType { .. }
                | Self::UnknownUnitGroup { .. }
                | Self::NestedGroupReference { .. }
                | Self::EmptyGroup { .. }
                | Self::MissingParameter { .. }
                | Self::InvalidParameter { .. }
                | Self::UnknownExtractorName(_)
                | Self::DuplicateEpisodeId { .. }
        )
    }
}

/// [`FeatureExtractorError`] pairs a [`FeatureExtractorErrorVariant`] with the
/// backtrace captured where it was raised.
#[derive(Debug)]
pub struct FeatureExtractorError {
    pub backtrace: Backtrace,
    pub variant: FeatureExtractorErrorVariant,
}

impl FeatureExtractorError {
    pub fn new(variant: FeatureExtractorErrorVariant) -> Self {
        Self {
            backtrace: Backtrace::capture(),
            variant,
        }
    }

    pub fn new_result<T>(variant: FeatureExtractorErrorVariant) -> Result<T, Self> {
        Err(Self::new(variant))
    }
}

impl std::fmt::Display for FeatureExtractorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.variant.fmt(f)
    }
}

impl std::error::Error for FeatureExtractorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.variant.source()
    }
}

impl From<FeatureExtractorErrorVariant> for FeatureExtractorError {
    fn from(variant: FeatureExtractorErrorVariant) -> Self {
        Self::new(variant)
    }
}

macro_rules! wrap_foreign_error {
    ($( $source:ty ),* $(,)?) => {
        $(
            impl From<$source> for FeatureExtractorError {
                fn from(err: $source) -> Self {
                    Self::new(err.into())
                }
            }
        )*
    };
}

wrap_foreign_error!(std::io::Error, csv::Error, serde_json::Error);

#[allow(clippy::result_large_err)]
pub type FeatureExtractorResult<T> = Result<T, FeatureExtractorError>;
