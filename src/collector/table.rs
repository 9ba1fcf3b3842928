use std::io::{Read, Write};
use std::path::Path;

use crate::*;

/// A row-oriented table of feature values with named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FeatureValue>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(
        columns: Vec<String>,
        rows: Vec<Vec<FeatureValue>>,
    ) -> FeatureExtractorResult<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<FeatureValue>) -> FeatureExtractorResult<()> {
        if row.len() != self.columns.len() {
            return FeatureExtractorError::new_result(
                FeatureExtractorErrorVariant::RowLengthMismatch {
                    expected: self.columns.len(),
                    actual: row.len(),
                },
            );
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn require_column(&self, name: &'static str) -> FeatureExtractorResult<usize> {
        self.column_index(name).ok_or_else(|| {
            FeatureExtractorError::new(FeatureExtractorErrorVariant::MissingColumn {
                column: name,
            })
        })
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &FeatureValue> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Places the columns of `other` to the right of this table's. Both
    /// tables must have the same number of rows.
    pub fn hstack(mut self, other: FeatureTable) -> FeatureExtractorResult<Self> {
        if self.rows.len() != other.rows.len() {
            return FeatureExtractorError::new_result(
                FeatureExtractorErrorVariant::RowLengthMismatch {
                    expected: self.rows.len(),
                    actual: other.rows.len(),
                },
            );
        }
        self.columns.extend(other.columns);
        for (row, extra) in self.rows.iter_mut().zip(other.rows) {
            row.extend(extra);
        }
        Ok(self)
    }

    /// `(episode, timestep)` of every row.
    pub fn episode_keys(&self) -> FeatureExtractorResult<Vec<(Option<i64>, Option<i64>)>> {
        let episode = self.require_column(EPISODE_COLUMN)?;
        let timestep = self.require_column(TIMESTEP_COLUMN)?;
        Ok(self
            .rows
            .iter()
            .map(|row| (row[episode].as_i64(), row[timestep].as_i64()))
            .collect())
    }

    /// Stable sort of the rows by ascending `(episode, timestep)`.
    pub fn sort_by_episode(&mut self) -> FeatureExtractorResult<()> {
        let episode = self.require_column(EPISODE_COLUMN)?;
        let timestep = self.require_column(TIMESTEP_COLUMN)?;
        self.rows
            .sort_by_key(|row| (row[episode].as_i64(), row[timestep].as_i64()));
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> FeatureExtractorResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in self.rows.iter() {
            writer.write_record(row.iter().map(FeatureValue::to_cell))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_csv<R: Read>(reader: R) -> FeatureExtractorResult<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut table = Self::new(columns);
        for record in reader.records() {
            table.push_row(record?.iter().map(FeatureValue::parse).collect())?;
        }
        Ok(table)
    }

    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> FeatureExtractorResult<()> {
        self.write_csv(std::fs::File::create(path)?)
    }

    pub fn load_csv<P: AsRef<Path>>(path: P) -> FeatureExtractorResult<Self> {
        Self::read_csv(std::fs::File::open(path)?)
    }
}
