//! Column schema the model was fit on
//!
//! The schema is an ordered list of column names. Raw numeric columns
//! (`year`, `month`) sit alongside one-hot station columns named
//! `id_<station>`. Both the column set and the column order are part of the
//! contract with the model.

use crate::error::{PredictorError, Result};
use serde::Serialize;
use std::collections::HashMap;

pub const YEAR_COLUMN: &str = "year";
pub const MONTH_COLUMN: &str = "month";
pub const STATION_PREFIX: &str = "id_";

/// Name of the one-hot column for a station
pub fn station_column(station_id: i64) -> String {
    format!("{}{}", STATION_PREFIX, station_id)
}

/// Parse the station id out of an `id_<n>` column name
pub fn parse_station_column(column: &str) -> Option<i64> {
    column.strip_prefix(STATION_PREFIX)?.parse().ok()
}

/// Ordered, immutable feature schema
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct SchemaColumns {
    columns: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl SchemaColumns {
    /// Build a schema, rejecting empty, blank or duplicate column names
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(PredictorError::InvalidInput(
                "schema has no columns".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            if column.trim().is_empty() {
                return Err(PredictorError::InvalidInput(format!(
                    "schema column {} has an empty name",
                    idx
                )));
            }
            if positions.insert(column.clone(), idx).is_some() {
                return Err(PredictorError::InvalidInput(format!(
                    "schema column {:?} appears more than once",
                    column
                )));
            }
        }

        Ok(Self { columns, positions })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Station ids that have a one-hot column, in schema order
    pub fn station_ids(&self) -> Vec<i64> {
        self.columns
            .iter()
            .filter_map(|c| parse_station_column(c))
            .collect()
    }

    pub fn knows_station(&self, station_id: i64) -> bool {
        self.contains(&station_column(station_id))
    }

    /// Check that a column list matches this schema exactly, in order
    pub fn check_layout(&self, columns: &[String]) -> Result<()> {
        if columns == self.columns.as_slice() {
            return Ok(());
        }
        Err(PredictorError::SchemaMismatch {
            expected: format!("{} columns {:?}", self.columns.len(), self.columns),
            actual: format!("{} columns {:?}", columns.len(), columns),
        })
    }
}

impl PartialEq for SchemaColumns {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

#[cfg(test)]
pub(crate) fn training_schema() -> SchemaColumns {
    let mut columns = vec![YEAR_COLUMN.to_string(), MONTH_COLUMN.to_string()];
    columns.extend((1..=22).map(station_column));
    SchemaColumns::new(columns).unwrap()
}
