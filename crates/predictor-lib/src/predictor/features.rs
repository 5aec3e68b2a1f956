//! Feature alignment for ML inference
//!
//! Turns the three raw form values into a single feature row whose columns
//! are exactly the training schema, in schema order. The station id is
//! one-hot encoded as `id_<station>`; every schema column the request does
//! not supply is filled with 0 and every encoded column the schema does not
//! know is dropped.

use crate::error::{PredictorError, Result};
use crate::models::{FeatureRow, RawInput};
use crate::schema::{station_column, SchemaColumns, MONTH_COLUMN, YEAR_COLUMN};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do when a station has no one-hot column in the schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StationPolicy {
    /// Leave every station column at 0 and predict anyway
    #[default]
    ZeroFill,
    /// Fail the request with `PredictorError::UnknownStation`
    Reject,
}

impl StationPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            StationPolicy::Reject
        } else {
            StationPolicy::ZeroFill
        }
    }
}

/// Columns touched while reconciling a request against the schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentReport {
    /// Schema columns missing from the request, filled with 0
    pub inserted: Vec<String>,
    /// Request columns unknown to the schema
    pub dropped: Vec<String>,
    pub unknown_station: bool,
}

/// Aligns raw input to the schema the model was fit on
#[derive(Debug, Clone)]
pub struct FeatureAligner {
    schema: Arc<SchemaColumns>,
    policy: StationPolicy,
}

impl FeatureAligner {
    pub fn new(schema: Arc<SchemaColumns>) -> Self {
        Self {
            schema,
            policy: StationPolicy::default(),
        }
    }

    pub fn with_policy(schema: Arc<SchemaColumns>, policy: StationPolicy) -> Self {
        Self { schema, policy }
    }

    pub fn schema(&self) -> &SchemaColumns {
        &self.schema
    }

    pub fn policy(&self) -> StationPolicy {
        self.policy
    }

    pub fn align(&self, input: &RawInput) -> Result<(FeatureRow, AlignmentReport)> {
        let station_known = self.schema.knows_station(input.station_id);
        if !station_known && self.policy == StationPolicy::Reject {
            return Err(PredictorError::UnknownStation {
                station_id: input.station_id,
            });
        }

        let encoded = one_hot(input);
        let (row, mut report) = reconcile(&encoded, &self.schema);
        report.unknown_station = !station_known;

        if report.unknown_station {
            warn!(
                event = "unknown_station",
                station_id = input.station_id,
                "Station has no column in the model schema, all station columns left at 0"
            );
        }
        debug!(
            columns = ?row.columns(),
            inserted = report.inserted.len(),
            dropped = ?report.dropped,
            "Aligned feature row"
        );

        Ok((row, report))
    }
}

/// Encode the request as `year`, `month` and a single active station column
fn one_hot(input: &RawInput) -> Vec<(String, f64)> {
    vec![
        (YEAR_COLUMN.to_string(), input.year as f64),
        (MONTH_COLUMN.to_string(), input.month as f64),
        (station_column(input.station_id), 1.0),
    ]
}

/// Insert missing schema columns as 0, drop unknown ones and order the
/// result exactly as the schema
pub fn reconcile(encoded: &[(String, f64)], schema: &SchemaColumns) -> (FeatureRow, AlignmentReport) {
    let supplied: HashMap<&str, f64> = encoded.iter().map(|(c, v)| (c.as_str(), *v)).collect();

    let dropped: Vec<String> = encoded
        .iter()
        .filter(|(c, _)| !schema.contains(c))
        .map(|(c, _)| c.clone())
        .collect();

    let mut inserted = Vec::new();
    let values: Vec<f64> = schema
        .columns()
        .iter()
        .map(|column| match supplied.get(column.as_str()) {
            Some(value) => *value,
            None => {
                inserted.push(column.clone());
                0.0
            }
        })
        .collect();

    let row = FeatureRow::from_parts(schema.columns().to_vec(), values);
    let report = AlignmentReport {
        inserted,
        dropped,
        unknown_station: false,
    };
    (row, report)
}
