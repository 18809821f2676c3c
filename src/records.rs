//! Interaction records and the input boundary.
//!
//! External loaders (CSV readers, JSON dumps, dataframes) hand rows in as
//! maps from field name to value. [`ColumnSelector`] names the fields that
//! hold the target, the source and optionally the weight, and turns every
//! row into a narrow [`Interaction`]. Anything else in the row is ignored.
//!
//! ```
//! use ideospace::records::{ColumnSelector, RawRecord};
//! use serde_json::json;
//!
//! let rows: Vec<RawRecord> = vec![
//!     serde_json::from_value(json!({"user": "a", "outlet": "x", "lang": "en"})).unwrap(),
//!     serde_json::from_value(json!({"user": "a", "outlet": "y"})).unwrap(),
//! ];
//! let selector = ColumnSelector::new("user", "outlet");
//! let records = selector.extract(&rows).unwrap();
//! assert_eq!(records[1].source, "y");
//! assert!(records[0].weight.is_none());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{IdeologyError, Result};

use log::{debug, trace};

/// One row of the caller's table: field name to JSON-like value.
pub type RawRecord = Map<String, Value>;

/// A single target -> source interaction.
///
/// Unweighted tables may repeat a (target, source) pair, each row counting
/// as one interaction. Weighted tables carry one row per pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub target: String,
    pub source: String,
    pub weight: Option<f64>,
}

impl Interaction {
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
            weight: None,
        }
    }

    pub fn weighted(target: impl Into<String>, source: impl Into<String>, weight: f64) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
            weight: Some(weight),
        }
    }

    /// Interaction mass: the explicit weight, or 1 for a plain row.
    #[inline]
    pub fn mass(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// Field names identifying target, source and (optionally) weight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelector {
    pub targets: String,
    pub sources: String,
    pub weight: Option<String>,
}

impl Default for ColumnSelector {
    fn default() -> Self {
        Self {
            targets: "target".to_string(),
            sources: "source".to_string(),
            weight: None,
        }
    }
}

impl ColumnSelector {
    pub fn new(targets: impl Into<String>, sources: impl Into<String>) -> Self {
        Self {
            targets: targets.into(),
            sources: sources.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    /// Validate every row and project it onto an [`Interaction`].
    pub fn extract(&self, rows: &[RawRecord]) -> Result<Vec<Interaction>> {
        debug!(
            "Extracting {} rows with selector targets={:?} sources={:?} weight={:?}",
            rows.len(),
            self.targets,
            self.sources,
            self.weight
        );

        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                let target = identifier(row, &self.targets, idx)?;
                let source = identifier(row, &self.sources, idx)?;
                let weight = match &self.weight {
                    Some(field) => Some(weight_value(row, field, idx)?),
                    None => None,
                };
                trace!("row {}: {} -> {} ({:?})", idx, target, source, weight);
                Ok(Interaction {
                    target,
                    source,
                    weight,
                })
            })
            .collect()
    }
}

/// Fail unless every record carries an explicit weight.
pub fn require_weights(records: &[Interaction]) -> Result<()> {
    match records.iter().position(|r| r.weight.is_none()) {
        Some(row) => Err(IdeologyError::schema(
            row,
            "weighted mode requested but the record has no weight",
        )),
        None => Ok(()),
    }
}

/// Detect the table's mode. Mixed tables are rejected.
pub(crate) fn is_weighted(records: &[Interaction]) -> Result<bool> {
    let weighted = records.first().is_some_and(|r| r.weight.is_some());
    if let Some(row) = records
        .iter()
        .position(|r| r.weight.is_some() != weighted)
    {
        return Err(IdeologyError::schema(
            row,
            "table mixes weighted and unweighted records",
        ));
    }
    if weighted {
        for (row, r) in records.iter().enumerate() {
            let w = r.mass();
            if !w.is_finite() || w < 0.0 {
                return Err(IdeologyError::schema(
                    row,
                    format!("weight must be finite and non-negative, got {}", w),
                ));
            }
        }
    }
    Ok(weighted)
}

fn identifier(row: &RawRecord, field: &str, idx: usize) -> Result<String> {
    match row.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(IdeologyError::schema(
            idx,
            format!("field `{}` must be a string or number, got {}", field, other),
        )),
        None => Err(IdeologyError::schema(
            idx,
            format!("missing required field `{}`", field),
        )),
    }
}

fn weight_value(row: &RawRecord, field: &str, idx: usize) -> Result<f64> {
    let w = match row.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => {
            return Err(IdeologyError::schema(
                idx,
                format!("missing weight field `{}`", field),
            ))
        }
    };
    match w {
        Some(w) if w.is_finite() && w >= 0.0 => Ok(w),
        _ => Err(IdeologyError::schema(
            idx,
            format!("weight field `{}` must be a non-negative number", field),
        )),
    }
}
