use std::collections::BTreeMap;

use chrono::NaiveDate;
use secrecy::SecretString;
use serde::{Serialize, Serializer};
use url::Url;

/// A single spreadsheet cell as handed over by the ingestion layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Numeric view of the cell. Text is parsed leniently, anything else is `None`.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Text rendering of the cell, used for name-like columns.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Parsed tabular input: one header row plus data rows.
///
/// Rows may be shorter than the header; missing cells read as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// Position of the column with exactly this header.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `(row, column)`, or `Empty` when the row is short.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }
}

/// A display ratio. A zero denominator yields the `"Inf"` marker instead of a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Finite(f64),
    Infinite,
}

/// Serialized form of [`Ratio::Infinite`].
pub const INFINITE_RATIO_MARKER: &str = "Inf";

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(v) => serializer.serialize_f64(*v),
            Self::Infinite => serializer.serialize_str(INFINITE_RATIO_MARKER),
        }
    }
}

/// Whole counts go out as JSON integers, anything else as a float.
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_count<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    // 2^53: above this every f64 is integral and no longer exact.
    const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() <= EXACT_INTEGER_LIMIT {
        #[allow(clippy::cast_possible_truncation)]
        return serializer.serialize_i64(*value as i64);
    }
    serializer.serialize_f64(*value)
}

/// One selected row of the call-volume report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallVolumeRow {
    pub name: String,
    pub total_hours: f64,
    #[serde(serialize_with = "serialize_count")]
    pub missed_calls: f64,
    #[serde(serialize_with = "serialize_count")]
    pub voicemails: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound_outbound_ratio: Option<Ratio>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallVolumeReport {
    pub users: Vec<CallVolumeRow>,
}

/// Input of the inactivity report. The token is a ready-to-use bearer token.
#[derive(Debug)]
pub struct InactivityRequest {
    pub access_token: SecretString,
    pub inactivity_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InactiveUser {
    pub email: String,
    pub last_login: NaiveDate,
    pub inactive_days: i64,
    pub storage_gb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InactivityReport {
    pub results: Vec<InactiveUser>,
}

/// Input of the productivity report. Credentials are sent as HTTP basic auth.
#[derive(Debug)]
pub struct ProductivityRequest {
    /// Issue-tracker site; falls back to the module configuration when absent.
    pub site_url: Option<Url>,
    pub email: String,
    pub api_token: SecretString,
    /// Search query; falls back to the module configuration when absent.
    pub jql: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductivitySummary {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub todo: u64,
    pub overdue: u64,
    pub completion_rate: f64,
    pub completed_this_month: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub todo: u64,
    pub overdue: u64,
    pub completed_this_month: u64,
    /// Seconds.
    pub total_time_spent: u64,
    pub completion_rate: f64,
    /// Seconds per completed task.
    pub avg_time_per_task: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductivityReport {
    pub summary: ProductivitySummary,
    pub user_stats: BTreeMap<String, UserStats>,
}
