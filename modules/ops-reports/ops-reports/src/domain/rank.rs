//! Threshold selection and ordering of report rows.

use ops_reports_sdk::models::{CallVolumeRow, InactiveUser, Ratio, Table};

use super::error::DomainError;
use super::numeric::round_to;
use super::timefmt::parse_hms_seconds;

pub const NAME_COLUMN: &str = "Name";
pub const TOTAL_DURATION_COLUMN: &str = "Total Duration";
pub const MISSED_CALLS_COLUMN: &str = "Missed Calls";
pub const VOICEMAILS_COLUMN: &str = "Voicemails";
pub const INBOUND_CALLS_COLUMN: &str = "Inbound Calls";
pub const OUTBOUND_CALLS_COLUMN: &str = "Outbound Calls";

/// Quantile used for both selection thresholds.
pub const HIGH_VOLUME_QUANTILE: f64 = 0.75;

/// A call-volume row together with the secondary ranking key.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCallRow {
    pub row: CallVolumeRow,
    pub missed_or_voicemail: f64,
}

struct CallColumns {
    name: usize,
    duration: usize,
    missed: usize,
    voicemails: usize,
    ratio: Option<(usize, usize)>,
}

impl CallColumns {
    fn locate(table: &Table) -> Result<Self, DomainError> {
        let required = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| DomainError::missing_column(column))
        };
        Ok(Self {
            name: required(NAME_COLUMN)?,
            duration: required(TOTAL_DURATION_COLUMN)?,
            missed: required(MISSED_CALLS_COLUMN)?,
            voicemails: required(VOICEMAILS_COLUMN)?,
            ratio: table
                .column_index(INBOUND_CALLS_COLUMN)
                .zip(table.column_index(OUTBOUND_CALLS_COLUMN)),
        })
    }
}

/// `inbound / outbound` to two decimals, or the infinite marker for no outbound calls.
#[must_use]
pub fn call_ratio(inbound: f64, outbound: f64) -> Ratio {
    if outbound == 0.0 {
        return Ratio::Infinite;
    }
    Ratio::Finite(round_to(inbound / outbound, 2))
}

/// Derive per-row metrics from an uploaded call log.
///
/// # Errors
/// `MissingColumn` naming the first required column the header lacks.
pub fn score_call_rows(table: &Table) -> Result<Vec<ScoredCallRow>, DomainError> {
    let cols = CallColumns::locate(table)?;
    let numeric = |row: usize, col: usize| table.cell(row, col).as_number().unwrap_or(0.0);

    let rows = (0..table.rows.len())
        .map(|i| {
            let seconds = parse_hms_seconds(&table.cell(i, cols.duration).to_text());
            let missed_calls = numeric(i, cols.missed);
            let voicemails = numeric(i, cols.voicemails);
            #[allow(clippy::cast_precision_loss)]
            let total_hours = round_to(seconds as f64 / 3600.0, 2);
            ScoredCallRow {
                row: CallVolumeRow {
                    name: table.cell(i, cols.name).to_text(),
                    total_hours,
                    missed_calls,
                    voicemails,
                    inbound_outbound_ratio: cols
                        .ratio
                        .map(|(inbound, outbound)| call_ratio(numeric(i, inbound), numeric(i, outbound))),
                },
                missed_or_voicemail: missed_calls + voicemails,
            }
        })
        .collect();
    Ok(rows)
}

/// Quantile `q` of `values` with linear interpolation between the closest ranks.
#[must_use]
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let (lower, upper, fraction) = {
        let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lower = position.floor();
        (lower as usize, position.ceil() as usize, position - lower)
    };
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Keep rows at or above the 75th percentile of either hours or missed+voicemail,
/// busiest first.
#[must_use]
pub fn select_high_volume(rows: Vec<ScoredCallRow>) -> Vec<CallVolumeRow> {
    let hours: Vec<f64> = rows.iter().map(|r| r.row.total_hours).collect();
    let missed: Vec<f64> = rows.iter().map(|r| r.missed_or_voicemail).collect();
    let (Some(hours_threshold), Some(missed_threshold)) = (
        percentile(&hours, HIGH_VOLUME_QUANTILE),
        percentile(&missed, HIGH_VOLUME_QUANTILE),
    ) else {
        return Vec::new();
    };

    let mut selected: Vec<ScoredCallRow> = rows
        .into_iter()
        .filter(|r| r.row.total_hours >= hours_threshold || r.missed_or_voicemail >= missed_threshold)
        .collect();
    selected.sort_by(|a, b| {
        b.row
            .total_hours
            .total_cmp(&a.row.total_hours)
            .then(b.missed_or_voicemail.total_cmp(&a.missed_or_voicemail))
    });
    selected.into_iter().map(|r| r.row).collect()
}

/// Largest storage footprint first; ties keep their enrichment order.
pub fn order_by_storage(users: &mut [InactiveUser]) {
    users.sort_by(|a, b| b.storage_gb.total_cmp(&a.storage_gb));
}
