//! Uploaded workbook bytes to a [`Table`], using the first sheet.

use std::io::{Cursor, Read, Seek};

use calamine::{Data, Range, Reader, Xls, Xlsb, Xlsx};
use ops_reports_sdk::models::{CellValue, Table};
use tracing::{debug, instrument};

use crate::domain::error::DomainError;

/// Parse `bytes` as XLSX, XLS or XLSB, off the async executor.
///
/// # Errors
/// `InvalidSpreadsheet` when no supported format matches or the workbook has no sheet.
#[instrument(skip_all, fields(size = bytes.len()))]
pub async fn parse_table(bytes: bytes::Bytes) -> Result<Table, DomainError> {
    tokio::task::spawn_blocking(move || table_from_bytes(&bytes))
        .await
        .map_err(|e| DomainError::Internal(anyhow::anyhow!("spreadsheet task failed: {e}")))?
}

fn table_from_bytes(bytes: &[u8]) -> Result<Table, DomainError> {
    let cursor = Cursor::new(bytes);

    if let Ok(mut workbook) = Xlsx::new(cursor.clone()) {
        return first_sheet(&mut workbook);
    }
    if let Ok(mut workbook) = Xls::new(cursor.clone()) {
        return first_sheet(&mut workbook);
    }
    if let Ok(mut workbook) = Xlsb::new(cursor) {
        return first_sheet(&mut workbook);
    }

    Err(DomainError::InvalidSpreadsheet(
        "file is not a readable XLSX, XLS or XLSB workbook".to_owned(),
    ))
}

fn first_sheet<RS: Read + Seek, R: Reader<RS>>(workbook: &mut R) -> Result<Table, DomainError> {
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DomainError::InvalidSpreadsheet("workbook has no sheets".to_owned()))?
        .map_err(|e| DomainError::InvalidSpreadsheet(format!("first sheet unreadable: {e:?}")))?;
    Ok(range_to_table(&range))
}

/// First row is the header; blank rows are skipped.
fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Table::default();
    };
    let columns = header.iter().map(|cell| convert_cell(cell).to_text()).collect();
    let rows: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| *cell != CellValue::Empty))
        .collect();
    debug!(rows = rows.len(), "spreadsheet parsed");
    Table::new(columns, rows)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        // Time-of-day and duration cells are day fractions; render them the way a
        // call log prints them.
        Data::DateTime(dt) => CellValue::Text(day_fraction_to_hms(dt.as_f64())),
    }
}

/// `0.0625` (1.5 hours) to `1:30:00`. Whole days roll into the hour field.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn day_fraction_to_hms(days: f64) -> String {
    let total = (days.max(0.0) * 86_400.0).round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}
