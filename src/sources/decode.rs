use calamine::{Data, Reader};
use std::io::Cursor;
use tracing::debug;

use crate::error::SourceError;
use crate::models::{Cell, Dataset, SheetFormat, WorksheetSelector};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode a downloaded body according to its format
pub fn decode(
    bytes: &[u8],
    format: SheetFormat,
    worksheet: &WorksheetSelector,
) -> Result<Dataset, SourceError> {
    match format {
        SheetFormat::Csv => decode_csv(bytes),
        SheetFormat::Xlsx => decode_xlsx(bytes, worksheet),
    }
}

/// Parse a CSV body whose first record is the header row
pub fn decode_csv(bytes: &[u8]) -> Result<Dataset, SourceError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.is_empty() {
        return Err(SourceError::NoHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    debug!("Decoded CSV with {} columns and {} rows", columns.len(), rows.len());
    Ok(Dataset::new(columns, rows))
}

/// Parse an XLSX/ODS workbook and read the selected worksheet
pub fn decode_xlsx(bytes: &[u8], worksheet: &WorksheetSelector) -> Result<Dataset, SourceError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let names = workbook.sheet_names();

    let name = pick_worksheet(&names, worksheet)
        .ok_or_else(|| SourceError::WorksheetNotFound(describe(worksheet)))?;
    debug!("Reading worksheet '{}' of {:?}", name, names);

    let range = workbook.worksheet_range(&name)?;
    let mut rows_iter = range.rows();

    let columns: Vec<String> = match rows_iter.next() {
        Some(header) => header.iter().map(|c| c.to_string()).collect(),
        None => return Err(SourceError::NoHeader),
    };

    let rows = rows_iter
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();

    Ok(Dataset::new(columns, rows))
}

fn pick_worksheet(names: &[String], selector: &WorksheetSelector) -> Option<String> {
    match selector {
        WorksheetSelector::Default => names.first().cloned(),
        WorksheetSelector::Index(i) => names.get(*i).cloned(),
        WorksheetSelector::Last => names.last().cloned(),
        WorksheetSelector::Title(title) => names
            .iter()
            .find(|n| n.trim() == title.trim())
            .cloned(),
    }
}

fn describe(selector: &WorksheetSelector) -> String {
    match selector {
        WorksheetSelector::Default => "(first)".to_string(),
        WorksheetSelector::Index(i) => format!("#{}", i),
        WorksheetSelector::Last => "(last)".to_string(),
        WorksheetSelector::Title(t) => format!("'{}'", t),
    }
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) if f.is_finite() => Cell::Number(*f),
        Data::Float(_) | Data::Empty | Data::Error(_) => Cell::Missing,
        Data::String(s) => Cell::from_text(s),
        other => Cell::from_text(&other.to_string()),
    }
}
