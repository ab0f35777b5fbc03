use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use serde::Serialize;
use tracing::info;

use crate::source::{SourceError, SourceFormat, read_source};

pub const PROVINCE_COLUMN: &str = "Provinsi";
pub const PURCHASE_COLUMN: &str = "Pembelian Terbesar";
pub const SALE_COLUMN: &str = "Penjualan Terbesar";

/// One province's trade statistics, as written in the source sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeRecord {
    pub province: String,
    pub purchase_partner: String,
    pub sale_partner: String,
}

/// The loaded trade sheet.
///
/// `headers` and `rows` keep every column exactly as read (for display);
/// `records` holds the three columns the map needs, one per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub records: Vec<TradeRecord>,
}

impl TradeTable {
    /// Builds a table from raw text rows. The first non-blank row is the header.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, String> {
        let mut rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));

        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| "sheet has no header row".to_string())?
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let province_ix = column_index(&headers, PROVINCE_COLUMN)?;
        let purchase_ix = column_index(&headers, PURCHASE_COLUMN)?;
        let sale_ix = column_index(&headers, SALE_COLUMN)?;

        let mut out_rows = Vec::new();
        let mut records = Vec::new();
        for mut row in rows {
            row.resize(headers.len().max(row.len()), String::new());
            records.push(TradeRecord {
                province: row[province_ix].clone(),
                purchase_partner: row[purchase_ix].clone(),
                sale_partner: row[sale_ix].clone(),
            });
            out_rows.push(row);
        }

        Ok(Self {
            headers,
            rows: out_rows,
            records,
        })
    }

    /// Reads the first worksheet of an xlsx/xls/ods workbook.
    pub fn from_spreadsheet_bytes(bytes: &[u8]) -> Result<Self, String> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| format!("invalid workbook: {e}"))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| "workbook has no worksheets".to_string())?
            .map_err(|e| format!("invalid worksheet: {e}"))?;

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Self::from_rows(rows)
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| format!("CSV error on record {}: {e}", line + 1))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Self::from_rows(rows)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn load_trade_table(path: impl AsRef<Path>) -> Result<TradeTable, SourceError> {
    let path = path.as_ref();
    let bytes = read_source(path)?;
    parse_trade_table(path, &bytes)
}

/// Parses already-read bytes; `path` picks the decoder and labels errors.
pub fn parse_trade_table(path: &Path, bytes: &[u8]) -> Result<TradeTable, SourceError> {
    let table = match SourceFormat::from_path(path) {
        Some(SourceFormat::Spreadsheet) => TradeTable::from_spreadsheet_bytes(bytes),
        Some(SourceFormat::Csv) => TradeTable::from_csv_bytes(bytes),
        _ => {
            return Err(SourceError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    }
    .map_err(|reason| SourceError::parse(path, reason))?;

    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers.len(),
        "loaded trade table"
    );
    Ok(table)
}

fn column_index(headers: &[String], name: &str) -> Result<usize, String> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| format!("missing required column: {name}"))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Integral floats print without the trailing ".0" a spreadsheet never shows.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
