//! CSV ingest and validation.
//!
//! This module is responsible for turning a core-loss measurement CSV into a
//! clean set of `Measurement`s that are safe to fit.
//!
//! Design goals:
//! - **Lenient headers**: a column is used when its normalized name *starts
//!   with* `coreloss`, `bac` or `fs` (so `Bac (T)` or `fs_kHz` match)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (input order is preserved)
//! - **Separation of concerns**: no fitting logic here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{DatasetStats, Measurement};
use crate::error::AppError;
use crate::fit::MIN_POINTS;

/// Column name prefixes, in `Measurement` field order.
pub const REQUIRED_FIELDS: [&str; 3] = ["coreloss", "bac", "fs"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated points + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    /// Where the rows came from (path or label), for reports.
    pub source: String,
    pub points: Vec<Measurement>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    coreloss: usize,
    bac: usize,
    fs: usize,
}

/// Load and validate a measurement CSV from disk.
pub fn load_measurements(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    load_measurements_from_reader(file, &path.display().to_string())
}

/// Header-level summary of a measurement CSV (no value parsing).
#[derive(Debug, Clone, PartialEq)]
pub struct CsvPreview {
    /// Header names as written in the file, in `REQUIRED_FIELDS` order.
    pub columns: [String; 3],
    /// Non-empty data records, valid or not.
    pub records: usize,
}

/// Check that a CSV carries the measurement columns and count its records.
pub fn preview_csv(path: &Path) -> Result<CsvPreview, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    preview_reader(file)
}

fn preview_reader<R: Read>(input: R) -> Result<CsvPreview, AppError> {
    let mut reader = measurement_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let map = resolve_columns(&headers)?;
    let name = |idx: usize| {
        headers
            .get(idx)
            .unwrap_or_default()
            .trim_start_matches('\u{feff}')
            .to_string()
    };

    let records = reader
        .records()
        .filter_map(Result::ok)
        .filter(|r| !r.iter().all(str::is_empty))
        .count();

    Ok(CsvPreview {
        columns: [name(map.coreloss), name(map.bac), name(map.fs)],
        records,
    })
}

fn measurement_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Load and validate measurements from any CSV reader.
pub fn load_measurements_from_reader<R: Read>(input: R, source: &str) -> Result<IngestedData, AppError> {
    let mut reader = measurement_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let columns = resolve_columns(&headers)?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows_read += 1;
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows_read += 1;

        match parse_row(&record, columns) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        warn!(source, line = err.line, "skipping row: {}", err.message);
    }

    let rows_used = points.len();
    if rows_used < MIN_POINTS {
        return Err(AppError::new(
            3,
            format!(
                "Not enough valid data points in '{source}': need at least {MIN_POINTS} rows with positive numeric values, got {rows_used}."
            ),
        ));
    }

    let stats = DatasetStats::from_measurements(&points)
        .ok_or_else(|| AppError::new(3, "No valid points remain after validation."))?;

    info!(source, rows_read, rows_used, "measurements loaded");

    Ok(IngestedData {
        source: source.to_string(),
        points,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap, AppError> {
    let normalized: Vec<String> = headers.iter().map(normalize_header_name).collect();
    let find = |field: &str| normalized.iter().position(|h| h.starts_with(field));

    let mut missing = Vec::new();
    let mut found = [0usize; 3];
    for (slot, field) in found.iter_mut().zip(REQUIRED_FIELDS) {
        match find(field) {
            Some(idx) => *slot = idx,
            None => missing.push(field),
        }
    }

    if !missing.is_empty() {
        return Err(AppError::new(
            2,
            format!("CSV must contain columns starting with: {}.", missing.join(", ")),
        ));
    }

    Ok(ColumnMap {
        coreloss: found[0],
        bac: found[1],
        fs: found[2],
    })
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, the first column never matches.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, columns: ColumnMap) -> Result<Measurement, String> {
    let coreloss = parse_positive(record, columns.coreloss, "coreloss")?;
    let bac = parse_positive(record, columns.bac, "bac")?;
    let fs = parse_positive(record, columns.fs, "fs")?;
    Ok(Measurement::new(coreloss, bac, fs))
}

fn parse_positive(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{name}` value."))?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(format!(
            "Invalid `{name}` value '{raw}': must be a positive number."
        )),
    }
}
