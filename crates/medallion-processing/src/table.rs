//! CSV codec and the row/column transforms applied between tiers.
//!
//! Every column is read as text so values round-trip unchanged. Empty fields,
//! quoted or not, become missing values and blank lines are skipped.

use std::collections::{HashMap, HashSet};

use polars::prelude::*;
use thiserror::Error;

pub const SCORE_COLUMN: &str = "demo_score";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("input has no header row")]
    MissingHeader,

    #[error("data row {row} has {found} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("columns {first:?} and {second:?} both normalize to {normalized:?}")]
    DuplicateColumn {
        first: String,
        second: String,
        normalized: String,
    },
}

pub fn read_csv(bytes: &[u8]) -> Result<DataFrame, TableError> {
    let text = std::str::from_utf8(bytes)?;
    if text.trim().is_empty() {
        return Err(TableError::MissingHeader);
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let names = unique_header_names(reader.headers()?);
    if names.is_empty() {
        return Err(TableError::MissingHeader);
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > names.len() {
            return Err(TableError::RaggedRow {
                row: row + 1,
                expected: names.len(),
                found: record.len(),
            });
        }
        // Short rows are padded with missing values.
        for (index, column) in cells.iter_mut().enumerate() {
            let value = record.get(index).filter(|field| !field.is_empty());
            column.push(value.map(str::to_string));
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name.as_str().into(), values))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Repeated header names get `.1`, `.2`, ... suffixes in order of appearance.
fn unique_header_names(headers: &::csv::StringRecord) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut suffixes: HashMap<&str, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());

    for header in headers {
        let mut name = header.to_string();
        if taken.contains(&name) {
            let suffix = suffixes.entry(header).or_insert(0);
            loop {
                *suffix += 1;
                name = format!("{header}.{suffix}");
                if !taken.contains(&name) {
                    break;
                }
            }
        }
        taken.insert(name.clone());
        names.push(name);
    }
    names
}

/// Header row plus data rows, no index column.
pub fn write_csv(df: &DataFrame) -> Result<Vec<u8>, TableError> {
    let mut buffer = Vec::new();
    let mut frame = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(buffer)
}

/// Trim, lowercase, and turn inner spaces into underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

pub fn normalize_columns(mut df: DataFrame) -> Result<DataFrame, TableError> {
    let originals: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut seen: HashMap<String, String> = HashMap::with_capacity(originals.len());
    let mut normalized = Vec::with_capacity(originals.len());
    for original in &originals {
        let name = normalize_column_name(original);
        if let Some(first) = seen.insert(name.clone(), original.clone()) {
            return Err(TableError::DuplicateColumn {
                first,
                second: original.clone(),
                normalized: name,
            });
        }
        normalized.push(name);
    }

    df.set_column_names(normalized.iter().map(String::as_str))?;
    Ok(df)
}

/// Drops rows equal to an earlier row in every column. Kept rows stay in input order.
pub fn drop_duplicate_rows(df: DataFrame) -> Result<DataFrame, TableError> {
    if df.width() == 0 || df.height() < 2 {
        return Ok(df);
    }
    let unique = df
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    Ok(unique)
}

/// Non-missing cell count for each row.
pub fn row_presence_counts(df: &DataFrame) -> Vec<u32> {
    let mut counts = vec![0u32; df.height()];
    for column in df.get_columns() {
        let present = column.is_not_null();
        for (count, is_present) in counts.iter_mut().zip(&present) {
            if is_present == Some(true) {
                *count += 1;
            }
        }
    }
    counts
}

/// Copies `df` and appends `demo_score`. Returns the scored copy and the scores.
pub fn score_rows(df: &DataFrame) -> Result<(DataFrame, Vec<u32>), TableError> {
    let scores = row_presence_counts(df);
    let mut scored = df.clone();
    scored.with_column(Series::new(SCORE_COLUMN.into(), scores.clone()))?;
    Ok((scored, scores))
}

pub fn mean_score(scores: &[u32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: u64 = scores.iter().map(|&score| u64::from(score)).sum();
    total as f64 / scores.len() as f64
}

/// Facts about one silver → gold run, persisted as a one-row table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    pub source_key: String,
    pub rows: usize,
    pub columns: usize,
    pub generated_at_utc: String,
    pub demo_score_mean: f64,
}

impl RunMetrics {
    pub fn to_frame(&self) -> Result<DataFrame, TableError> {
        let frame = df!(
            "source_key" => vec![self.source_key.as_str()],
            "rows" => vec![self.rows as u64],
            "columns" => vec![self.columns as u64],
            "generated_at_utc" => vec![self.generated_at_utc.as_str()],
            "demo_score_mean" => vec![self.demo_score_mean],
        )?;
        Ok(frame)
    }
}
