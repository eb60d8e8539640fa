//! CSV Data Loader Module
//! Reads the incident CSV (legacy Korean encoding) with Polars and converts
//! every row into a typed `IncidentRecord`.

use super::record::{Cause, Dataset, IncidentRecord};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use encoding_rs::Encoding;
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source column names.
pub mod columns {
    pub const REGION: &str = "관할해경서";
    pub const SEA_AREA: &str = "발생해역";
    pub const CAUSE: &str = "발생원인";
    pub const VESSEL_TYPE: &str = "선 종";
    pub const VESSEL_COUNT: &str = "사고선박수";
    pub const PERSONS: &str = "발생인원";
    pub const OCCURRED_AT: &str = "발생일시";
    pub const LATITUDE: &str = "위도";
    pub const LONGITUDE: &str = "경도";
    pub const INCIDENT_TYPE: &str = "발생유형";
}

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M",
    "%Y%m%d%H%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Input is not valid {0}")]
    Encoding(&'static str),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("Row {row}, column `{column}`: value is missing")]
    MissingValue { row: usize, column: &'static str },
    #[error("Row {row}, column `{column}`: invalid coordinate `{value}` (expected D|M|S)")]
    InvalidCoordinate {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("Row {row}, column `{column}`: invalid integer `{value}`")]
    InvalidInteger {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("Row {row}, column `{column}`: invalid datetime `{value}`")]
    InvalidDateTime {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("No data rows in input")]
    NoData,
}

/// Convert a `D|M|S` coordinate string to decimal degrees.
///
/// Returns `None` unless the value splits into exactly three integer parts.
pub fn parse_dms(value: &str) -> Option<f64> {
    let mut parts = value.split('|');
    let mut next = || parts.next().and_then(|p| p.trim().parse::<i32>().ok());

    let degrees = next()?;
    let minutes = next()?;
    let seconds = next()?;
    if parts.next().is_some() {
        return None;
    }

    Some(f64::from(degrees) + f64::from(minutes) / 60.0 + f64::from(seconds) / 3600.0)
}

/// Parse an occurrence timestamp in any of the layouts the source uses.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Parse a count cell. Empty cells count as zero; `3.0` is accepted as 3.
fn parse_count(value: Option<&str>) -> Option<i64> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Some(0);
    }
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// Loads the incident dataset. Any failure is fatal: there is no partial load.
pub struct DataLoader;

impl DataLoader {
    /// Read, decode and parse the CSV at `path`.
    pub fn load(path: &Path, encoding: &'static Encoding) -> Result<Dataset, LoaderError> {
        let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        let text = Self::decode(&bytes, encoding)?;
        Self::parse_str(&text)
    }

    /// Decode raw bytes. A BOM takes precedence over the configured encoding.
    pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> Result<String, LoaderError> {
        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(LoaderError::Encoding(used.name()));
        }
        Ok(text.into_owned())
    }

    /// Parse decoded CSV text into a dataset.
    pub fn parse_str(text: &str) -> Result<Dataset, LoaderError> {
        // Every column as String; typing happens per row below.
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
            .finish()?;

        if df.height() == 0 {
            return Err(LoaderError::NoData);
        }

        let records = Self::to_records(&df)?;
        Ok(Dataset::from_records(records))
    }

    fn to_records(df: &DataFrame) -> Result<Vec<IncidentRecord>, LoaderError> {
        let region = string_column(df, columns::REGION)?;
        let sea_area = string_column(df, columns::SEA_AREA)?;
        let cause = string_column(df, columns::CAUSE)?;
        let vessel_type = string_column(df, columns::VESSEL_TYPE)?;
        let vessel_count = string_column(df, columns::VESSEL_COUNT)?;
        let persons = string_column(df, columns::PERSONS)?;
        let occurred_at = string_column(df, columns::OCCURRED_AT)?;
        let latitude = string_column(df, columns::LATITUDE)?;
        let longitude = string_column(df, columns::LONGITUDE)?;
        let incident_type = string_column(df, columns::INCIDENT_TYPE)?;

        let mut records = Vec::with_capacity(df.height());

        for i in 0..df.height() {
            let row = i + 1;
            let text = |ca: &StringChunked| ca.get(i).map(str::trim).unwrap_or_default().to_string();

            let region_value = text(region);
            if region_value.is_empty() {
                return Err(LoaderError::MissingValue {
                    row,
                    column: columns::REGION,
                });
            }

            let coordinate = |ca: &StringChunked, column: &'static str| {
                let raw = ca.get(i).unwrap_or_default();
                parse_dms(raw).ok_or_else(|| LoaderError::InvalidCoordinate {
                    row,
                    column,
                    value: raw.to_string(),
                })
            };

            let count = |ca: &StringChunked, column: &'static str| {
                parse_count(ca.get(i)).ok_or_else(|| LoaderError::InvalidInteger {
                    row,
                    column,
                    value: ca.get(i).unwrap_or_default().to_string(),
                })
            };

            let occurred_raw = occurred_at.get(i).unwrap_or_default();
            let occurred = parse_datetime(occurred_raw).ok_or_else(|| LoaderError::InvalidDateTime {
                row,
                column: columns::OCCURRED_AT,
                value: occurred_raw.to_string(),
            })?;

            let cause_raw = text(cause);
            let incident_type_value = text(incident_type);

            records.push(IncidentRecord {
                region: region_value,
                sea_area: text(sea_area),
                cause: Cause::parse(&cause_raw),
                cause_raw,
                vessel_type: text(vessel_type),
                vessel_count: count(vessel_count, columns::VESSEL_COUNT)?,
                persons_affected: count(persons, columns::PERSONS)?,
                occurred_at: occurred,
                latitude: coordinate(latitude, columns::LATITUDE)?,
                longitude: coordinate(longitude, columns::LONGITUDE)?,
                incident_type: (!incident_type_value.is_empty()).then_some(incident_type_value),
            });
        }

        Ok(records)
    }
}

/// Look up a column by name, tolerating stray whitespace in the header.
fn string_column<'a>(df: &'a DataFrame, name: &'static str) -> Result<&'a StringChunked, LoaderError> {
    let column = df
        .get_columns()
        .iter()
        .find(|col| col.name().as_str().trim_start_matches('\u{feff}').trim() == name)
        .ok_or(LoaderError::MissingColumn(name))?;

    Ok(column.as_materialized_series().str()?)
}
