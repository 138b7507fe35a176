//! Append-only CSV logs of forecasts and decisions

use crate::error::{ServiceError, ServiceResult};
use crate::models::signal::CombinedSignal;
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const UNKNOWN_PRICE: &str = "N/A";

const PREDICTION_HEADER: [&str; 4] = ["timestamp", "model_type", "predicted_price", "actual_price"];
const SIGNAL_HEADER: [&str; 6] = [
    "timestamp",
    "signal",
    "confidence",
    "entry_price",
    "stop_loss",
    "take_profit",
];

/// One row of the prediction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub timestamp: DateTime<Utc>,
    pub model_type: String,
    pub predicted_price: f64,
    /// `None` is written as `N/A`
    pub actual_price: Option<f64>,
}

impl PredictionEntry {
    pub fn new(model_type: impl Into<String>, predicted_price: f64, actual_price: Option<f64>) -> Self {
        Self {
            timestamp: Utc::now(),
            model_type: model_type.into(),
            predicted_price,
            actual_price,
        }
    }
}

/// Opens `path` for appending and reports whether it was empty
fn open_for_append(path: &Path) -> ServiceResult<(File, bool)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_empty = file.metadata()?.len() == 0;
    Ok((file, is_empty))
}

fn format_price(price: Option<f64>) -> String {
    price.map_or_else(|| UNKNOWN_PRICE.to_string(), |p| p.to_string())
}

fn parse_price(field: &str) -> ServiceResult<Option<f64>> {
    if field == UNKNOWN_PRICE || field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|e| ServiceError::LogFormat(format!("invalid price '{}': {}", field, e)))
}

pub struct PredictionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append rows, writing the header first if the file is empty
    pub fn append(&self, entries: &[PredictionEntry]) -> ServiceResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let (file, is_empty) = open_for_append(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if is_empty {
            writer.write_record(PREDICTION_HEADER)?;
        }
        for entry in entries {
            writer.write_record([
                entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                entry.model_type.clone(),
                entry.predicted_price.to_string(),
                format_price(entry.actual_price),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// All rows; a missing file reads as empty
    pub fn read_entries(&self) -> ServiceResult<Vec<PredictionEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() < PREDICTION_HEADER.len() {
                continue;
            }

            let timestamp = NaiveDateTime::parse_from_str(&record[0], TIMESTAMP_FORMAT)
                .map_err(|e| {
                    ServiceError::LogFormat(format!("invalid timestamp '{}': {}", &record[0], e))
                })?
                .and_utc();
            let predicted_price = parse_price(&record[2])?.ok_or_else(|| {
                ServiceError::LogFormat("prediction log row without a predicted price".to_string())
            })?;

            entries.push(PredictionEntry {
                timestamp,
                model_type: record[1].to_string(),
                predicted_price,
                actual_price: parse_price(&record[3])?,
            });
        }
        Ok(entries)
    }
}

pub struct SignalLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SignalLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, timestamp: DateTime<Utc>, signal: &CombinedSignal) -> ServiceResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let (file, is_empty) = open_for_append(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if is_empty {
            writer.write_record(SIGNAL_HEADER)?;
        }
        writer.write_record([
            timestamp.format(TIMESTAMP_FORMAT).to_string(),
            signal.signal.to_string(),
            format!("{:.2}", signal.confidence),
            format_price(signal.entry_price),
            format_price(signal.stop_loss),
            format_price(signal.take_profit),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
