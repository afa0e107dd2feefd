//! Series loading
//!
//! CSV loader for `datetime,close[,volume]` files and the
//! [`MarketDataProvider`] boundary that feeds calculators with plain numeric
//! series. Calculators never see the provider; callers pull slices out of it
//! and hand those over.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::{simple_returns, SeriesMatrix, Symbol, VolumeTick};

/// One row of a series file
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub datetime: DateTime<Utc>,
    pub close: f64,
    pub volume: Option<f64>,
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse datetime: {}", raw))?;
    let ndt = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date: {}", raw))?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
}

/// Load a `datetime,close[,volume]` CSV file with a header row
pub fn load_series(path: impl AsRef<Path>) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut observations = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let datetime = parse_datetime(dt_str.trim())?;

        let close: f64 = record
            .get(1)
            .context("Missing close column")?
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse close on row {}", row_idx + 1))?;

        let volume = match record.get(2).map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(
                raw.parse::<f64>()
                    .with_context(|| format!("Failed to parse volume on row {}", row_idx + 1))?,
            ),
            _ => None,
        };

        observations.push(Observation {
            datetime,
            close,
            volume,
        });
    }

    Ok(observations)
}

/// Result of data validation
#[derive(Debug)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a loaded series for consistency
pub fn validate_series(observations: &[Observation]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if observations.is_empty() {
        errors.push("No observations provided".to_string());
        return ValidationResult { errors, warnings };
    }

    for (i, obs) in observations.iter().enumerate() {
        if !(obs.close.is_finite() && obs.close > 0.0) {
            errors.push(format!("Row {}: invalid close ({})", i, obs.close));
        }
        if obs.volume.is_some_and(|v| v < 0.0) {
            errors.push(format!("Row {}: negative volume", i));
        }
        if i > 0 && obs.datetime <= observations[i - 1].datetime {
            warnings.push(format!("Row {}: not chronological", i));
        }
    }

    ValidationResult { errors, warnings }
}

/// Source of per-symbol market series
pub trait MarketDataProvider {
    /// Close prices, oldest first
    fn prices(&self, symbol: &Symbol) -> Result<Vec<f64>>;

    /// Simple returns derived from [`MarketDataProvider::prices`]
    fn returns(&self, symbol: &Symbol) -> Result<Vec<f64>> {
        Ok(simple_returns(&self.prices(symbol)?))
    }

    /// Volume ticks signed by the close-to-close price change
    fn volume_ticks(&self, symbol: &Symbol) -> Result<Vec<VolumeTick>>;
}

/// Provider backed by a directory of `<SYMBOL>.csv` files
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    pub data_dir: PathBuf,
}

impl CsvMarketData {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, symbol: &Symbol) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol.as_str()))
    }

    fn load(&self, symbol: &Symbol) -> Result<Vec<Observation>> {
        let path = self.path_for(symbol);
        let observations =
            load_series(&path).with_context(|| format!("Failed to load data for {}", symbol))?;

        let validation = validate_series(&observations);
        for warning in &validation.warnings {
            warn!("{}: {}", symbol, warning);
        }
        if !validation.is_valid() {
            anyhow::bail!("Invalid data for {}: {}", symbol, validation.errors.join("; "));
        }

        info!("Loaded {} rows for {}", observations.len(), symbol);
        Ok(observations)
    }

    /// Load prices for several symbols, aligned on their common tail
    ///
    /// Symbols without a data file are skipped with a warning. Returns the
    /// loaded symbols with matching price and return matrices (one column
    /// per symbol).
    pub fn load_universe(
        &self,
        symbols: &[Symbol],
    ) -> Result<(Vec<Symbol>, SeriesMatrix, SeriesMatrix)> {
        let mut loaded = Vec::new();
        let mut price_columns = Vec::new();

        for symbol in symbols {
            if !self.path_for(symbol).exists() {
                warn!("Data file not found: {}", self.path_for(symbol).display());
                continue;
            }
            price_columns.push(self.prices(symbol)?);
            loaded.push(symbol.clone());
        }

        if loaded.is_empty() {
            anyhow::bail!("No data loaded for any symbol");
        }

        let common = price_columns.iter().map(Vec::len).min().unwrap_or(0);
        let price_columns: Vec<Vec<f64>> = price_columns
            .into_iter()
            .map(|col| col[col.len() - common..].to_vec())
            .collect();
        let return_columns: Vec<Vec<f64>> =
            price_columns.iter().map(|col| simple_returns(col)).collect();

        let prices = SeriesMatrix::from_columns(price_columns)?;
        let returns = SeriesMatrix::from_columns(return_columns)?;
        Ok((loaded, prices, returns))
    }
}

impl MarketDataProvider for CsvMarketData {
    fn prices(&self, symbol: &Symbol) -> Result<Vec<f64>> {
        Ok(self.load(symbol)?.into_iter().map(|o| o.close).collect())
    }

    fn volume_ticks(&self, symbol: &Symbol) -> Result<Vec<VolumeTick>> {
        let observations = self.load(symbol)?;
        if observations.iter().any(|o| o.volume.is_none()) {
            anyhow::bail!("{} has rows without a volume column", symbol);
        }

        Ok(observations
            .windows(2)
            .map(|w| {
                VolumeTick::from_price_change(w[1].volume.unwrap_or(0.0), w[1].close - w[0].close)
            })
            .collect())
    }
}
