//! Market and signal loading for the runner.
//!
//! Given a `[data]` section, produces aligned `MarketData`. Resolution order:
//! 1. If synthetic data is requested (or no market file is configured) →
//!    generate deterministic synthetic records (tagged)
//! 2. Otherwise → read the long-format market CSV
//!
//! Synthetic data is a developer-only mode. Results produced on it are
//! tagged in the run manifest.

use crate::config::{DataSection, SyntheticSection};
use chrono::{Datelike, NaiveDate};
use factorlab_core::data::{align_records, MarketRecord};
use factorlab_core::{ConfigurationError, Frame, FrameError, MarketData, SignalTable};
use log::{info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: invalid date '{value}'")]
    InvalidDate { line: u64, value: String },

    #[error("line {line}: invalid number '{value}' in column '{column}'")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    #[error("wide csv must start with a 'date' column")]
    MissingDateColumn,

    #[error("no market file configured and no [data.synthetic] section to generate from")]
    NoMarketSource,

    #[error("invalid market data: {0}")]
    Market(#[from] ConfigurationError),

    #[error("table error: {0}")]
    Frame(#[from] FrameError),
}

/// Options controlling how the market CSV is interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Treat a split ratio of 0 as "no split" (1).
    pub zero_split_is_none: bool,
}

/// Result of loading market data, including provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub market: MarketData,
    /// Dataset hash for fingerprinting (BLAKE3 over all market cells).
    pub dataset_hash: String,
    pub synthetic: bool,
}

/// One row of the long-format market CSV. Empty corporate-action cells mean
/// "none".
#[derive(Debug, Deserialize)]
struct MarketCsvRow {
    date: NaiveDate,
    symbol: String,
    close: Option<f64>,
    #[serde(default)]
    dividends: Option<f64>,
    #[serde(default)]
    stock_splits: Option<f64>,
}

/// Load market data per the `[data]` section.
///
/// This is the primary entry point for the runner to get market data.
pub fn load_market(data: &DataSection, synthetic: bool) -> Result<LoadedData, LoadError> {
    let (market, synthetic) = match (&data.market, &data.synthetic) {
        (Some(path), _) if !synthetic => {
            let opts = LoadOptions {
                zero_split_is_none: data.zero_split_is_none,
            };
            (load_market_csv(path, opts)?, false)
        }
        (_, Some(section)) => (load_synthetic(section)?, true),
        _ => return Err(LoadError::NoMarketSource),
    };
    let dataset_hash = dataset_hash(&market);
    info!(
        "loaded {} dates x {} symbols (dataset {})",
        market.timeline().len(),
        market.universe().len(),
        &dataset_hash[..12]
    );
    Ok(LoadedData {
        market,
        dataset_hash,
        synthetic,
    })
}

pub fn load_market_csv(path: &Path, opts: LoadOptions) -> Result<MarketData, LoadError> {
    let records = read_market_records(open(path)?, opts)?;
    Ok(align_records(&records)?)
}

/// Parse long-format rows: `date,symbol,close,dividends,stock_splits`.
pub fn read_market_records<R: Read>(
    reader: R,
    opts: LoadOptions,
) -> Result<Vec<MarketRecord>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let row: MarketCsvRow = row?;
        let split = match row.stock_splits {
            None => 1.0,
            Some(s) if s == 0.0 && opts.zero_split_is_none => 1.0,
            Some(s) => s,
        };
        records.push(MarketRecord {
            date: row.date,
            symbol: row.symbol,
            close: row.close.unwrap_or(f64::NAN),
            dividends: row.dividends.unwrap_or(0.0),
            stock_splits: split,
        });
    }
    Ok(records)
}

/// Write long-format rows with a header.
pub fn write_market_records<W: Write>(
    writer: W,
    records: &[MarketRecord],
) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "symbol", "close", "dividends", "stock_splits"])?;
    for r in records {
        wtr.write_record([
            r.date.to_string(),
            r.symbol.clone(),
            format!("{:.6}", r.close),
            format!("{:.6}", r.dividends),
            format!("{}", r.stock_splits),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn load_signal_csv(path: &Path) -> Result<SignalTable, LoadError> {
    let frame = load_wide_csv(path)?;
    Ok(SignalTable::from_frame(&frame)?)
}

pub fn load_wide_csv(path: &Path) -> Result<Frame, LoadError> {
    read_wide_csv(open(path)?)
}

/// Parse a wide table: `date,COL1,COL2,...`. Empty cells become `NaN`.
pub fn read_wide_csv<R: Read>(reader: R) -> Result<Frame, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.get(0) != Some("date") {
        return Err(LoadError::MissingDateColumn);
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            LoadError::InvalidDate {
                line,
                value: raw_date.to_string(),
            }
        })?;
        let row = record
            .iter()
            .skip(1)
            .zip(&columns)
            .map(|(cell, column)| parse_cell(cell, column, line))
            .collect::<Result<Vec<f64>, _>>()?;
        dates.push(date);
        rows.push(row);
    }
    Ok(Frame::from_rows(dates, columns, rows)?)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_cell(cell: &str, column: &str, line: u64) -> Result<f64, LoadError> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse().map_err(|_| LoadError::InvalidNumber {
        line,
        column: column.to_string(),
        value: cell.to_string(),
    })
}

/// Write a frame as a wide CSV with a leading `date` column.
pub fn write_wide_csv<W: Write>(writer: W, frame: &Frame) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["date".to_string()];
    header.extend(frame.columns().iter().cloned());
    wtr.write_record(&header)?;
    for (t, date) in frame.dates().iter().enumerate() {
        let mut record = vec![date.to_string()];
        record.extend(frame.row(t).iter().map(|v| {
            if v.is_nan() {
                String::new()
            } else {
                v.to_string()
            }
        }));
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Compute a deterministic BLAKE3 hash over all market data.
///
/// Covers symbols, dates, and every close, dividend and split cell in
/// universe order.
pub fn dataset_hash(market: &MarketData) -> String {
    let mut hasher = blake3::Hasher::new();
    for symbol in market.universe() {
        hasher.update(symbol.as_bytes());
        hasher.update(&[0]);
    }
    for t in 0..market.timeline().len() {
        let row = market.row(t);
        hasher.update(row.date.to_string().as_bytes());
        for ((close, div), split) in row.close.iter().zip(row.dividends).zip(row.splits) {
            hasher.update(&close.to_le_bytes());
            hasher.update(&div.to_le_bytes());
            hasher.update(&split.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

pub fn load_synthetic(section: &SyntheticSection) -> Result<MarketData, LoadError> {
    warn!(
        "generating synthetic data for {}; results will be tagged as synthetic",
        section.symbols.join(", ")
    );
    let records: Vec<MarketRecord> = section
        .symbols
        .iter()
        .flat_map(|s| generate_synthetic_records(s, section.start, section.end))
        .collect();
    Ok(align_records(&records)?)
}

/// Generate synthetic market records for testing/development.
///
/// A random walk from 100.0 on weekdays, with a small dividend roughly once
/// a quarter. Seeded from the symbol name, so output is deterministic.
pub fn generate_synthetic_records(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<MarketRecord> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut records = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;
    let mut trading_day = 0usize;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        price *= 1.0 + daily_return;
        let dividends = if trading_day > 0 && trading_day % 63 == 0 {
            (price * rng.gen_range(0.002..0.008) * 100.0).round() / 100.0
        } else {
            0.0
        };

        records.push(MarketRecord {
            date: current,
            symbol: symbol.to_string(),
            close: price,
            dividends,
            stock_splits: 1.0,
        });

        trading_day += 1;
        current += chrono::Duration::days(1);
    }

    records
}
