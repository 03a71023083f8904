//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [backtest]
//! initial_cash = 100000.0
//! rebalance_interval = 21
//! long_pct = 70.0
//! short_pct = 30.0
//!
//! [data]
//! market = "data/market.csv"
//!
//! [signal.factor]
//! kind = "momentum"
//! lag = 252
//! exclude = 21
//! long_above = 0.5
//! short_below = -0.5
//! ```

use chrono::NaiveDate;
use factorlab_core::engine::{BookMembership, EngineConfig, LongShortSplit};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub data: DataSection,
    pub signal: SignalSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub initial_cash: f64,
    pub rebalance_interval: usize,
    #[serde(default = "default_long_pct")]
    pub long_pct: f64,
    #[serde(default = "default_short_pct")]
    pub short_pct: f64,
    #[serde(default)]
    pub book_membership: BookMembership,
}

fn default_long_pct() -> f64 {
    LongShortSplit::default().long_pct
}

fn default_short_pct() -> f64 {
    LongShortSplit::default().short_pct
}

/// Where market data comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// Long-format market CSV (`date,symbol,close,dividends,stock_splits`).
    pub market: Option<PathBuf>,
    /// Treat a split ratio of 0 as "no split" (1).
    #[serde(default)]
    pub zero_split_is_none: bool,
    /// Parameters for generated data, used with `--synthetic` or when no
    /// market file is given.
    pub synthetic: Option<SyntheticSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSection {
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Exactly one of `file` and `factor` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSection {
    /// Wide CSV of -1/0/1 signals (`date,SYM1,SYM2,...`).
    pub file: Option<PathBuf>,
    pub factor: Option<FactorSignalConfig>,
}

/// Signal built by thresholding a factor score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSignalConfig {
    pub kind: FactorKind,
    pub lag: usize,
    /// Most recent rows skipped by momentum.
    #[serde(default)]
    pub exclude: usize,
    #[serde(default = "default_true")]
    pub norm: bool,
    /// Clip scores to their expanding 5% / 95% quantiles before thresholding.
    #[serde(default)]
    pub winsorize: bool,
    pub long_above: f64,
    pub short_below: f64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Momentum,
    MeanReversion,
    Volatility,
}

impl std::fmt::Display for FactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorKind::Momentum => write!(f, "momentum"),
            FactorKind::MeanReversion => write!(f, "mean_reversion"),
            FactorKind::Volatility => write!(f, "volatility"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("runs")
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the engine parameters and that the signal source is unambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        match (&self.signal.file, &self.signal.factor) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(
                    "[signal] must set either `file` or `factor`, not both".into(),
                ))
            }
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "[signal] must set `file` or `factor`".into(),
                ))
            }
            _ => {}
        }
        if let Some(factor) = &self.signal.factor {
            if factor.lag == 0 {
                return Err(ConfigError::Invalid("factor lag must be at least 1".into()));
            }
            if factor.kind == FactorKind::Momentum && factor.exclude >= factor.lag {
                return Err(ConfigError::Invalid(format!(
                    "momentum exclude ({}) must be smaller than lag ({})",
                    factor.exclude, factor.lag
                )));
            }
            if factor.short_below.is_nan()
                || factor.long_above.is_nan()
                || factor.short_below > factor.long_above
            {
                return Err(ConfigError::Invalid(
                    "factor thresholds require short_below <= long_above".into(),
                ));
            }
        }

        if self.data.market.is_none() && self.data.synthetic.is_none() {
            return Err(ConfigError::Invalid(
                "[data] must set `market` or a [data.synthetic] section".into(),
            ));
        }
        if let Some(synth) = &self.data.synthetic {
            if synth.symbols.is_empty() {
                return Err(ConfigError::Invalid(
                    "[data.synthetic] needs at least one symbol".into(),
                ));
            }
            if synth.end < synth.start {
                return Err(ConfigError::Invalid(format!(
                    "[data.synthetic] end {} is before start {}",
                    synth.end, synth.start
                )));
            }
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(
            self.backtest.initial_cash,
            self.backtest.rebalance_interval,
            LongShortSplit {
                long_pct: self.backtest.long_pct,
                short_pct: self.backtest.short_pct,
            },
        )
        .with_book_membership(self.backtest.book_membership)
    }

    /// Deterministic hash of the whole configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
