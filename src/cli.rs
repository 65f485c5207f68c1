//! CLI definition and the two training drivers.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    parse_key, validate_equity_config, validate_options_config,
};
use crate::domain::error::TraderError;
use crate::domain::features::{FeatureTable, prepare_features, target_column};
use crate::domain::forest::RandomForestRegressor;
use crate::domain::model::ModelConfig;
use crate::domain::ohlcv::{BAR_FEATURES, label_next_close, to_training_set};
use crate::domain::run_config::{EquityRunConfig, OptionsRunConfig};
use crate::domain::split::SplitPolicy;
use crate::domain::training::{TrainingOutcome, train_and_evaluate};
use crate::ports::config_port::ConfigPort;
use crate::ports::option_chain_port::OptionChainPort;
use crate::ports::price_port::{PricePort, PriceRequest};

/// Target column of the options model.
pub const OPTIONS_TARGET: &str = "lastPrice";

#[derive(Parser, Debug)]
#[command(
    name = "options-trader",
    about = "Train regression models on option chains and daily equity prices"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Predict option last prices from one expiration's chain
    Options {
        /// Ticker symbol [default: AAPL]
        ticker: Option<String>,
        /// Expiration date (YYYY-MM-DD); nearest listed when omitted
        #[arg(long, value_parser = parse_date)]
        expiration: Option<NaiveDate>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Read option chains from CSV files instead of Yahoo Finance
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Predict the next day's close from daily bars
    Equity {
        /// Ticker symbol [default: TSLA]
        ticker: Option<String>,
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        /// QuantConnect user id (falls back to QC_USER_ID)
        #[arg(long)]
        user_id: Option<String>,
        /// QuantConnect API token (falls back to QC_API_TOKEN)
        #[arg(long)]
        api_token: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Read daily bars from CSV files instead of QuantConnect
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date {s:?} (expected YYYY-MM-DD)"))
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Options {
            ticker,
            expiration,
            config,
            data_dir,
        } => run_options(ticker.as_deref(), expiration, config.as_ref(), data_dir),
        Command::Equity {
            ticker,
            start,
            end,
            user_id,
            api_token,
            config,
            data_dir,
        } => run_equity(
            EquityOverrides {
                ticker: ticker.as_deref(),
                start,
                end,
            },
            Credentials {
                user_id: user_id.as_deref(),
                api_token: api_token.as_deref(),
            },
            config.as_ref(),
            data_dir,
        ),
    };

    match result {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, TraderError> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| TraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Model settings from `[section]`, falling back to `base`.
pub fn build_model_config(
    adapter: &dyn ConfigPort,
    section: &str,
    base: &ModelConfig,
) -> Result<ModelConfig, TraderError> {
    let max_depth = adapter.get_int(section, "max_depth", 0);
    let max_features = adapter.get_int(section, "max_features", 0);
    Ok(ModelConfig {
        n_estimators: adapter.get_int(section, "n_estimators", base.n_estimators as i64).max(0)
            as usize,
        seed: parse_key::<u64>(adapter, section, "seed")?.unwrap_or(base.seed),
        max_depth: if max_depth > 0 {
            Some(max_depth as usize)
        } else {
            base.max_depth
        },
        min_samples_split: adapter
            .get_int(section, "min_samples_split", base.min_samples_split as i64)
            .max(2) as usize,
        min_samples_leaf: adapter
            .get_int(section, "min_samples_leaf", base.min_samples_leaf as i64)
            .max(1) as usize,
        max_features: if max_features > 0 {
            Some(max_features as usize)
        } else {
            base.max_features
        },
        bootstrap: adapter.get_bool(section, "bootstrap", base.bootstrap),
    })
}

fn build_split(
    adapter: &dyn ConfigPort,
    section: &str,
    base: SplitPolicy,
) -> Result<SplitPolicy, TraderError> {
    let test_ratio = adapter.get_double(section, "test_ratio", base.test_ratio());
    Ok(match base {
        SplitPolicy::Shuffled { seed, .. } => SplitPolicy::Shuffled {
            test_ratio,
            seed: parse_key::<u64>(adapter, section, "split_seed")?.unwrap_or(seed),
        },
        SplitPolicy::Chronological { .. } => SplitPolicy::Chronological { test_ratio },
    })
}

fn resolve_ticker(
    ticker_override: Option<&str>,
    adapter: &dyn ConfigPort,
    section: &str,
    default: &str,
) -> String {
    ticker_override
        .map(str::to_string)
        .or_else(|| adapter.get_string(section, "ticker"))
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn build_options_config(
    adapter: &dyn ConfigPort,
    ticker_override: Option<&str>,
    expiration_override: Option<NaiveDate>,
) -> Result<OptionsRunConfig, TraderError> {
    validate_options_config(adapter)?;
    let defaults = OptionsRunConfig::default();
    let expiration = match expiration_override {
        Some(d) => Some(d),
        None => adapter.get_date("options", "expiration")?,
    };
    Ok(OptionsRunConfig {
        ticker: resolve_ticker(ticker_override, adapter, "options", &defaults.ticker),
        expiration,
        model: build_model_config(adapter, "options", &defaults.model)?,
        split: build_split(adapter, "options", defaults.split)?,
    })
}

pub struct EquityOverrides<'a> {
    pub ticker: Option<&'a str>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub struct Credentials<'a> {
    pub user_id: Option<&'a str>,
    pub api_token: Option<&'a str>,
}

pub fn build_equity_config(
    adapter: &dyn ConfigPort,
    overrides: &EquityOverrides<'_>,
) -> Result<EquityRunConfig, TraderError> {
    validate_equity_config(adapter)?;
    let defaults = EquityRunConfig::default();
    let start_date = match overrides.start {
        Some(d) => d,
        None => adapter
            .get_date("equity", "start_date")?
            .unwrap_or(defaults.start_date),
    };
    let end_date = match overrides.end {
        Some(d) => d,
        None => adapter
            .get_date("equity", "end_date")?
            .unwrap_or(defaults.end_date),
    };
    if start_date >= end_date {
        return Err(TraderError::ConfigInvalid {
            section: "equity".into(),
            key: "start_date".into(),
            reason: "start_date must be before end_date".into(),
        });
    }

    Ok(EquityRunConfig {
        ticker: resolve_ticker(overrides.ticker, adapter, "equity", &defaults.ticker),
        start_date,
        end_date,
        model: build_model_config(adapter, "equity", &defaults.model)?,
        split: build_split(adapter, "equity", defaults.split)?,
    })
}

#[derive(Debug)]
pub struct OptionsReport {
    pub ticker: String,
    pub expiration: NaiveDate,
    pub outcome: TrainingOutcome,
}

impl OptionsReport {
    pub fn summary(&self) -> String {
        format!(
            "Trained on {} options expiring {}. RMSE: {:.2}",
            self.ticker, self.expiration, self.outcome.rmse
        )
    }
}

#[derive(Debug)]
pub struct EquityReport {
    pub ticker: String,
    pub outcome: TrainingOutcome,
}

impl EquityReport {
    pub fn summary(&self) -> String {
        format!(
            "Trained on {} daily bars. RMSE: {:.2}",
            self.ticker, self.outcome.rmse
        )
    }
}

/// The `k` most important features, highest first.
pub fn top_importances<'a>(
    model: &RandomForestRegressor,
    names: &[&'a str],
    k: usize,
) -> Vec<(&'a str, f64)> {
    let mut ranked: Vec<(&str, f64)> = names
        .iter()
        .copied()
        .zip(model.feature_importances())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}

fn log_model(model: &RandomForestRegressor, names: &[&str]) {
    let trees = model.trees();
    if trees.is_empty() {
        return;
    }
    let n = trees.len() as f64;
    let depth = trees.iter().map(|t| t.depth()).sum::<usize>() as f64 / n;
    let leaves = trees.iter().map(|t| t.n_leaves()).sum::<usize>() as f64 / n;
    eprintln!("  mean tree depth {:.1}, mean leaves {:.1}", depth, leaves);
    for (name, importance) in top_importances(model, names, 3) {
        eprintln!("  {:<18} {:.3}", name, importance);
    }
}

/// Fetch → prepare features → split → fit → score, for one option chain.
pub fn run_options_pipeline(
    port: &dyn OptionChainPort,
    config: &OptionsRunConfig,
) -> Result<OptionsReport, TraderError> {
    let expiration = match config.expiration {
        Some(d) => d,
        None => {
            eprintln!("Looking up expirations for {}", config.ticker);
            port.expirations(&config.ticker)?
                .into_iter()
                .next()
                .ok_or_else(|| TraderError::Provider {
                    provider: "option chain".into(),
                    reason: format!("no expirations listed for {}", config.ticker),
                })?
        }
    };

    eprintln!("Fetching {} option chain expiring {}", config.ticker, expiration);
    let chain = port.fetch_option_chain(&config.ticker, expiration)?;
    eprintln!("  {} contracts", chain.len());

    let features = prepare_features(&chain)?;
    let target = target_column(&chain, OPTIONS_TARGET)?;

    eprintln!(
        "Training {} trees (seed {})",
        config.model.n_estimators, config.model.seed
    );
    let outcome = train_and_evaluate(&features.to_matrix(), &target, &config.split, &config.model)?;
    eprintln!("  train {} / held out {}", outcome.n_train, outcome.n_test);
    log_model(&outcome.model, &FeatureTable::column_names());

    Ok(OptionsReport {
        ticker: config.ticker.clone(),
        expiration,
        outcome,
    })
}

/// Fetch → label next close → split by time → fit → score, for one ticker.
pub fn run_equity_pipeline(
    port: &dyn PricePort,
    config: &EquityRunConfig,
) -> Result<EquityReport, TraderError> {
    let request = PriceRequest {
        ticker: config.ticker.clone(),
        start_date: config.start_date,
        end_date: config.end_date,
    };

    eprintln!(
        "Fetching {} daily bars, {} to {}",
        config.ticker, config.start_date, config.end_date
    );
    let bars = port.fetch_daily_bars(&request)?;
    eprintln!("  {} bars", bars.len());

    let labeled = label_next_close(bars);
    let (x, y) = to_training_set(&labeled);

    eprintln!(
        "Training {} trees (seed {})",
        config.model.n_estimators, config.model.seed
    );
    let outcome = train_and_evaluate(&x, &y, &config.split, &config.model)?;
    eprintln!("  train {} / held out {}", outcome.n_train, outcome.n_test);
    log_model(&outcome.model, &BAR_FEATURES);

    Ok(EquityReport {
        ticker: config.ticker.clone(),
        outcome,
    })
}

fn run_options(
    ticker: Option<&str>,
    expiration: Option<NaiveDate>,
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<String, TraderError> {
    let adapter = load_config(config_path)?;
    let run_config = build_options_config(&adapter, ticker, expiration)?;

    let report = match data_dir {
        Some(dir) => {
            eprintln!("Reading option chains from {}", dir.display());
            run_options_pipeline(&CsvAdapter::new(dir), &run_config)?
        }
        None => run_options_online(&adapter, &run_config)?,
    };
    Ok(report.summary())
}

#[cfg(feature = "http")]
fn run_options_online(
    adapter: &dyn ConfigPort,
    run_config: &OptionsRunConfig,
) -> Result<OptionsReport, TraderError> {
    use crate::adapters::yahoo_adapter::{
        DEFAULT_BASE_URL, DEFAULT_COOKIE_URL, DEFAULT_CRUMB_URL, YahooAdapter,
    };

    let setting = |key: &str, default: &str| {
        adapter
            .get_string("yahoo", key)
            .unwrap_or_else(|| default.to_string())
    };
    let port = YahooAdapter::new(&setting("base_url", DEFAULT_BASE_URL))?.with_session_urls(
        &setting("cookie_url", DEFAULT_COOKIE_URL),
        &setting("crumb_url", DEFAULT_CRUMB_URL),
    );
    run_options_pipeline(&port, run_config)
}

#[cfg(not(feature = "http"))]
fn run_options_online(
    _adapter: &dyn ConfigPort,
    _run_config: &OptionsRunConfig,
) -> Result<OptionsReport, TraderError> {
    Err(TraderError::Configuration {
        reason: "http feature is required to fetch option chains; use --data-dir".into(),
    })
}

fn run_equity(
    overrides: EquityOverrides<'_>,
    credentials: Credentials<'_>,
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<String, TraderError> {
    let adapter = load_config(config_path)?;
    let run_config = build_equity_config(&adapter, &overrides)?;

    let report = match data_dir {
        Some(dir) => {
            eprintln!("Reading daily bars from {}", dir.display());
            run_equity_pipeline(&CsvAdapter::new(dir), &run_config)?
        }
        None => run_equity_online(&adapter, &credentials, &run_config)?,
    };
    Ok(report.summary())
}

#[cfg(feature = "http")]
fn run_equity_online(
    adapter: &dyn ConfigPort,
    credentials: &Credentials<'_>,
    run_config: &EquityRunConfig,
) -> Result<EquityReport, TraderError> {
    use crate::adapters::quantconnect_adapter::{
        DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, QuantConnectAdapter,
    };
    use crate::domain::credentials::{env_snapshot, resolve_credentials};
    use std::time::Duration;

    let user_id = credentials
        .user_id
        .map(str::to_string)
        .or_else(|| adapter.get_string("quantconnect", "user_id"));
    let api_token = credentials
        .api_token
        .map(str::to_string)
        .or_else(|| adapter.get_string("quantconnect", "api_token"));
    let creds = resolve_credentials(user_id.as_deref(), api_token.as_deref(), &env_snapshot())?;

    let base_url = adapter
        .get_string("quantconnect", "base_url")
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout = adapter.get_int("quantconnect", "timeout_secs", DEFAULT_TIMEOUT_SECS as i64);
    let port =
        QuantConnectAdapter::new(&base_url, creds, Duration::from_secs(timeout.max(1) as u64))?;
    run_equity_pipeline(&port, run_config)
}

#[cfg(not(feature = "http"))]
fn run_equity_online(
    _adapter: &dyn ConfigPort,
    _credentials: &Credentials<'_>,
    _run_config: &EquityRunConfig,
) -> Result<EquityReport, TraderError> {
    Err(TraderError::Configuration {
        reason: "http feature is required to fetch daily bars; use --data-dir".into(),
    })
}
