use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::discount::DiscountTier;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub payment: PaymentConfig,
    pub discount: DiscountConfig,
    pub ui: UiConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentConfig {
    /// Days between opening the sale and the first due date of a new tab.
    pub due_in_days: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscountConfig {
    pub min_percent: Decimal,
    pub max_percent: Decimal,
}

impl DiscountConfig {
    pub fn tier(&self) -> DiscountTier {
        DiscountTier { min_percent: self.min_percent, max_percent: self.max_percent }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiConfig {
    /// Quiet period after a programmatic scroll before scroll events count as
    /// user input again.
    pub settle_delay_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub due_in_days: Option<u32>,
    pub discount_min_percent: Option<Decimal>,
    pub discount_max_percent: Option<Decimal>,
    pub settle_delay_ms: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let tier = DiscountTier::default();
        Self {
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            payment: PaymentConfig { due_in_days: 30 },
            discount: DiscountConfig {
                min_percent: tier.min_percent,
                max_percent: tier.max_percent,
            },
            ui: UiConfig { settle_delay_ms: 500 },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Precedence: defaults < file < `SALEFLOW_*` env < explicit overrides.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("saleflow.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(payment) = patch.payment {
            if let Some(due_in_days) = payment.due_in_days {
                self.payment.due_in_days = due_in_days;
            }
        }

        if let Some(discount) = patch.discount {
            if let Some(min_percent) = discount.min_percent {
                self.discount.min_percent = min_percent;
            }
            if let Some(max_percent) = discount.max_percent {
                self.discount.max_percent = max_percent;
            }
        }

        if let Some(ui) = patch.ui {
            if let Some(settle_delay_ms) = ui.settle_delay_ms {
                self.ui.settle_delay_ms = settle_delay_ms;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let log_level =
            read_env("SALEFLOW_LOGGING_LEVEL").or_else(|| read_env("SALEFLOW_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SALEFLOW_LOGGING_FORMAT").or_else(|| read_env("SALEFLOW_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("SALEFLOW_PAYMENT_DUE_IN_DAYS") {
            self.payment.due_in_days = parse_env("SALEFLOW_PAYMENT_DUE_IN_DAYS", &value)?;
        }

        if let Some(value) = read_env("SALEFLOW_DISCOUNT_MIN_PERCENT") {
            self.discount.min_percent = parse_env("SALEFLOW_DISCOUNT_MIN_PERCENT", &value)?;
        }
        if let Some(value) = read_env("SALEFLOW_DISCOUNT_MAX_PERCENT") {
            self.discount.max_percent = parse_env("SALEFLOW_DISCOUNT_MAX_PERCENT", &value)?;
        }

        if let Some(value) = read_env("SALEFLOW_UI_SETTLE_DELAY_MS") {
            self.ui.settle_delay_ms = parse_env("SALEFLOW_UI_SETTLE_DELAY_MS", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(due_in_days) = overrides.due_in_days {
            self.payment.due_in_days = due_in_days;
        }
        if let Some(min_percent) = overrides.discount_min_percent {
            self.discount.min_percent = min_percent;
        }
        if let Some(max_percent) = overrides.discount_max_percent {
            self.discount.max_percent = max_percent;
        }
        if let Some(settle_delay_ms) = overrides.settle_delay_ms {
            self.ui.settle_delay_ms = settle_delay_ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_logging(&self.logging)?;
        validate_payment(&self.payment)?;
        validate_discount(&self.discount)?;
        validate_ui(&self.ui)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("saleflow.toml"), PathBuf::from("config/saleflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_payment(payment: &PaymentConfig) -> Result<(), ConfigError> {
    if payment.due_in_days > 365 {
        return Err(ConfigError::Validation(
            "payment.due_in_days must be in range 0..=365".to_string(),
        ));
    }
    Ok(())
}

fn validate_discount(discount: &DiscountConfig) -> Result<(), ConfigError> {
    let hundred = Decimal::ONE_HUNDRED;
    if discount.min_percent < Decimal::ZERO || discount.max_percent > hundred {
        return Err(ConfigError::Validation(
            "discount.min_percent and discount.max_percent must be within 0..=100".to_string(),
        ));
    }
    if discount.min_percent > discount.max_percent {
        return Err(ConfigError::Validation(
            "discount.min_percent must not exceed discount.max_percent".to_string(),
        ));
    }
    Ok(())
}

fn validate_ui(ui: &UiConfig) -> Result<(), ConfigError> {
    if ui.settle_delay_ms > 10_000 {
        return Err(ConfigError::Validation(
            "ui.settle_delay_ms must be in range 0..=10000".to_string(),
        ));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    payment: Option<PaymentPatch>,
    discount: Option<DiscountPatch>,
    ui: Option<UiPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentPatch {
    due_in_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscountPatch {
    min_percent: Option<Decimal>,
    max_percent: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct UiPatch {
    settle_delay_ms: Option<u64>,
}
