use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use saleflow_core::config::{AppConfig, LoadOptions};
use saleflow_core::format::format_percent;
use saleflow_core::ApplicationError;
use toml::Value;

use super::CommandResult;

/// Effective setting, its `[table].key` path and the env vars that can set it.
struct Field<'a> {
    key_path: &'a str,
    value: String,
    env_keys: &'a [&'a str],
}

/// Loads the layered config; failures come back as the command result to print.
pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() }).map_err(|error| {
        let detail = error.to_string();
        let interface = ApplicationError::from(error).into_interface("config");
        CommandResult::failure(
            "config",
            "config_validation",
            format!("{} ({detail})", interface.user_message()),
            2,
        )
    })
}

pub fn run(config: &AppConfig, explicit_path: Option<&Path>) -> String {
    let config_file_path = detect_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["SALEFLOW_LOGGING_LEVEL", "SALEFLOW_LOG_LEVEL"],
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["SALEFLOW_LOGGING_FORMAT", "SALEFLOW_LOG_FORMAT"],
        },
        Field {
            key_path: "payment.due_in_days",
            value: config.payment.due_in_days.to_string(),
            env_keys: &["SALEFLOW_PAYMENT_DUE_IN_DAYS"],
        },
        Field {
            key_path: "discount.min_percent",
            value: format_percent(config.discount.min_percent),
            env_keys: &["SALEFLOW_DISCOUNT_MIN_PERCENT"],
        },
        Field {
            key_path: "discount.max_percent",
            value: format_percent(config.discount.max_percent),
            env_keys: &["SALEFLOW_DISCOUNT_MAX_PERCENT"],
        },
        Field {
            key_path: "ui.settle_delay_ms",
            value: config.ui.settle_delay_ms.to_string(),
            env_keys: &["SALEFLOW_UI_SETTLE_DELAY_MS"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| {
        render_line(
            field.key_path,
            &field.value,
            field_source(
                field.key_path,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        )
    }));

    lines.join("\n")
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("saleflow.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/saleflow.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| {
        env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
    }) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
