//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting default target paths.

use crate::cli::ConfigKey;
use crate::config::Config;
use anyhow::Result;
use clap::ValueEnum;
use std::io::{self, Write};
use std::path::Path;

/// Handle the configure command
///
/// # Arguments
/// * `key` - Setting to change
/// * `value` - New value, or `None` to clear the setting
/// * `show` - If true, show current configuration
pub fn handle(key: Option<ConfigKey>, value: Option<String>, show: bool) -> Result<()> {
    let path = Config::config_path()?;
    handle_at(&path, key, value, show, &mut io::stdout().lock())
}

fn handle_at(
    path: &Path,
    key: Option<ConfigKey>,
    value: Option<String>,
    show: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut config = Config::load_from(path)?;

    if show {
        return show_config(&config, path, out);
    }

    match key {
        Some(key) => set(&mut config, path, key, value, out),
        None => show_usage(out),
    }
}

fn key_name(key: ConfigKey) -> String {
    key.to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_else(|| format!("{:?}", key))
}

/// Display current configuration
fn show_config(config: &Config, path: &Path, out: &mut impl Write) -> Result<()> {
    for key in ConfigKey::value_variants() {
        match config.get(*key) {
            Some(value) => writeln!(out, "{}: {}", key_name(*key), value)?,
            None => writeln!(out, "{}: (default)", key_name(*key))?,
        }
    }
    writeln!(out, "Config file: {}", path.display())?;
    Ok(())
}

fn set(
    config: &mut Config,
    path: &Path,
    key: ConfigKey,
    value: Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    config.set(key, value.clone());
    config.save_to(path)?;

    match value {
        Some(value) => writeln!(out, "{} configured: {}", key_name(key), value)?,
        None => writeln!(out, "{} cleared", key_name(key))?,
    }
    writeln!(out, "Config saved to: {}", path.display())?;
    Ok(())
}

/// Show usage help for the configure command
fn show_usage(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Usage: kview configure <core|kallsyms|btf|release> [VALUE]")?;
    writeln!(out, "   or: kview configure --show")?;
    writeln!(out)?;
    writeln!(out, "Note: --core, --kallsyms, --btf and --release (or KVIEW_* variables)")?;
    writeln!(out, "      override these settings for a single run.")?;
    Ok(())
}
