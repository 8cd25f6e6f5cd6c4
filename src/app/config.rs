//! File configuration for CLI defaults.
//!
//! `$XDG_CONFIG_HOME/harvester/config.toml` (or `$HOME/.config/...`) holds
//! `key = value` lines. Flags given on the command line win over file values.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use harvester_core::HttpSettings;

use crate::cli::Args;

/// Parsed config file values. Absent keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    /// API connect timeout in seconds.
    pub(crate) connect_timeout_secs: Option<u64>,
    /// API per-call deadline in seconds.
    pub(crate) read_timeout_secs: Option<u64>,
    /// Default verbosity when no -v/-q flag is given.
    pub(crate) verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/harvester/config.toml`
/// 2. `$HOME/.config/harvester/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("harvester")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("harvester")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file from the default path; `None` if there is none.
pub(crate) fn load_default_file_config() -> Result<Option<FileConfig>> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

pub(crate) fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };
        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_number}")
                })?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_number}")
                })?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `verbosity` value on line {line_number}")
                })?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    token
        .parse::<u64>()
        .with_context(|| format!("Expected non-negative integer, got '{token}'"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

/// Log level from flags, falling back to the file's verbosity.
///
/// -q beats -v; file verbosity only applies when neither flag is given.
pub(crate) fn resolve_default_log_level(args: &Args, file: Option<&FileConfig>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        1 => return "debug",
        2.. => return "trace",
        0 => {}
    }
    match file.and_then(|cfg| cfg.verbosity) {
        Some(VerbositySetting::Quiet) => "error",
        Some(VerbositySetting::Verbose) => "debug",
        Some(VerbositySetting::Debug) => "trace",
        Some(VerbositySetting::Default) | None => "info",
    }
}

/// Returns true when the run should behave as quiet (no progress bar).
pub(crate) fn is_quiet(args: &Args, file: Option<&FileConfig>) -> bool {
    resolve_default_log_level(args, file) == "error"
}

/// HTTP settings with file overrides applied.
pub(crate) fn resolve_http_settings(file: Option<&FileConfig>) -> HttpSettings {
    let mut settings = HttpSettings::default();
    if let Some(secs) = file.and_then(|cfg| cfg.connect_timeout_secs) {
        settings.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.and_then(|cfg| cfg.read_timeout_secs) {
        settings.read_timeout = Duration::from_secs(secs);
    }
    settings
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["harvester", "fanbox"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            "# harvester\nconnect_timeout_secs = 5\nread_timeout_secs = 60 # slow mirror\nverbosity = \"verbose\"\n",
        )
        .unwrap();
        assert_eq!(cfg.connect_timeout_secs, Some(5));
        assert_eq!(cfg.read_timeout_secs, Some(60));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
    }

    #[test]
    fn test_parse_config_rejects_unknown_key() {
        let err = parse_config_str("concurrency = 4").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_timeout() {
        let err = parse_config_str("read_timeout_secs = 0").unwrap_err();
        assert!(format!("{err:#}").contains("1..=3600"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        assert!(parse_config_str("verbosity").is_err());
    }

    #[test]
    fn test_parse_config_rejects_unquoted_verbosity() {
        assert!(parse_config_str("verbosity = quiet").is_err());
    }

    #[test]
    fn test_log_level_flags_win_over_file() {
        let quiet_file = FileConfig {
            verbosity: Some(VerbositySetting::Quiet),
            ..FileConfig::default()
        };
        assert_eq!(resolve_default_log_level(&args(&[]), Some(&quiet_file)), "error");
        assert_eq!(resolve_default_log_level(&args(&["-v"]), Some(&quiet_file)), "debug");
        assert_eq!(resolve_default_log_level(&args(&["-vv"]), None), "trace");
        assert_eq!(resolve_default_log_level(&args(&["-q", "-v"]), None), "error");
        assert_eq!(resolve_default_log_level(&args(&[]), None), "info");
    }

    #[test]
    fn test_http_settings_apply_file_timeouts() {
        let cfg = FileConfig {
            connect_timeout_secs: Some(3),
            read_timeout_secs: None,
            verbosity: None,
        };
        let settings = resolve_http_settings(Some(&cfg));
        assert_eq!(settings.connect_timeout, Duration::from_secs(3));
        assert_eq!(settings.read_timeout, HttpSettings::default().read_timeout);
    }
}
