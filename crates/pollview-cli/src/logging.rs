// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::APP_NAME;

pub const LOG_FILTER_ENV: &str = "POLLVIEW_LOG";

pub fn default_log_path() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set [log].file to an absolute path")
    })?;
    Ok(data_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
}

/// Routes `tracing` output to `path`. The terminal belongs to the TUI, so
/// nothing is written to stdout or stderr.
pub fn init(level: &str, path: &Path) -> Result<()> {
    let filter = resolve_filter(env::var(LOG_FILTER_ENV).ok().as_deref(), level)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn resolve_filter(env_value: Option<&str>, level: &str) -> Result<EnvFilter> {
    match env_value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("{LOG_FILTER_ENV}={directives:?} is not a valid filter")),
        None => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{default_log_path, resolve_filter};
    use anyhow::Result;

    #[test]
    fn env_filter_overrides_configured_level() -> Result<()> {
        let filter = resolve_filter(Some("pollview_api=trace"), "info")?;
        assert_eq!(filter.to_string(), "pollview_api=trace");
        Ok(())
    }

    #[test]
    fn blank_env_falls_back_to_level() -> Result<()> {
        assert_eq!(resolve_filter(Some("  "), "warn")?.to_string(), "warn");
        assert_eq!(resolve_filter(None, "debug")?.to_string(), "debug");
        Ok(())
    }

    #[test]
    fn invalid_env_filter_names_the_variable() {
        let error = resolve_filter(Some("pollview=loud"), "info").expect_err("bad filter");
        assert!(error.to_string().contains("POLLVIEW_LOG"));
    }

    #[test]
    fn default_log_path_lives_under_app_dir() -> Result<()> {
        let path = default_log_path()?;
        assert!(path.ends_with("pollview/pollview.log"));
        Ok(())
    }
}
