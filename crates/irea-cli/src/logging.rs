// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "IREA_LOG";

/// Routes `tracing` events to an append-only file. The terminal belongs to
/// the page, so nothing is written to stderr once the UI starts.
pub fn init(level: &str, path: &Path) -> Result<()> {
    let filter = build_filter(level, env::var(LOG_ENV).ok())?;

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
        .with_context(|| {
            format!(
                "open log file {} -- set [log].path to a writable location",
                path.display()
            )
        })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("install log subscriber")
}

fn build_filter(level: &str, env_override: Option<String>) -> Result<EnvFilter> {
    let directives = env_override
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| level.to_owned());
    EnvFilter::try_new(&directives).with_context(|| {
        format!("invalid log filter {directives:?}; use a level like info or debug, or set {LOG_ENV}")
    })
}
