// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

pub const MAX_ERROR_BODY_CHARS: usize = 400;

/// Failures that reach the page. Geocode failures render the region message;
/// the underlying cause is only available through [`AppError::diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Only support {region} area")]
    Region { region: String },
    #[error("Only support {region} area")]
    Geocode { region: String, reason: String },
    #[error("{}", request_message(.status, .url, .body))]
    Request {
        status: u16,
        url: String,
        body: String,
    },
    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },
    #[error("cannot reach {url} ({reason})")]
    Transport { url: String, reason: String },
    #[error("cannot decode response from {url} ({reason})")]
    Decode { url: String, reason: String },
}

impl AppError {
    pub fn request(status: u16, url: impl Into<String>, body: &str) -> Self {
        Self::Request {
            status,
            url: url.into(),
            body: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
        }
    }

    pub fn geocode(region: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Geocode {
            region: region.into(),
            reason: reason.into(),
        }
    }

    pub fn is_region(&self) -> bool {
        matches!(self, Self::Region { .. } | Self::Geocode { .. })
    }

    /// The underlying cause for logs; differs from `Display` only for geocode
    /// failures.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Geocode { reason, .. } => format!("geocode failed: {reason}"),
            other => other.to_string(),
        }
    }
}

fn request_message(status: &u16, url: &str, body: &str) -> String {
    if body.is_empty() {
        format!("{status} — {url}")
    } else {
        format!("{status} — {url} — {body}")
    }
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => value[..index].to_owned(),
        None => value.to_owned(),
    }
}
