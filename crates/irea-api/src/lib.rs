// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use irea_app::{
    AppError, DEFAULT_MODEL_VERSION, PredictionPayload, PredictionResult, Predictor, TrendMeta,
};
use reqwest::blocking::{Client as HttpClient, Response};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_PREDICT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(6);

// Ordered alias tables; the first non-null key wins.
const FINAL_PRICE_KEYS: &[&str] = &[
    "final_price",
    "finalPrice",
    "predictedPrice",
    "estimatedPrice",
    "price",
];
const ASSESS_PRICE_KEYS: &[&str] = &["assess_price", "assessPrice"];
const RESIDUAL_KEYS: &[&str] = &["residual"];
const SNAPPED_LAT_KEYS: &[&str] = &["snappedLat", "snapped_lat", "lat"];
const SNAPPED_LNG_KEYS: &[&str] = &["snappedLng", "snapped_lng", "lng"];
const MODEL_VERSION_KEYS: &[&str] = &["modelVersion", "modelName", "model"];

/// Blocking client for the price prediction backend.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    health_timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, health_timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        Url::parse(&base_url).with_context(|| {
            format!("api.base_url {base_url:?} is not a URL -- expected e.g. {DEFAULT_BASE_URL}")
        })?;
        if timeout.is_zero() || health_timeout.is_zero() {
            bail!("api timeouts must be positive");
        }

        let http = HttpClient::builder()
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            health_timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    pub fn predict_url(&self) -> String {
        format!("{}/api/predict", self.base_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    pub fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult, AppError> {
        let url = self.predict_url();
        debug!(
            url = %url,
            latitude = payload.latitude,
            longitude = payload.longitude,
            "requesting prediction"
        );
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .map_err(|error| transport_error(&url, self.timeout, error))?;
        let body = success_body(response, &url, self.timeout)?;

        let raw: Value = serde_json::from_str(&body).map_err(|error| AppError::Decode {
            url: url.clone(),
            reason: error.to_string(),
        })?;
        let result = normalize_prediction(&raw);
        debug!(
            url = %url,
            final_price = result.final_price,
            model = %result.model_version,
            "prediction received"
        );
        Ok(result)
    }

    /// Succeeds on any 2xx from the health endpoint; the body is not inspected.
    pub fn health(&self) -> Result<(), AppError> {
        let url = self.health_url();
        let response = self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .map_err(|error| transport_error(&url, self.health_timeout, error))?;
        success_body(response, &url, self.health_timeout).map(|_| ())
    }
}

impl Predictor for Client {
    fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult, AppError> {
        Client::predict(self, payload)
    }

    fn health(&self) -> Result<(), AppError> {
        Client::health(self)
    }
}

fn success_body(response: Response, url: &str, timeout: Duration) -> Result<String, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        warn!(url, status = status.as_u16(), "backend returned an error status");
        return Err(AppError::request(status.as_u16(), url, &body));
    }
    response
        .text()
        .map_err(|error| transport_error(url, timeout, error))
}

fn transport_error(url: &str, timeout: Duration, error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        warn!(url, "request timed out");
        return AppError::Timeout {
            url: url.to_owned(),
            seconds: timeout.as_secs().max(1),
        };
    }
    warn!(url, %error, "request failed");
    AppError::Transport {
        url: url.to_owned(),
        reason: error.to_string(),
    }
}

/// Maps whatever field names the backend used onto [`PredictionResult`].
/// A missing price becomes `0`. A price that is present but not numeric
/// becomes NaN so it renders as missing. Every other field is optional.
pub fn normalize_prediction(raw: &Value) -> PredictionResult {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);

    let final_price = match first_present(fields, FINAL_PRICE_KEYS) {
        Some(value) => coerce_number(value).unwrap_or(f64::NAN),
        None => 0.0,
    };
    let model_version = first_present(fields, MODEL_VERSION_KEYS)
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| DEFAULT_MODEL_VERSION.to_owned());

    PredictionResult {
        predicted_price: final_price,
        final_price,
        assess_price: first_number(fields, ASSESS_PRICE_KEYS),
        residual: first_number(fields, RESIDUAL_KEYS),
        snapped_latitude: first_number(fields, SNAPPED_LAT_KEYS),
        snapped_longitude: first_number(fields, SNAPPED_LNG_KEYS),
        model_version,
        trend: fields
            .get("trend")
            .and_then(Value::as_object)
            .map(parse_trend),
        meta: fields.get("meta").and_then(Value::as_object).cloned(),
    }
}

fn parse_trend(trend: &Map<String, Value>) -> TrendMeta {
    let number = |key: &str| trend.get(key).and_then(coerce_number);
    TrendMeta {
        assess_year: number("assess_year").map(|year| year.round() as i32),
        long_term_log_trend: number("long_term_log_trend"),
        trend_5yr_norm: number("trend_5yr_norm"),
        long_term_norm: number("long_term_norm"),
    }
}

fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

fn first_number(fields: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    first_present(fields, keys).and_then(coerce_number)
}

/// JSON numbers and numeric strings; anything else, or a non-finite result,
/// is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}
