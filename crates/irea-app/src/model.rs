// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_MODEL_VERSION: &str = "IREA_V3";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// `"42.36010, -71.05890"`; used wherever a place has no better name.
    pub fn label(&self) -> String {
        format!("{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub coordinate: Coordinate,
    pub display_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrendMeta {
    pub assess_year: Option<i32>,
    pub long_term_log_trend: Option<f64>,
    pub trend_5yr_norm: Option<f64>,
    pub long_term_norm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub predicted_price: f64,
    pub final_price: f64,
    pub assess_price: Option<f64>,
    pub residual: Option<f64>,
    /// Axes of the location the backend actually evaluated. Either may be
    /// missing independently.
    pub snapped_latitude: Option<f64>,
    pub snapped_longitude: Option<f64>,
    pub model_version: String,
    pub trend: Option<TrendMeta>,
    pub meta: Option<Map<String, Value>>,
}

impl PredictionResult {
    pub fn with_price(price: f64) -> Self {
        Self {
            predicted_price: price,
            final_price: price,
            assess_price: None,
            residual: None,
            snapped_latitude: None,
            snapped_longitude: None,
            model_version: DEFAULT_MODEL_VERSION.to_owned(),
            trend: None,
            meta: None,
        }
    }

    pub fn growth_rate(&self) -> Option<f64> {
        self.trend.and_then(|trend| trend.long_term_log_trend)
    }

    /// The snapped location merged one axis at a time over `submitted`.
    /// Missing or non-finite axes keep the submitted value.
    pub fn display_coordinate(&self, submitted: Coordinate) -> Coordinate {
        let axis = |snapped: Option<f64>, fallback: f64| {
            snapped.filter(|value| value.is_finite()).unwrap_or(fallback)
        };
        Coordinate::new(
            axis(self.snapped_latitude, submitted.latitude),
            axis(self.snapped_longitude, submitted.longitude),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreetView {
    #[default]
    Unknown,
    Checking,
    Available(String),
    Missing,
}

/// Last known reachability of the prediction backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Checking,
    Healthy,
    Unavailable(String),
}
