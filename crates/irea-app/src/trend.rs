// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_GROWTH_RATE: f64 = 0.03;
pub const CHART_PAD_RATIO: f64 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub value: f64,
}

impl TrendPoint {
    pub fn label(&self) -> String {
        self.year.to_string()
    }
}

/// Knobs for the synthetic value series. The series is an extrapolation of a
/// single anchor price, not market history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPolicy {
    pub default_rate: f64,
    pub years_back: u32,
    pub years_forward: u32,
    pub floor_min: f64,
    pub floor_ratio: f64,
    pub ceiling_ratio: f64,
    pub ceiling_headroom: f64,
}

impl Default for TrendPolicy {
    fn default() -> Self {
        Self {
            default_rate: DEFAULT_LOG_GROWTH_RATE,
            years_back: 5,
            years_forward: 1,
            floor_min: 50_000.0,
            floor_ratio: 0.2,
            ceiling_ratio: 2.5,
            ceiling_headroom: 2_000_000.0,
        }
    }
}

impl TrendPolicy {
    pub fn floor(&self, anchor: f64) -> f64 {
        self.floor_min.max(anchor * self.floor_ratio)
    }

    pub fn ceiling(&self, anchor: f64) -> f64 {
        (anchor * self.ceiling_ratio).max(anchor + self.ceiling_headroom)
    }

    pub fn rate_or_default(&self, rate: Option<f64>) -> f64 {
        rate.filter(|value| value.is_finite())
            .unwrap_or(self.default_rate)
    }

    pub fn build(&self, anchor: f64, rate: Option<f64>, current_year: i32) -> Vec<TrendPoint> {
        build_trend(
            anchor,
            rate,
            self.years_back,
            self.years_forward,
            current_year,
            self,
        )
    }
}

/// `anchor * e^(rate * (year - current_year))` for each year in
/// `current_year - years_back ..= current_year + years_forward`, clamped to
/// the policy floor and ceiling. Empty unless the anchor is finite and
/// positive.
pub fn build_trend(
    anchor: f64,
    rate: Option<f64>,
    years_back: u32,
    years_forward: u32,
    current_year: i32,
    policy: &TrendPolicy,
) -> Vec<TrendPoint> {
    if !anchor.is_finite() || anchor <= 0.0 {
        return Vec::new();
    }

    let rate = policy.rate_or_default(rate);
    let floor = policy.floor(anchor);
    let ceiling = policy.ceiling(anchor);

    let back = i64::from(years_back);
    let forward = i64::from(years_forward);
    (-back..=forward)
        .map(|offset| {
            let raw = anchor * (rate * offset as f64).exp();
            TrendPoint {
                year: (i64::from(current_year) + offset) as i32,
                value: raw.min(ceiling).max(floor),
            }
        })
        .collect()
}

pub fn sorted_by_year(points: &[TrendPoint]) -> Vec<TrendPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|point| point.year);
    sorted
}

/// Y-axis bounds padded above and below the observed range.
pub fn chart_bounds(points: &[TrendPoint]) -> Option<(f64, f64)> {
    let mut values = points
        .iter()
        .map(|point| point.value)
        .filter(|value| value.is_finite());
    let first = values.next()?;
    let (min, max) = values.fold((first, first), |(min, max), value| {
        (min.min(value), max.max(value))
    });
    Some((min * (1.0 - CHART_PAD_RATIO), max * (1.0 + CHART_PAD_RATIO)))
}
