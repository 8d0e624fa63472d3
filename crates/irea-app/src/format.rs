// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const MISSING_VALUE: &str = "—";

/// Whole-dollar USD, e.g. `$750,000`.
pub fn format_usd(value: Option<f64>) -> String {
    let Some(value) = value.filter(|value| value.is_finite()) else {
        return MISSING_VALUE.to_owned();
    };
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", comma_format(rounded.abs() as u64))
}

/// Axis tick label in thousands, e.g. `$750k`.
pub fn format_usd_thousands(value: f64) -> String {
    if !value.is_finite() {
        return MISSING_VALUE.to_owned();
    }
    format!("${:.0}k", value / 1000.0)
}

/// A log residual shown as a signed percentage: `(e^r - 1) * 100`.
pub fn format_residual_pct(residual: Option<f64>) -> String {
    let Some(residual) = residual.filter(|value| value.is_finite()) else {
        return MISSING_VALUE.to_owned();
    };
    let pct = (residual.exp() - 1.0) * 100.0;
    let sign = if pct >= 0.0 { "+" } else { "" };
    format!("{sign}{pct:.1}%")
}

pub fn format_rate(rate: Option<f64>) -> String {
    rate.filter(|value| value.is_finite())
        .map_or_else(|| MISSING_VALUE.to_owned(), |value| format!("{value:.4}"))
}

fn comma_format(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let mut chars = digits.chars().collect::<Vec<_>>();
    let mut count = 0usize;
    while let Some(ch) = chars.pop() {
        if count == 3 {
            out.push(',');
            count = 0;
        }
        out.push(ch);
        count += 1;
    }
    out.chars().rev().collect()
}
