// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;
use time::Date;

use crate::Coordinate;

pub const DEFAULT_AREA_SQFT: i64 = 1200;
pub const DEFAULT_BEDROOMS: i64 = 3;
pub const DEFAULT_BATHROOMS: f64 = 1.5;
pub const DEFAULT_BUILT_YEAR: i64 = 1950;
pub const DEFAULT_PARKING_SPACES: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    AreaSqft,
    Bedrooms,
    Bathrooms,
    BuiltYear,
    ParkingSpaces,
    Renovated,
    LotSqft,
    SaleYear,
    SaleMonth,
}

impl FormField {
    pub const ALL: [Self; 9] = [
        Self::AreaSqft,
        Self::Bedrooms,
        Self::Bathrooms,
        Self::BuiltYear,
        Self::ParkingSpaces,
        Self::Renovated,
        Self::LotSqft,
        Self::SaleYear,
        Self::SaleMonth,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::AreaSqft => "Area (sqft)",
            Self::Bedrooms => "Bedrooms",
            Self::Bathrooms => "Bathrooms",
            Self::BuiltYear => "Built Year",
            Self::ParkingSpaces => "Parking Spaces",
            Self::Renovated => "Renovated",
            Self::LotSqft => "Lot (sqft)",
            Self::SaleYear => "Sale Year",
            Self::SaleMonth => "Sale Month",
        }
    }

    pub const fn is_optional(self) -> bool {
        matches!(self, Self::LotSqft | Self::SaleYear | Self::SaleMonth)
    }

    pub const fn is_toggle(self) -> bool {
        matches!(self, Self::Renovated)
    }

    /// Clamp range and fallback for numeric fields. Year and month bounds
    /// follow `today`.
    pub fn bounds(self, today: Date) -> Option<FieldBounds> {
        let year = i64::from(today.year());
        let month = i64::from(u8::from(today.month()));
        let bounds = match self {
            Self::AreaSqft => FieldBounds::int(100, 20_000, DEFAULT_AREA_SQFT),
            Self::Bedrooms => FieldBounds::int(0, 20, DEFAULT_BEDROOMS),
            Self::Bathrooms => FieldBounds::num(0.0, 20.0, DEFAULT_BATHROOMS),
            Self::BuiltYear => FieldBounds::int(1700, year, DEFAULT_BUILT_YEAR),
            Self::ParkingSpaces => FieldBounds::int(0, 20, DEFAULT_PARKING_SPACES),
            Self::LotSqft => FieldBounds::int(0, 500_000, 0),
            Self::SaleYear => FieldBounds::int(2000, year, year),
            Self::SaleMonth => FieldBounds::int(1, 12, month),
            Self::Renovated => return None,
        };
        Some(bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
    pub fallback: f64,
    pub integer: bool,
}

impl FieldBounds {
    const fn int(min: i64, max: i64, fallback: i64) -> Self {
        Self {
            min: min as f64,
            max: max as f64,
            fallback: fallback as f64,
            integer: true,
        }
    }

    const fn num(min: f64, max: f64, fallback: f64) -> Self {
        Self {
            min,
            max,
            fallback,
            integer: false,
        }
    }

    pub fn apply(&self, raw: &str) -> f64 {
        if self.integer {
            clamp_int(raw, self.min as i64, self.max as i64, self.fallback as i64) as f64
        } else {
            clamp_num(raw, self.min, self.max, self.fallback)
        }
    }
}

/// Parses a raw field. Blank, unparsable, and non-finite input is `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn clamp_num_value(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.min(max).max(min)
}

pub fn clamp_int_value(value: f64, min: i64, max: i64, fallback: i64) -> i64 {
    if !value.is_finite() {
        return fallback;
    }
    value.round().min(max as f64).max(min as f64) as i64
}

pub fn clamp_num(raw: &str, min: f64, max: f64, fallback: f64) -> f64 {
    parse_number(raw).map_or(fallback, |value| clamp_num_value(value, min, max, fallback))
}

pub fn clamp_int(raw: &str, min: i64, max: i64, fallback: i64) -> i64 {
    parse_number(raw).map_or(fallback, |value| clamp_int_value(value, min, max, fallback))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub area_sqft: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub built_year: String,
    pub parking_spaces: String,
    pub renovated: bool,
    pub lot_sqft: String,
    pub sale_year: String,
    pub sale_month: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            area_sqft: DEFAULT_AREA_SQFT.to_string(),
            bedrooms: DEFAULT_BEDROOMS.to_string(),
            bathrooms: DEFAULT_BATHROOMS.to_string(),
            built_year: DEFAULT_BUILT_YEAR.to_string(),
            parking_spaces: DEFAULT_PARKING_SPACES.to_string(),
            renovated: false,
            lot_sqft: String::new(),
            sale_year: String::new(),
            sale_month: String::new(),
        }
    }
}

impl FormState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn text(&self, field: FormField) -> Option<&str> {
        let value = match field {
            FormField::AreaSqft => &self.area_sqft,
            FormField::Bedrooms => &self.bedrooms,
            FormField::Bathrooms => &self.bathrooms,
            FormField::BuiltYear => &self.built_year,
            FormField::ParkingSpaces => &self.parking_spaces,
            FormField::LotSqft => &self.lot_sqft,
            FormField::SaleYear => &self.sale_year,
            FormField::SaleMonth => &self.sale_month,
            FormField::Renovated => return None,
        };
        Some(value.as_str())
    }

    pub fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        let value = match field {
            FormField::AreaSqft => &mut self.area_sqft,
            FormField::Bedrooms => &mut self.bedrooms,
            FormField::Bathrooms => &mut self.bathrooms,
            FormField::BuiltYear => &mut self.built_year,
            FormField::ParkingSpaces => &mut self.parking_spaces,
            FormField::LotSqft => &mut self.lot_sqft,
            FormField::SaleYear => &mut self.sale_year,
            FormField::SaleMonth => &mut self.sale_month,
            FormField::Renovated => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, field: FormField, raw: &str) {
        match self.text_mut(field) {
            Some(value) => *value = raw.to_owned(),
            None => self.renovated = matches!(raw.trim(), "1" | "true" | "yes" | "y"),
        }
    }

    pub fn display_value(&self, field: FormField) -> String {
        match self.text(field) {
            Some(value) => value.to_owned(),
            None if self.renovated => "Yes".to_owned(),
            None => "No / Unknown".to_owned(),
        }
    }

    /// Normalizes every field and attaches the coordinate. Optional fields the
    /// user left blank stay out of the payload.
    pub fn to_payload(&self, coordinate: Coordinate, today: Date) -> PredictionPayload {
        let int = |field: FormField| -> i64 {
            let raw = self.text(field).unwrap_or_default();
            field
                .bounds(today)
                .map_or(0, |bounds| bounds.apply(raw) as i64)
        };
        let optional_int = |field: FormField| -> Option<i64> {
            let raw = self.text(field).unwrap_or_default();
            if raw.trim().is_empty() {
                None
            } else {
                Some(int(field))
            }
        };

        PredictionPayload {
            area_sqft: int(FormField::AreaSqft),
            bedrooms: int(FormField::Bedrooms),
            bathrooms: FormField::Bathrooms
                .bounds(today)
                .map_or(DEFAULT_BATHROOMS, |bounds| bounds.apply(&self.bathrooms)),
            built_year: int(FormField::BuiltYear),
            parking_spaces: int(FormField::ParkingSpaces),
            lot_sqft: optional_int(FormField::LotSqft),
            renovated: u8::from(self.renovated),
            sale_year: optional_int(FormField::SaleYear),
            sale_month: optional_int(FormField::SaleMonth),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionPayload {
    #[serde(rename = "areaSqft")]
    pub area_sqft: i64,
    pub bedrooms: i64,
    pub bathrooms: f64,
    #[serde(rename = "builtYear")]
    pub built_year: i64,
    #[serde(rename = "parkingSpaces")]
    pub parking_spaces: i64,
    #[serde(rename = "lotSqft", skip_serializing_if = "Option::is_none")]
    pub lot_sqft: Option<i64>,
    pub renovated: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_month: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
}

impl PredictionPayload {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FormField, FormState, clamp_int, clamp_int_value, clamp_num, clamp_num_value,
        parse_number,
    };
    use crate::Coordinate;
    use time::{Date, Month};

    fn today() -> Date {
        Date::from_calendar_date(2026, Month::March, 14).expect("valid test date")
    }

    #[test]
    fn unparsable_and_non_finite_input_falls_back() {
        for raw in ["", "   ", "abc", "NaN", "inf", "-inf", "1e999", "12abc"] {
            assert_eq!(clamp_int(raw, 0, 20, 3), 3, "raw {raw:?}");
            assert_eq!(clamp_num(raw, 0.0, 20.0, 1.5), 1.5, "raw {raw:?}");
        }
        assert_eq!(clamp_num_value(f64::NAN, 0.0, 1.0, 0.5), 0.5);
        assert_eq!(clamp_int_value(f64::INFINITY, 0, 1, 1), 1);
    }

    #[test]
    fn finite_input_is_rounded_and_clamped() {
        assert_eq!(clamp_int("2.6", 0, 20, 3), 3);
        assert_eq!(clamp_int("2.4", 0, 20, 3), 2);
        assert_eq!(clamp_int("99", 0, 20, 3), 20);
        assert_eq!(clamp_int("-4", 0, 20, 3), 0);
        assert_eq!(clamp_int(" 1500 ", 100, 20_000, 1200), 1500);
        assert_eq!(clamp_num("2.75", 0.0, 20.0, 1.5), 2.75);
        assert_eq!(clamp_num("-1", 0.0, 20.0, 1.5), 0.0);
    }

    #[test]
    fn clamp_is_idempotent() {
        let samples = [
            -1.0e12, -20.5, -0.5, 0.0, 0.49, 0.5, 1.5, 7.25, 19.99, 20.0, 20.01, 1.0e9,
        ];
        for value in samples {
            let once = clamp_int_value(value, 0, 20, 3);
            assert_eq!(clamp_int_value(once as f64, 0, 20, 3), once, "int {value}");

            let once = clamp_num_value(value, 0.0, 20.0, 1.5);
            assert_eq!(clamp_num_value(once, 0.0, 20.0, 1.5), once, "num {value}");

            let raw = value.to_string();
            let once = clamp_int(&raw, 100, 20_000, 1200);
            assert_eq!(clamp_int(&once.to_string(), 100, 20_000, 1200), once);
        }
    }

    #[test]
    fn parse_number_accepts_padded_decimal_text() {
        assert_eq!(parse_number(" 3.5 "), Some(3.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn default_form_builds_expected_payload() {
        let form = FormState::default();
        let payload = form.to_payload(Coordinate::new(42.36, -71.05), today());
        assert_eq!(payload.area_sqft, 1200);
        assert_eq!(payload.bedrooms, 3);
        assert_eq!(payload.bathrooms, 1.5);
        assert_eq!(payload.built_year, 1950);
        assert_eq!(payload.parking_spaces, 1);
        assert_eq!(payload.renovated, 0);
        assert_eq!(payload.lot_sqft, None);
        assert_eq!(payload.sale_year, None);
        assert_eq!(payload.sale_month, None);
        assert_eq!(payload.coordinate(), Coordinate::new(42.36, -71.05));
    }

    #[test]
    fn blank_optional_fields_are_omitted_from_json() -> serde_json::Result<()> {
        let payload = FormState::default().to_payload(Coordinate::new(42.3, -71.0), today());
        let encoded = serde_json::to_value(&payload)?;
        let object = encoded.as_object().expect("payload encodes as object");
        assert!(!object.contains_key("lotSqft"));
        assert!(!object.contains_key("sale_year"));
        assert!(!object.contains_key("sale_month"));
        assert_eq!(object["areaSqft"], 1200);
        assert_eq!(object["renovated"], 0);
        assert_eq!(object["latitude"], 42.3);
        Ok(())
    }

    #[test]
    fn supplied_optional_fields_are_clamped_against_today() {
        let mut form = FormState::default();
        form.set(FormField::LotSqft, "900000");
        form.set(FormField::SaleYear, "2031");
        form.set(FormField::SaleMonth, "oops");
        form.set(FormField::BuiltYear, "2100");
        form.set(FormField::Renovated, "yes");

        let payload = form.to_payload(Coordinate::new(42.3, -71.0), today());
        assert_eq!(payload.lot_sqft, Some(500_000));
        assert_eq!(payload.sale_year, Some(2026));
        assert_eq!(payload.sale_month, Some(3));
        assert_eq!(payload.built_year, 2026);
        assert_eq!(payload.renovated, 1);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut form = FormState::default();
        form.set(FormField::AreaSqft, "9000");
        form.renovated = true;
        form.reset();
        assert_eq!(form, FormState::default());
        assert_eq!(form.display_value(FormField::Renovated), "No / Unknown");
    }

    #[test]
    fn only_renovated_is_a_toggle() {
        let toggles = FormField::ALL
            .iter()
            .filter(|field| field.is_toggle())
            .count();
        assert_eq!(toggles, 1);
        assert!(FormField::Renovated.bounds(today()).is_none());
    }
}
