// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppError, Coordinate, GeocodeHit, PredictionPayload, PredictionResult, StreetView};

/// Forward/reverse lookups against the mapping provider.
pub trait Geocoder: Send + Sync {
    fn resolve(&self, query: &str) -> Result<GeocodeHit, AppError>;

    /// Best effort. Implementations fall back to `coordinate.label()` instead
    /// of failing.
    fn describe(&self, coordinate: Coordinate) -> String;

    fn street_view(&self, coordinate: Coordinate) -> StreetView;
}

pub trait Predictor: Send + Sync {
    fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult, AppError>;

    fn health(&self) -> Result<(), AppError>;
}
