// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use irea_app::{
    AppError, Coordinate, GeocodeHit, Geocoder, PredictionPayload, PredictionResult, Predictor,
    StreetView,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoCall {
    Resolve(String),
    Describe(Coordinate),
    StreetView(Coordinate),
}

/// Scripted [`Geocoder`] that records every call. Unknown queries fail the
/// way a provider with no match would.
#[derive(Debug)]
pub struct FakeGeocoder {
    region_name: String,
    hits: Mutex<HashMap<String, Result<GeocodeHit, AppError>>>,
    labels: Mutex<Vec<(Coordinate, String)>>,
    street_view: Mutex<StreetView>,
    calls: Mutex<Vec<GeoCall>>,
}

impl Default for FakeGeocoder {
    fn default() -> Self {
        Self::new("Boston")
    }
}

impl FakeGeocoder {
    pub fn new(region_name: &str) -> Self {
        Self {
            region_name: region_name.to_owned(),
            hits: Mutex::new(HashMap::new()),
            labels: Mutex::new(Vec::new()),
            street_view: Mutex::new(StreetView::Missing),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_hit(self, query: &str, coordinate: Coordinate, label: &str) -> Self {
        lock(&self.hits).insert(
            query.trim().to_owned(),
            Ok(GeocodeHit {
                coordinate,
                display_label: label.to_owned(),
            }),
        );
        self
    }

    pub fn with_failure(self, query: &str, error: AppError) -> Self {
        lock(&self.hits).insert(query.trim().to_owned(), Err(error));
        self
    }

    pub fn with_label(self, coordinate: Coordinate, label: &str) -> Self {
        lock(&self.labels).push((coordinate, label.to_owned()));
        self
    }

    pub fn with_street_view(self, street_view: StreetView) -> Self {
        *lock(&self.street_view) = street_view;
        self
    }

    pub fn calls(&self) -> Vec<GeoCall> {
        lock(&self.calls).clone()
    }

    pub fn resolve_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, GeoCall::Resolve(_)))
            .count()
    }
}

impl Geocoder for FakeGeocoder {
    fn resolve(&self, query: &str) -> Result<GeocodeHit, AppError> {
        lock(&self.calls).push(GeoCall::Resolve(query.to_owned()));
        lock(&self.hits)
            .get(query.trim())
            .cloned()
            .unwrap_or_else(|| {
                Err(AppError::geocode(
                    self.region_name.clone(),
                    format!("no fixture for {query:?}"),
                ))
            })
    }

    fn describe(&self, coordinate: Coordinate) -> String {
        lock(&self.calls).push(GeoCall::Describe(coordinate));
        lock(&self.labels)
            .iter()
            .find(|(known, _)| *known == coordinate)
            .map_or_else(|| coordinate.label(), |(_, label)| label.clone())
    }

    fn street_view(&self, coordinate: Coordinate) -> StreetView {
        lock(&self.calls).push(GeoCall::StreetView(coordinate));
        lock(&self.street_view).clone()
    }
}

/// Replays queued responses in order and records every payload it receives.
#[derive(Debug, Default)]
pub struct FakePredictor {
    responses: Mutex<VecDeque<Result<PredictionResult, AppError>>>,
    payloads: Mutex<Vec<PredictionPayload>>,
    unhealthy: Mutex<Option<AppError>>,
}

impl FakePredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: Result<PredictionResult, AppError>) -> Self {
        self.push_response(response);
        self
    }

    pub fn push_response(&self, response: Result<PredictionResult, AppError>) {
        lock(&self.responses).push_back(response);
    }

    pub fn with_unhealthy(self, error: AppError) -> Self {
        *lock(&self.unhealthy) = Some(error);
        self
    }

    pub fn payloads(&self) -> Vec<PredictionPayload> {
        lock(&self.payloads).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.payloads).len()
    }
}

impl Predictor for FakePredictor {
    fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult, AppError> {
        lock(&self.payloads).push(payload.clone());
        lock(&self.responses).pop_front().unwrap_or_else(|| {
            Err(AppError::Transport {
                url: "fake://predict".to_owned(),
                reason: "no scripted response".to_owned(),
            })
        })
    }

    fn health(&self) -> Result<(), AppError> {
        match lock(&self.unhealthy).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
