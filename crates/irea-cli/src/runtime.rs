// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use irea_app::{Effect, Geocoder, Outcome, Predictor};
use irea_tui::{AppRuntime, InternalEvent};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use time::{Date, OffsetDateTime};
use tracing::debug;

/// Runs every outbound request on its own worker thread so the page keeps
/// drawing while geocoding and prediction are in flight.
pub struct ServiceRuntime {
    geocoder: Arc<dyn Geocoder>,
    predictor: Arc<dyn Predictor>,
}

impl ServiceRuntime {
    pub fn new(geocoder: Arc<dyn Geocoder>, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            geocoder,
            predictor,
        }
    }
}

impl AppRuntime for ServiceRuntime {
    fn today(&mut self) -> Date {
        OffsetDateTime::now_utc().date()
    }

    fn execute(&mut self, effect: Effect) -> Outcome {
        effect.execute(self.geocoder.as_ref(), self.predictor.as_ref())
    }

    fn spawn_effect(&mut self, effect: Effect, tx: Sender<InternalEvent>) -> Result<()> {
        let geocoder = Arc::clone(&self.geocoder);
        let predictor = Arc::clone(&self.predictor);
        let kind = effect.kind();
        thread::Builder::new()
            .name(format!("irea-{kind}"))
            .spawn(move || {
                let outcome = effect.execute(geocoder.as_ref(), predictor.as_ref());
                if tx.send(InternalEvent::Outcome(outcome)).is_err() {
                    debug!(kind, "page closed before the response arrived");
                }
            })
            .with_context(|| format!("spawn {kind} worker"))?;
        Ok(())
    }
}
