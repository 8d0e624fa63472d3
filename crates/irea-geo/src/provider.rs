// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{GeocodeClient, ProviderConfig};
use irea_app::{AppError, Coordinate, GeocodeHit, Geocoder, StreetView};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Pending,
    Ready,
    Failed(String),
}

/// Shared, load-once access to the mapping provider. The client is built on
/// first use; a failed build is remembered and every later `acquire` fails
/// with the same reason.
#[derive(Debug)]
pub struct ProviderHandle {
    config: ProviderConfig,
    client: OnceLock<Result<Arc<GeocodeClient>, String>>,
}

impl ProviderHandle {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn acquire(&self) -> Result<Arc<GeocodeClient>, AppError> {
        let loaded = self.client.get_or_init(|| match GeocodeClient::new(&self.config) {
            Ok(client) => {
                info!(base_url = %self.config.base_url, "maps provider ready");
                Ok(Arc::new(client))
            }
            Err(error) => {
                warn!(%error, "maps provider unavailable");
                Err(format!("{error:#}"))
            }
        });
        loaded
            .clone()
            .map_err(|reason| AppError::geocode(self.config.region.name.clone(), reason))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.client.get(), Some(Ok(_)))
    }

    pub fn last_error(&self) -> Option<String> {
        match self.client.get() {
            Some(Err(reason)) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> ProviderStatus {
        match self.client.get() {
            None => ProviderStatus::Pending,
            Some(Ok(_)) => ProviderStatus::Ready,
            Some(Err(reason)) => ProviderStatus::Failed(reason.clone()),
        }
    }
}

impl Geocoder for ProviderHandle {
    fn resolve(&self, query: &str) -> Result<GeocodeHit, AppError> {
        self.acquire()?.resolve(query)
    }

    fn describe(&self, coordinate: Coordinate) -> String {
        self.acquire()
            .map_or_else(|_| coordinate.label(), |client| client.describe(coordinate))
    }

    fn street_view(&self, coordinate: Coordinate) -> StreetView {
        self.acquire()
            .map_or(StreetView::Missing, |client| client.street_view(coordinate))
    }
}
