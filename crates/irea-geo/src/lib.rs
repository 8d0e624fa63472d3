// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Mapping provider access: forward and reverse geocoding plus street-view
//! availability, restricted to a configured [`irea_app::Region`].

mod client;
mod provider;

pub use client::*;
pub use provider::*;
