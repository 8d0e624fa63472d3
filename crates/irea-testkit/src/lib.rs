// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod fakes;
mod harness;

pub use fakes::*;
pub use harness::*;

use anyhow::{Context, Result};
use irea_app::{Coordinate, FormField, FormState, Region};
use std::path::PathBuf;
use time::Date;
use time::macros::date;

// Raw strings a user could plausibly leave in a numeric field.
const JUNK_INPUTS: [&str; 9] = ["", "  ", "abc", "NaN", "inf", "-inf", "1e999", "12abc", "--3"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for locations and house attributes. The same seed always
/// produces the same sequence.
#[derive(Debug, Clone)]
pub struct ListingFaker {
    rng: DeterministicRng,
}

impl ListingFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn coordinate_in(&mut self, region: &Region) -> Coordinate {
        let latitude = region.lat_min + self.rng.unit() * (region.lat_max - region.lat_min);
        let longitude = region.lng_min + self.rng.unit() * (region.lng_max - region.lng_min);
        Coordinate::new(latitude, longitude)
    }

    /// A point past one of the four edges by up to a degree.
    pub fn coordinate_outside(&mut self, region: &Region) -> Coordinate {
        let inside = self.coordinate_in(region);
        let offset = 0.0001 + self.rng.unit();
        match self.rng.int_n(4) {
            0 => Coordinate::new(region.lat_min - offset, inside.longitude),
            1 => Coordinate::new(region.lat_max + offset, inside.longitude),
            2 => Coordinate::new(inside.latitude, region.lng_min - offset),
            _ => Coordinate::new(inside.latitude, region.lng_max + offset),
        }
    }

    /// Anything from junk to wildly out-of-range numbers.
    pub fn raw_input(&mut self) -> String {
        match self.rng.int_n(4) {
            0 => pick(&mut self.rng, &JUNK_INPUTS).to_owned(),
            1 => format!("{}", self.rng.int_n(50)),
            2 => format!("{:.2}", (self.rng.unit() - 0.5) * 2.0e6),
            _ => format!("{:.3}", self.rng.unit() * 25.0),
        }
    }

    pub fn form(&mut self) -> FormState {
        let mut form = FormState::default();
        for field in FormField::ALL {
            if field.is_toggle() {
                form.renovated = self.rng.bool();
            } else if !field.is_optional() || self.rng.bool() {
                form.set(field, &self.raw_input());
            }
        }
        form
    }
}

fn pick<'a>(rng: &mut DeterministicRng, values: &[&'a str]) -> &'a str {
    values[rng.int_n(values.len())]
}

pub fn fixture_date() -> Date {
    date!(2026 - 03 - 14)
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}
