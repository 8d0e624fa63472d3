// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppError, Coordinate};
use serde::{Deserialize, Serialize};

pub const BOSTON_LAT_MIN: f64 = 42.2279;
pub const BOSTON_LAT_MAX: f64 = 42.3995;
pub const BOSTON_LNG_MIN: f64 = -71.1912;
pub const BOSTON_LNG_MAX: f64 = -70.986;
pub const BOSTON_CENTER: Coordinate = Coordinate::new(42.3601, -71.0589);

/// The rectangle the service area is restricted to. Edges are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
    pub center: Coordinate,
}

impl Default for Region {
    fn default() -> Self {
        Self::boston()
    }
}

impl Region {
    pub fn boston() -> Self {
        Self {
            name: "Boston".to_owned(),
            lat_min: BOSTON_LAT_MIN,
            lat_max: BOSTON_LAT_MAX,
            lng_min: BOSTON_LNG_MIN,
            lng_max: BOSTON_LNG_MAX,
            center: BOSTON_CENTER,
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lng_min
            && longitude <= self.lng_max
    }

    pub fn contains_coordinate(&self, coordinate: Coordinate) -> bool {
        self.contains(coordinate.latitude, coordinate.longitude)
    }

    pub fn check(&self, coordinate: Coordinate) -> Result<Coordinate, AppError> {
        if self.contains_coordinate(coordinate) {
            Ok(coordinate)
        } else {
            Err(self.rejection())
        }
    }

    pub fn rejection(&self) -> AppError {
        AppError::Region {
            region: self.name.clone(),
        }
    }

    pub fn rejection_message(&self) -> String {
        self.rejection().to_string()
    }

    /// Provider bounds hint: `south,west|north,east`.
    pub fn bounds_hint(&self) -> String {
        format!(
            "{},{}|{},{}",
            self.lat_min, self.lng_min, self.lat_max, self.lng_max
        )
    }

    pub fn is_well_formed(&self) -> bool {
        let finite = [self.lat_min, self.lat_max, self.lng_min, self.lng_max]
            .iter()
            .all(|value| value.is_finite());
        finite
            && self.lat_min < self.lat_max
            && self.lng_min < self.lng_max
            && !self.name.trim().is_empty()
            && self.contains_coordinate(self.center)
    }
}

#[cfg(test)]
mod tests {
    use super::Region;
    use crate::Coordinate;

    #[test]
    fn corners_are_inclusive() {
        let region = Region::boston();
        assert!(region.contains(42.2279, -71.1912));
        assert!(region.contains(42.3995, -70.986));
        assert!(region.contains(42.2279, -70.986));
        assert!(region.contains(42.3995, -71.1912));
    }

    #[test]
    fn points_outside_are_rejected() {
        let region = Region::boston();
        let outside = [
            (42.2278, -71.0),
            (42.3996, -71.0),
            (42.3, -71.1913),
            (42.3, -70.9859),
            (40.7128, -74.006),
            (-42.3, 71.0),
        ];
        for (lat, lng) in outside {
            assert!(!region.contains(lat, lng), "{lat}, {lng} should be outside");
        }
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let region = Region::boston();
        assert!(!region.contains(f64::NAN, -71.0));
        assert!(!region.contains(42.3, f64::INFINITY));
        assert!(!region.contains(f64::NEG_INFINITY, f64::NAN));
    }

    #[test]
    fn check_returns_region_message() {
        let region = Region::boston();
        let error = region
            .check(Coordinate::new(40.0, -70.0))
            .expect_err("outside coordinate should fail");
        assert_eq!(error.to_string(), "Only support Boston area");
        assert!(region.check(region.center).is_ok());
    }

    #[test]
    fn bounds_hint_is_south_west_then_north_east() {
        assert_eq!(
            Region::boston().bounds_hint(),
            "42.2279,-71.1912|42.3995,-70.986"
        );
    }

    #[test]
    fn well_formed_requires_ordered_bounds_and_inner_center() {
        assert!(Region::boston().is_well_formed());

        let inverted = Region {
            lat_min: 42.5,
            ..Region::boston()
        };
        assert!(!inverted.is_well_formed());

        let off_center = Region {
            center: Coordinate::new(41.0, -71.0),
            ..Region::boston()
        };
        assert!(!off_center.is_well_formed());
    }
}
