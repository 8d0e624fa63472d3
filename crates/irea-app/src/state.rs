// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use tracing::debug;

use crate::{
    AppError, BackendStatus, Coordinate, DescribeTicket, FormState, GeocodeHit, Geocoder,
    HealthTicket, LocationEpoch, PredictTicket, PredictionPayload, PredictionResult, Predictor,
    Region, SearchTicket, StreetView, StreetViewTicket, TrendPoint, TrendPolicy, chart_bounds,
    sorted_by_year,
};

/// Everything the page shows. Loading flags are independent so a search and
/// a prediction can be in flight at the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub region: Region,
    pub trend_policy: TrendPolicy,
    pub form: FormState,
    pub coordinate: Coordinate,
    pub address_label: Option<String>,
    pub searching: bool,
    pub submitting: bool,
    pub error: Option<AppError>,
    pub result: Option<PredictionResult>,
    pub trend: Vec<TrendPoint>,
    pub street_view: StreetView,
    pub backend: BackendStatus,
    epoch: LocationEpoch,
    search_ticket: SearchTicket,
    predict_ticket: PredictTicket,
    describe_ticket: DescribeTicket,
    street_view_ticket: StreetViewTicket,
    health_ticket: HealthTicket,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(Region::default(), TrendPolicy::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageCommand {
    /// `label` is the place name the surface already knows, if any.
    MapClick {
        coordinate: Coordinate,
        label: Option<String>,
    },
    SearchAddress(String),
    SubmitForm,
    ResetForm,
    ClearError,
    CheckBackend,
}

/// Outbound work requested by the page. The runtime executes each effect off
/// the UI thread and feeds the matching [`Outcome`] back through
/// [`PageState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Geocode {
        ticket: SearchTicket,
        epoch: LocationEpoch,
        query: String,
    },
    Predict {
        ticket: PredictTicket,
        epoch: LocationEpoch,
        payload: PredictionPayload,
    },
    Describe {
        ticket: DescribeTicket,
        coordinate: Coordinate,
    },
    ProbeStreetView {
        ticket: StreetViewTicket,
        coordinate: Coordinate,
    },
    CheckHealth {
        ticket: HealthTicket,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Geocoded {
        ticket: SearchTicket,
        epoch: LocationEpoch,
        result: Result<GeocodeHit, AppError>,
    },
    Predicted {
        ticket: PredictTicket,
        epoch: LocationEpoch,
        result: Result<PredictionResult, AppError>,
    },
    Described {
        ticket: DescribeTicket,
        coordinate: Coordinate,
        label: String,
    },
    StreetViewProbed {
        ticket: StreetViewTicket,
        coordinate: Coordinate,
        street_view: StreetView,
    },
    HealthChecked {
        ticket: HealthTicket,
        result: Result<(), AppError>,
    },
}

impl Effect {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Geocode { .. } => "geocode",
            Self::Predict { .. } => "predict",
            Self::Describe { .. } => "describe",
            Self::ProbeStreetView { .. } => "street-view",
            Self::CheckHealth { .. } => "health",
        }
    }

    /// Runs the effect to completion on the calling thread.
    pub fn execute(self, geocoder: &dyn Geocoder, predictor: &dyn Predictor) -> Outcome {
        match self {
            Self::Geocode {
                ticket,
                epoch,
                query,
            } => Outcome::Geocoded {
                ticket,
                epoch,
                result: geocoder.resolve(&query),
            },
            Self::Predict {
                ticket,
                epoch,
                payload,
            } => Outcome::Predicted {
                ticket,
                epoch,
                result: predictor.predict(&payload),
            },
            Self::Describe { ticket, coordinate } => Outcome::Described {
                ticket,
                coordinate,
                label: geocoder.describe(coordinate),
            },
            Self::ProbeStreetView { ticket, coordinate } => Outcome::StreetViewProbed {
                ticket,
                coordinate,
                street_view: geocoder.street_view(coordinate),
            },
            Self::CheckHealth { ticket } => Outcome::HealthChecked {
                ticket,
                result: predictor.health(),
            },
        }
    }
}

impl PageState {
    pub fn new(region: Region, trend_policy: TrendPolicy) -> Self {
        Self {
            coordinate: region.center,
            region,
            trend_policy,
            form: FormState::default(),
            address_label: None,
            searching: false,
            submitting: false,
            error: None,
            result: None,
            trend: Vec::new(),
            street_view: StreetView::Unknown,
            backend: BackendStatus::Unknown,
            epoch: LocationEpoch::default(),
            search_ticket: SearchTicket::default(),
            predict_ticket: PredictTicket::default(),
            describe_ticket: DescribeTicket::default(),
            street_view_ticket: StreetViewTicket::default(),
            health_ticket: HealthTicket::default(),
        }
    }

    pub const fn epoch(&self) -> LocationEpoch {
        self.epoch
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn is_busy(&self) -> bool {
        self.searching || self.submitting
    }

    /// The address label, or the coordinate itself when no name is known yet.
    pub fn location_label(&self) -> String {
        self.address_label
            .clone()
            .unwrap_or_else(|| self.coordinate.label())
    }

    pub fn chart_bounds(&self) -> Option<(f64, f64)> {
        chart_bounds(&self.trend)
    }

    pub fn dispatch(&mut self, command: PageCommand, today: Date) -> Vec<Effect> {
        match command {
            PageCommand::MapClick { coordinate, label } => self.click(coordinate, label),
            PageCommand::SearchAddress(query) => self.search(&query),
            PageCommand::SubmitForm => self.submit(today),
            PageCommand::ResetForm => {
                self.form.reset();
                Vec::new()
            }
            PageCommand::ClearError => {
                self.error = None;
                Vec::new()
            }
            PageCommand::CheckBackend => {
                self.backend = BackendStatus::Checking;
                self.health_ticket = self.health_ticket.next();
                vec![Effect::CheckHealth {
                    ticket: self.health_ticket,
                }]
            }
        }
    }

    pub fn apply(&mut self, outcome: Outcome, today: Date) -> Vec<Effect> {
        match outcome {
            Outcome::Geocoded {
                ticket,
                epoch,
                result,
            } => {
                self.finish_search(ticket, epoch, result);
                Vec::new()
            }
            Outcome::Predicted {
                ticket,
                epoch,
                result,
            } => self.finish_predict(ticket, epoch, result, today),
            Outcome::Described {
                ticket,
                coordinate,
                label,
            } => {
                if coordinate == self.coordinate {
                    self.address_label = Some(label);
                } else {
                    debug!(ticket = ticket.get(), "dropping label for stale coordinate");
                }
                Vec::new()
            }
            Outcome::StreetViewProbed {
                ticket,
                coordinate,
                street_view,
            } => {
                if ticket == self.street_view_ticket && coordinate == self.coordinate {
                    self.street_view = street_view;
                } else {
                    debug!(ticket = ticket.get(), "dropping stale street view probe");
                }
                Vec::new()
            }
            Outcome::HealthChecked { ticket, result } => {
                if ticket == self.health_ticket {
                    self.backend = match result {
                        Ok(()) => BackendStatus::Healthy,
                        Err(error) => BackendStatus::Unavailable(error.to_string()),
                    };
                } else {
                    debug!(ticket = ticket.get(), "dropping superseded health check");
                }
                Vec::new()
            }
        }
    }

    fn click(&mut self, coordinate: Coordinate, label: Option<String>) -> Vec<Effect> {
        let coordinate = match self.region.check(coordinate) {
            Ok(coordinate) => coordinate,
            Err(error) => {
                self.error = Some(error);
                return Vec::new();
            }
        };

        self.move_to(coordinate);
        self.error = None;
        self.street_view = StreetView::Checking;
        self.street_view_ticket = self.street_view_ticket.next();

        let mut effects = Vec::with_capacity(2);
        match label.filter(|label| !label.trim().is_empty()) {
            Some(label) => self.address_label = Some(label),
            None => {
                self.address_label = None;
                effects.push(self.describe(coordinate));
            }
        }
        effects.push(Effect::ProbeStreetView {
            ticket: self.street_view_ticket,
            coordinate,
        });
        effects
    }

    fn search(&mut self, query: &str) -> Vec<Effect> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.error = None;
        self.searching = true;
        self.search_ticket = self.search_ticket.next();
        vec![Effect::Geocode {
            ticket: self.search_ticket,
            epoch: self.epoch,
            query: query.to_owned(),
        }]
    }

    fn submit(&mut self, today: Date) -> Vec<Effect> {
        if let Err(error) = self.region.check(self.coordinate) {
            self.error = Some(error);
            return Vec::new();
        }
        self.error = None;
        self.submitting = true;
        self.predict_ticket = self.predict_ticket.next();
        vec![Effect::Predict {
            ticket: self.predict_ticket,
            epoch: self.epoch,
            payload: self.form.to_payload(self.coordinate, today),
        }]
    }

    fn finish_search(
        &mut self,
        ticket: SearchTicket,
        epoch: LocationEpoch,
        result: Result<GeocodeHit, AppError>,
    ) {
        if ticket != self.search_ticket {
            debug!(ticket = ticket.get(), "dropping superseded search");
            return;
        }
        self.searching = false;
        if epoch != self.epoch {
            debug!(ticket = ticket.get(), "dropping search issued before location moved");
            return;
        }

        let hit = match result.and_then(|hit| self.region.check(hit.coordinate).map(|_| hit)) {
            Ok(hit) => hit,
            Err(error) => {
                debug!(error = %error.diagnostic(), "address search failed");
                self.error = Some(error);
                return;
            }
        };

        self.move_to(hit.coordinate);
        self.address_label = Some(hit.display_label);
        self.error = None;
        self.result = None;
        self.trend.clear();
        self.street_view = StreetView::Unknown;
    }

    fn finish_predict(
        &mut self,
        ticket: PredictTicket,
        epoch: LocationEpoch,
        result: Result<PredictionResult, AppError>,
        today: Date,
    ) -> Vec<Effect> {
        if ticket != self.predict_ticket {
            debug!(ticket = ticket.get(), "dropping superseded prediction");
            return Vec::new();
        }
        self.submitting = false;
        if epoch != self.epoch {
            debug!(ticket = ticket.get(), "dropping prediction for a previous location");
            return Vec::new();
        }

        let result = match result {
            Ok(result) => result,
            Err(error) => {
                debug!(error = %error.diagnostic(), "prediction failed");
                self.error = Some(error);
                return Vec::new();
            }
        };

        let points = self.trend_policy.build(
            result.final_price,
            result.growth_rate(),
            today.year(),
        );
        self.trend = sorted_by_year(&points);

        let display = result.display_coordinate(self.coordinate);
        self.result = Some(result);

        match self.region.check(display) {
            Ok(display) => {
                self.coordinate = display;
                vec![self.describe(display)]
            }
            Err(error) => {
                let (latitude, longitude) = (display.latitude, display.longitude);
                debug!(
                    latitude,
                    longitude,
                    "snapped coordinate outside region"
                );
                self.error = Some(error);
                Vec::new()
            }
        }
    }

    fn move_to(&mut self, coordinate: Coordinate) {
        self.coordinate = coordinate;
        self.epoch = self.epoch.next();
    }

    fn describe(&mut self, coordinate: Coordinate) -> Effect {
        self.describe_ticket = self.describe_ticket.next();
        Effect::Describe {
            ticket: self.describe_ticket,
            coordinate,
        }
    }
}
