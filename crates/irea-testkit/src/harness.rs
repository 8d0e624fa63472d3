// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FakeGeocoder, FakePredictor, fixture_date};
use irea_app::{Effect, PageCommand, PageState};
use std::collections::VecDeque;
use time::Date;

/// Drives a [`PageState`] against the fakes on the calling thread. Effects
/// queue up until run, so tests can complete them in any order.
#[derive(Debug)]
pub struct Harness {
    pub state: PageState,
    pub geocoder: FakeGeocoder,
    pub predictor: FakePredictor,
    pub today: Date,
    pending: VecDeque<Effect>,
}

impl Harness {
    pub fn new(geocoder: FakeGeocoder, predictor: FakePredictor) -> Self {
        Self {
            state: PageState::default(),
            geocoder,
            predictor,
            today: fixture_date(),
            pending: VecDeque::new(),
        }
    }

    pub fn dispatch(&mut self, command: PageCommand) -> usize {
        let effects = self.state.dispatch(command, self.today);
        let issued = effects.len();
        self.pending.extend(effects);
        issued
    }

    /// Dispatches and then runs everything to completion.
    pub fn run(&mut self, command: PageCommand) {
        self.dispatch(command);
        self.run_pending();
    }

    pub fn run_pending(&mut self) {
        while let Some(effect) = self.pending.pop_front() {
            self.complete(effect);
        }
    }

    pub fn take_pending(&mut self) -> Vec<Effect> {
        self.pending.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Executes one effect and applies its outcome. Follow-up effects join
    /// the queue.
    pub fn complete(&mut self, effect: Effect) {
        let outcome = effect.execute(&self.geocoder, &self.predictor);
        let follow_up = self.state.apply(outcome, self.today);
        self.pending.extend(follow_up);
    }
}
