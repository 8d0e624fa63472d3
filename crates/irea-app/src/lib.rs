// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod error;
pub mod format;
pub mod forms;
pub mod ids;
pub mod model;
pub mod region;
pub mod services;
pub mod state;
pub mod trend;

pub use error::*;
pub use format::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use region::*;
pub use services::*;
pub use state::*;
pub use trend::*;
