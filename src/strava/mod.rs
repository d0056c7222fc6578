//! Strava activity export.
//!
//! [`ActivitySource`] pages through `GET /athlete/activities`; the rest of the
//! module flattens activities into rows and renders them as CSV.

mod activities;
mod export;

pub use activities::{
    ActivitySource, MAX_PER_PAGE, started_before, summarize, to_row, window_start,
};
pub use export::{activities_csv, summary_csv, write_export};

/// Name used for messages and the `STRAVA_` key prefix.
pub const PROVIDER: &str = "strava";
