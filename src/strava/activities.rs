use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    error::{Error, Result},
    fetch::{Cursor, Cutoff, Page, PageSource},
    http::ApiRequest,
    types::{Activity, ActivityRow, SportSummaryRow},
    utils,
};

/// Maximum page size accepted by `/athlete/activities`.
pub const MAX_PER_PAGE: u32 = 200;

/// The athlete's activities, oldest first when `after` is set.
#[derive(Debug, Clone)]
pub struct ActivitySource {
    api_url: String,
    after: Option<i64>,
}

impl ActivitySource {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            after: None,
        }
    }

    /// Only list activities that started after `after` (provider-side filter).
    #[must_use]
    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after.timestamp());
        self
    }
}

impl PageSource for ActivitySource {
    type Record = Activity;

    fn first_cursor(&self) -> Cursor {
        Cursor::Page(1)
    }

    fn request(&self, cursor: &Cursor, page_size: u32) -> ApiRequest {
        let page = match cursor {
            Cursor::Page(page) => *page,
            Cursor::Offset(offset) => offset / page_size.max(1) + 1,
        };

        let mut request = ApiRequest::get(format!(
            "{}/athlete/activities",
            self.api_url.trim_end_matches('/')
        ))
        .query("page", page)
        .query("per_page", page_size.min(MAX_PER_PAGE));
        if let Some(after) = self.after {
            request = request.query("after", after);
        }
        request
    }

    fn decode(&self, cursor: &Cursor, body: &str) -> Result<Page<Activity>> {
        let records: Vec<Activity> = serde_json::from_str(body)?;
        let next = match cursor {
            Cursor::Page(page) => Cursor::Page(page + 1),
            Cursor::Offset(offset) => Cursor::Offset(offset + records.len() as u32),
        };
        Ok(Page {
            records,
            next: Some(next),
        })
    }
}

/// Start of an export window reaching `days_back` days before `now`.
///
/// Fails with [`Error::Config`] instead of overflowing when the window would
/// start before the earliest date chrono can represent.
pub fn window_start(now: DateTime<Utc>, days_back: u32) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(days_back))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| Error::config(format!("days back {days_back} is out of range")))
}

/// Stops at the first activity starting at or after `before`.
///
/// Only meaningful for ascending listings, i.e. together with [`ActivitySource::after`].
pub fn started_before(before: DateTime<Utc>) -> Cutoff<Activity> {
    Box::new(move |activity: &Activity| activity.start_date < before)
}

pub fn to_row(activity: &Activity) -> ActivityRow {
    let sport_type = activity
        .sport_type
        .clone()
        .or_else(|| activity.kind.clone())
        .unwrap_or_default();

    ActivityRow {
        id: activity.id,
        name: activity.name.clone(),
        sport_type,
        start_date: activity.start_date_local.clone(),
        distance_km: utils::round_to(activity.distance / 1000.0, 2),
        moving_time_min: utils::round_to(activity.moving_time as f64 / 60.0, 1),
        elapsed_time_min: utils::round_to(activity.elapsed_time as f64 / 60.0, 1),
        average_speed_kmph: utils::round_to(activity.average_speed * 3.6, 2),
        max_speed_kmph: utils::round_to(activity.max_speed * 3.6, 2),
        total_elevation_gain_m: activity.total_elevation_gain,
        average_heartrate: activity.average_heartrate,
        max_heartrate: activity.max_heartrate,
        calories: activity.calories,
        trainer: activity.trainer,
        commute: activity.commute,
    }
}

/// Activity count and distance per sport, sorted by sport name.
pub fn summarize(rows: &[ActivityRow]) -> Vec<SportSummaryRow> {
    let mut by_sport: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for row in rows {
        let entry = by_sport.entry(row.sport_type.as_str()).or_default();
        entry.0 += 1;
        entry.1 += row.distance_km;
    }

    by_sport
        .into_iter()
        .map(|(sport, (count, km))| SportSummaryRow {
            sport_type: sport.to_string(),
            activity_count: count,
            distance_km: utils::round_to(km, 2),
        })
        .collect()
}
