use std::path::Path;

use crate::{
    error::Result,
    types::{ActivityRow, SportSummaryRow},
    utils,
};

const ACTIVITY_HEADER: [&str; 15] = [
    "id",
    "name",
    "sport_type",
    "start_date",
    "distance_km",
    "moving_time_min",
    "elapsed_time_min",
    "average_speed_kmph",
    "max_speed_kmph",
    "total_elevation_gain_m",
    "average_heartrate",
    "max_heartrate",
    "calories",
    "trainer",
    "commute",
];

const SUMMARY_HEADER: [&str; 3] = ["sport_type", "activity_count", "distance_km"];

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

pub fn activities_csv(rows: &[ActivityRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.name.clone(),
                row.sport_type.clone(),
                row.start_date.clone(),
                row.distance_km.to_string(),
                row.moving_time_min.to_string(),
                row.elapsed_time_min.to_string(),
                row.average_speed_kmph.to_string(),
                row.max_speed_kmph.to_string(),
                optional(row.total_elevation_gain_m),
                optional(row.average_heartrate),
                optional(row.max_heartrate),
                optional(row.calories),
                flag(row.trainer),
                flag(row.commute),
            ]
        })
        .collect();
    utils::to_csv(&ACTIVITY_HEADER, &rows)
}

pub fn summary_csv(summary: &[SportSummaryRow]) -> String {
    let rows: Vec<Vec<String>> = summary
        .iter()
        .map(|s| {
            vec![
                s.sport_type.clone(),
                s.activity_count.to_string(),
                s.distance_km.to_string(),
            ]
        })
        .collect();
    utils::to_csv(&SUMMARY_HEADER, &rows)
}

/// Writes the activity and summary CSV files.
pub async fn write_export(
    rows: &[ActivityRow],
    summary: &[SportSummaryRow],
    output: &Path,
    summary_output: &Path,
) -> Result<()> {
    async_fs::write(output, activities_csv(rows)).await?;
    async_fs::write(summary_output, summary_csv(summary)).await?;
    Ok(())
}
