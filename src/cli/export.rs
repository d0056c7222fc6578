use std::path::PathBuf;

use chrono::Utc;
use indicatif::ProgressBar;
use tabled::Table;

use crate::{
    clock::Clock,
    config::{FetchSettings, ProviderConfig},
    error::Result,
    fetch::{PageSource, Pages},
    http::Transport,
    info,
    strava::{self, ActivitySource, MAX_PER_PAGE},
    success, utils,
};

use super::{connect, spinner};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub days_back: u32,
    pub per_page: u32,
    /// `YYYY-MM-DD`; activities starting on or after this day are left out
    pub before: Option<String>,
    pub output: PathBuf,
    pub summary: PathBuf,
}

/// Exports the athlete's recent activities plus a per-sport summary as CSV.
pub async fn export(
    config: &ProviderConfig,
    settings: &FetchSettings,
    opts: &ExportOptions,
) -> Result<()> {
    let cutoff = match &opts.before {
        Some(raw) => Some(strava::started_before(utils::parse_date(raw)?)),
        None => None,
    };
    let after = strava::window_start(Utc::now(), opts.days_back)?;
    let source = ActivitySource::new(&config.api_url).after(after);

    let mut fetcher = connect(config, settings).await?;
    let per_page = opts.per_page.clamp(1, MAX_PER_PAGE);

    let pb = spinner("Fetching Strava activities...");
    let fetched = {
        let mut pages = fetcher.pages(source, per_page, cutoff);
        drain(&mut pages, &pb).await
    };
    pb.finish_and_clear();
    let activities = fetched?;

    if activities.is_empty() {
        info!("No activities found in the last {} days", opts.days_back);
        return Ok(());
    }

    let rows: Vec<_> = activities.iter().map(strava::to_row).collect();
    let summary = strava::summarize(&rows);
    strava::write_export(&rows, &summary, &opts.output, &opts.summary).await?;

    success!(
        "Exported {} activities to {}",
        rows.len(),
        opts.output.display()
    );
    success!("Summary by sport written to {}", opts.summary.display());
    println!("{}", Table::new(&summary));
    Ok(())
}

async fn drain<T: Transport, C: Clock, S: PageSource>(
    pages: &mut Pages<'_, T, C, S>,
    pb: &ProgressBar,
) -> Result<Vec<S::Record>> {
    let mut all = Vec::new();
    while let Some(records) = pages.next_page().await? {
        all.extend(records);
        pb.set_message(format!(
            "Fetched {} activities ({} pages)...",
            all.len(),
            pages.pages_fetched()
        ));
    }
    Ok(all)
}
