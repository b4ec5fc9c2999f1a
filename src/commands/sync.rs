use anyhow::Result;
use calsync_core::{IcsCalendarSource, Pipeline, SyncError, SyncWindow};
use tracing::info;

use crate::config::AppConfig;
use crate::render::render_outcome;

pub struct SyncArgs {
    /// Overrides `sync.window_days`.
    pub days: Option<u32>,
    pub dry_run: bool,
    pub verbose: bool,
}

pub async fn run(config: &AppConfig, args: SyncArgs) -> Result<()> {
    let days = args.days.unwrap_or(config.sync.window_days);
    if days == 0 {
        return Err(SyncError::Config("--days must be at least 1".into()).into());
    }

    let window = SyncWindow::starting_today(config.sync.time_zone, days)?;
    info!(from = %window.start, to = %window.end, dry_run = args.dry_run, "starting sync");

    // A missing store should not cost an OAuth round-trip.
    let source = IcsCalendarSource::new(&config.source.path, &config.sync);
    source.check()?;

    let calendar = calsync_google::connect(&config.google).await?;
    let pipeline = Pipeline::new(&source, &calendar, &config.sync);

    let outcome = if args.dry_run {
        pipeline.plan(&window).await?
    } else {
        pipeline.run(&window).await?
    };

    println!(
        "{}",
        render_outcome(&outcome, &config.sync.date_format, args.verbose)
    );

    Ok(())
}
