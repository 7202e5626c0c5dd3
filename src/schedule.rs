use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::fetch::{FetchError, PageFetcher};
use crate::model::Schedule;
use crate::parser::extract::tournaments::{self, ListingEntry};
use crate::parser::parse_listing_page;
use crate::settings::Settings;

/// Turns the listing page into a [`Schedule`], fetching each tournament's
/// matches page with bounded concurrency.
pub struct ScheduleBuilder<P> {
    settings: Settings,
    fetcher: P,
    progress: bool,
}

impl<P: PageFetcher> ScheduleBuilder<P> {
    pub fn new(settings: Settings, fetcher: P) -> Self {
        Self {
            settings,
            fetcher,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch the listing page and build from it. A listing failure is the
    /// only error; everything below it degrades per record.
    pub async fn build(&self) -> Result<Schedule, FetchError> {
        let html = self.fetcher.fetch(&self.settings.listing_url()).await?;
        Ok(self.build_from_markup(&html).await)
    }

    /// Tournaments come out in listing order regardless of which matches
    /// page answers first.
    pub async fn build_from_markup(&self, listing_html: &str) -> Schedule {
        let entries = parse_listing_page(listing_html);
        info!("Found {} listing entries", entries.len());

        let resolver = self.settings.resolver();
        let pb = self.progress_bar(entries.len());

        let settings = &self.settings;
        let fetcher = &self.fetcher;
        let resolver = &resolver;
        let bar = &pb;

        let results: Vec<_> = stream::iter(entries)
            .map(move |entry: ListingEntry| async move {
                let result = tournaments::extract(&entry, resolver, fetcher, settings).await;
                bar.inc(1);
                (entry, result)
            })
            .buffered(settings.concurrency.max(1))
            .collect()
            .await;

        pb.finish_and_clear();

        let mut tournaments = Vec::with_capacity(results.len());
        for (entry, result) in results {
            match result {
                Ok(t) => {
                    let stray = t.matches_outside_range();
                    if stray > 0 {
                        debug!(title = %t.title, stray, "matches dated outside the tournament range");
                    }
                    tournaments.push(t);
                }
                Err(e) => {
                    warn!(title = %entry.title, dates = %entry.dates, error = %e, "skipping tournament with unreadable dates");
                }
            }
        }

        let schedule = Schedule::new(tournaments);
        info!(
            "Built schedule: {} tournaments, {} matches",
            schedule.tournaments.len(),
            schedule.match_count()
        );
        schedule
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }
}
