mod calendar;
mod fetch;
mod model;
mod parser;
mod schedule;
mod settings;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use calendar::{CalendarEmitter, IcsEmitter};
use fetch::HttpFetcher;
use model::Schedule;
use schedule::ScheduleBuilder;
use settings::Settings;

#[derive(Parser)]
#[command(name = "vct_calendar", about = "VCT tournament and match calendar from vlr.gg")]
struct Cli {
    /// Settings file (default: ./vct_calendar.{toml,yaml,json} if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Day used for year inference and relative labels (YYYY-MM-DD)
    #[arg(long, global = true)]
    reference_date: Option<NaiveDate>,
    /// Matches pages fetched at once
    #[arg(long, global = true)]
    concurrency: Option<usize>,
    /// Offset of the site's times from UTC, in minutes
    #[arg(long, global = true, allow_negative_numbers = true)]
    utc_offset: Option<i32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the schedule and write an .ics calendar (default)
    Ics {
        /// Output file (default: settings `output`, vct-cn.ics)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build the schedule and dump it as JSON
    Json {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Tournaments overview table
    Overview {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

impl Cli {
    /// File and environment first, flags last.
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(date) = self.reference_date {
            settings.reference_date = Some(date);
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(offset) = self.utc_offset {
            settings.utc_offset_minutes = offset;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for `json` output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = cli.settings()?;

    let command = cli.command.unwrap_or(Commands::Ics { output: None });
    let result = match command {
        Commands::Ics { output } => {
            let schedule = build_schedule(&settings).await?;
            let events = calendar::flatten(&schedule, &settings);
            let doc = IcsEmitter::new(settings.offset(), Utc::now()).emit(&events)?;

            let path = output.unwrap_or_else(|| settings.output.clone());
            std::fs::write(&path, doc)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Wrote {} events ({} tournaments, {} matches) to {}",
                events.len(),
                schedule.tournaments.len(),
                schedule.match_count(),
                path.display()
            );
            Ok(())
        }
        Commands::Json { output } => {
            let schedule = build_schedule(&settings).await?;
            let json = serde_json::to_string_pretty(&schedule)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote schedule to {}", path.display());
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        Commands::Overview { limit } => {
            let schedule = build_schedule(&settings).await?;
            if schedule.is_empty() {
                println!("No tournaments found.");
                return Ok(());
            }
            print_overview(&schedule, limit);
            Ok(())
        }
    };

    let took = t0.elapsed();
    if took.as_secs() >= 1 {
        println!("\nDone in {}", elapsed(took));
    }

    result
}

/// The listing page is the one fetch whose failure ends the run.
async fn build_schedule(settings: &Settings) -> anyhow::Result<Schedule> {
    let fetcher = HttpFetcher::new(
        &settings.user_agent,
        Duration::from_secs(settings.timeout_secs),
    )?;
    let builder = ScheduleBuilder::new(settings.clone(), fetcher).with_progress(true);

    let schedule = builder
        .build()
        .await
        .inspect_err(|e| error!(url = %settings.listing_url(), error = %e, "listing page unavailable, nothing written"))
        .context("Failed to fetch the tournament listing")?;
    Ok(schedule)
}

fn print_overview(schedule: &Schedule, limit: usize) {
    println!(
        "{:>3} | {:<36} | {:<23} | {:<6} | {:<9} | {:>7} | {:<12}",
        "#", "Tournament", "Dates", "Region", "Status", "Matches", "Prize"
    );
    println!("{}", "-".repeat(112));

    for (i, t) in schedule.tournaments.iter().take(limit).enumerate() {
        let dates = format!("{} → {}", t.start.date(), t.end.date());
        println!(
            "{:>3} | {:<36} | {:<23} | {:<6} | {:<9} | {:>7} | {:<12}",
            i + 1,
            fit(&t.title, 36),
            dates,
            fit(&t.region, 6),
            fit(&t.status, 9),
            t.matches.len(),
            fit(&t.prize_pool, 12)
        );
    }

    // Upcoming matches, in page order
    let upcoming: Vec<_> = schedule
        .tournaments
        .iter()
        .flat_map(|t| &t.matches)
        .filter(|m| m.reminder.is_some())
        .collect();
    if !upcoming.is_empty() {
        println!("\n--- Upcoming matches ---");
        for m in upcoming.iter().take(limit) {
            let eta = if m.eta.is_empty() { "-" } else { m.eta.as_str() };
            println!("  {} | {} | {} ({})", m.start, fit(&m.title, 40), fit(&m.series, 24), eta);
        }
    }

    println!(
        "\n{} tournaments | {} matches",
        schedule.tournaments.len(),
        schedule.match_count()
    );
}

/// Shorten to `width` chars for a table column, marking the cut with `…`.
fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

/// `0.4s`, `12.0s`, `3m 07s`, `1h 02m`.
fn elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, secs % 3600 / 60, secs % 60) {
        (0, 0, _) => format!("{:.1}s", d.as_secs_f64()),
        (0, m, s) => format!("{}m {:02}s", m, s),
        (h, m, _) => format!("{}h {:02}m", h, m),
    }
}
