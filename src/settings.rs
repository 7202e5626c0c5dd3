use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::model::MatchPolicy;
use crate::parser::dates::DateResolver;

/// Looked up (any supported extension) in the working directory when no `--config` is given.
const DEFAULT_CONFIG_NAME: &str = "vct_calendar";
const ENV_PREFIX: &str = "VCT";
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub listing_path: String,
    pub match_url: String,
    pub organizer_prefix: String,
    pub organizer_email: String,
    pub geo_lat: f64,
    pub geo_lon: f64,
    pub utc_offset_minutes: i32,
    pub match_duration_minutes: NonZeroU32,
    pub match_alarm_minutes: u32,
    pub tournament_alarm_minutes: u32,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub output: PathBuf,
    pub reference_date: Option<NaiveDate>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://www.vlr.gg".into(),
            listing_path: "/vct".into(),
            match_url: "https://vct.qq.com".into(),
            organizer_prefix: "无畏契约".into(),
            organizer_email: "vct@qq.com".into(),
            geo_lat: 30.0095,
            geo_lon: 120.2669,
            utc_offset_minutes: 0,
            match_duration_minutes: NonZeroU32::new(120).unwrap_or(NonZeroU32::MIN),
            match_alarm_minutes: 30,
            tournament_alarm_minutes: 60,
            concurrency: 4,
            timeout_secs: 30,
            user_agent: concat!("vct_calendar/", env!("CARGO_PKG_VERSION")).into(),
            output: PathBuf::from("vct-cn.ics"),
            reference_date: None,
        }
    }
}

impl Settings {
    /// Defaults, then the settings file, then `VCT_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            bail!(
                "utc_offset_minutes {} is outside ±{}",
                self.utc_offset_minutes,
                MAX_OFFSET_MINUTES
            );
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must be an http(s) URL, got {:?}", self.base_url);
        }
        Ok(())
    }

    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.listing_path)
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// The reference day for year inference and relative labels.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().with_timezone(&self.offset()).date_naive())
    }

    pub fn resolver(&self) -> DateResolver {
        DateResolver::new(self.today())
    }

    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy {
            duration_minutes: self.match_duration_minutes,
            alarm_minutes: self.match_alarm_minutes,
        }
    }
}
