use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::times::{self, TimeError, TimeWindow};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("restaurant must not be empty")]
    EmptyRestaurant,
    #[error("experience_id must not be empty")]
    EmptyExperienceId,
    #[error("day {0} is not a valid day of the month")]
    BadDay(u32),
    #[error("sessions must be at least 1")]
    NoSessions,
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Tock credentials for the optional pre-poll login. Tock currently lets you
/// claim a slot anonymously and sign in afterwards, so this stays off by
/// default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Login {
    pub email: String,
    pub password: String,
}

/// Load an unpacked proxy extension with a persistent Chrome profile instead
/// of a throwaway incognito one. Only worth enabling when the refresh delay
/// is aggressive enough to risk an IP ban.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyExtension {
    pub extension_dir: PathBuf,
    pub user_data_dir: PathBuf,
    #[serde(default = "default_profile")]
    pub profile: String,
}

fn default_profile() -> String {
    "Default".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Restaurant slug as it appears in the exploretock.com URL, e.g. "tfl".
    pub restaurant: String,
    /// Experience id from the calendar URL, e.g. "273030".
    pub experience_id: String,
    pub party_size: u32,
    /// English month name, e.g. "August".
    pub month: String,
    pub day: u32,
    pub year: i32,
    pub earliest_time: String,
    pub latest_time: String,
    /// Local timestamp when reservations open. None starts polling at once.
    pub release_time: Option<String>,
    pub time_format: String,
    pub release_time_format: String,
    /// Pause between poll rounds once slot buttons are rendering.
    pub refresh_delay_ms: u64,
    /// How long to wait for slot buttons before assuming reservations are
    /// still closed and refreshing.
    pub slot_timeout_ms: u64,
    /// How long the browser stays open after a claim so the reservation can
    /// be finalized by hand. Tock holds the slot for ten minutes.
    pub hold_open_secs: u64,
    /// Independent browser sessions raced in parallel.
    pub sessions: u32,
    pub session_stagger_secs: u64,
    /// Scan and report matches without clicking.
    pub dry_run: bool,
    pub headless: bool,
    pub chrome_beta: bool,
    pub chrome_binary: Option<PathBuf>,
    pub login: Option<Login>,
    pub proxy_extension: Option<ProxyExtension>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            restaurant: "tfl".to_string(),
            experience_id: "273030".to_string(),
            party_size: 4,
            month: "August".to_string(),
            day: 17,
            year: 2022,
            earliest_time: "5:30 PM".to_string(),
            latest_time: "8:30 PM".to_string(),
            release_time: None,
            time_format: "%I:%M %p".to_string(),
            release_time_format: "%Y-%m-%d %I:%M %p".to_string(),
            refresh_delay_ms: 200,
            slot_timeout_ms: 2000,
            hold_open_secs: 600,
            sessions: 1,
            session_stagger_secs: 1,
            dry_run: false,
            headless: false,
            chrome_beta: false,
            chrome_binary: None,
            login: None,
            proxy_extension: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.restaurant.is_empty() {
            return Err(ConfigError::EmptyRestaurant);
        }
        if self.experience_id.is_empty() {
            return Err(ConfigError::EmptyExperienceId);
        }
        self.month_number()?;
        if !(1..=31).contains(&self.day) {
            return Err(ConfigError::BadDay(self.day));
        }
        if self.sessions == 0 {
            return Err(ConfigError::NoSessions);
        }
        self.window()?;
        self.release()?;
        Ok(())
    }

    pub fn month_number(&self) -> Result<u32, ConfigError> {
        times::month_number(&self.month)
            .ok_or_else(|| TimeError::UnknownMonth(self.month.clone()).into())
    }

    pub fn window(&self) -> Result<TimeWindow, ConfigError> {
        Ok(TimeWindow::parse(
            &self.earliest_time,
            &self.latest_time,
            &self.time_format,
        )?)
    }

    pub fn release(&self) -> Result<Option<chrono::NaiveDateTime>, ConfigError> {
        match &self.release_time {
            Some(raw) => Ok(Some(times::parse_release(raw, &self.release_time_format)?)),
            None => Ok(None),
        }
    }

    /// The experience search URL. The time parameter only centers the result
    /// list, it does not filter, so a fixed 6:30 PM anchor is fine.
    pub fn search_url(&self) -> Result<String, ConfigError> {
        Ok(format!(
            "https://www.exploretock.com/{}/experience/{}/search?date={:04}-{:02}-{:02}&size={}&time=18%3A30",
            self.restaurant,
            self.experience_id,
            self.year,
            self.month_number()?,
            self.day,
            self.party_size,
        ))
    }

    pub fn login_url(&self) -> String {
        format!("https://www.exploretock.com/{}/login", self.restaurant)
    }
}
