use chrono::{Local, NaiveDateTime, NaiveTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeError {
    #[error("unknown month name: {0}")]
    UnknownMonth(String),
    #[error("could not parse clock time {value:?} with format {format:?}")]
    BadClock { value: String, format: String },
    #[error("could not parse release time {value:?} with format {format:?}")]
    BadRelease { value: String, format: String },
    #[error("earliest time {earliest} is after latest time {latest}")]
    InvertedWindow {
        earliest: NaiveTime,
        latest: NaiveTime,
    },
}

/// Resolve an English month name (case-insensitive) to its 1-based number.
pub fn month_number(name: &str) -> Option<u32> {
    let n = match name.to_ascii_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };
    Some(n)
}

pub fn parse_clock(value: &str, format: &str) -> Result<NaiveTime, TimeError> {
    NaiveTime::parse_from_str(value, format).map_err(|_| TimeError::BadClock {
        value: value.to_string(),
        format: format.to_string(),
    })
}

pub fn parse_release(value: &str, format: &str) -> Result<NaiveDateTime, TimeError> {
    NaiveDateTime::parse_from_str(value, format).map_err(|_| TimeError::BadRelease {
        value: value.to_string(),
        format: format.to_string(),
    })
}

/// The inclusive clock window a slot must fall inside to be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub earliest: NaiveTime,
    pub latest: NaiveTime,
}

impl TimeWindow {
    pub fn new(earliest: NaiveTime, latest: NaiveTime) -> Result<Self, TimeError> {
        if earliest > latest {
            return Err(TimeError::InvertedWindow { earliest, latest });
        }
        Ok(Self { earliest, latest })
    }

    pub fn parse(earliest: &str, latest: &str, format: &str) -> Result<Self, TimeError> {
        Self::new(parse_clock(earliest, format)?, parse_clock(latest, format)?)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.earliest <= time && time <= self.latest
    }
}

/// Sleep until one second past the release instant (local clock).
///
/// Returns true when we actually waited, false when the release time has
/// already passed and the caller should start polling immediately.
pub async fn sleep_until_release(release: NaiveDateTime) -> bool {
    let now = Local::now().naive_local();
    let delta = release + chrono::Duration::seconds(1) - now;
    match delta.to_std() {
        Ok(wait) => {
            tracing::info!(
                "Waiting until release time {}, sleeping for {:?}",
                release,
                wait
            );
            tokio::time::sleep(wait).await;
            tracing::info!(
                "Woke up at {}, starting to poll",
                Local::now().naive_local()
            );
            true
        }
        Err(_) => {
            tracing::info!("Release time {} has already passed, polling now", release);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_number_case_insensitive() {
        assert_eq!(month_number("August"), Some(8));
        assert_eq!(month_number("december"), Some(12));
        assert_eq!(month_number("JANUARY"), Some(1));
        assert_eq!(month_number("Smarch"), None);
    }

    #[test]
    fn test_parse_clock_twelve_hour() {
        let t = parse_clock("5:30 PM", "%I:%M %p").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(17, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_clock_rejects_garbage() {
        assert!(matches!(
            parse_clock("25:99", "%I:%M %p"),
            Err(TimeError::BadClock { .. })
        ));
    }

    #[test]
    fn test_parse_release() {
        let dt = parse_release("2022-07-01 10:00 AM", "%Y-%m-%d %I:%M %p").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2022-07-01 10:00");
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let w = TimeWindow::parse("5:30 PM", "8:30 PM", "%I:%M %p").unwrap();
        assert!(w.contains(NaiveTime::from_hms_opt(17, 30, 0).unwrap()));
        assert!(w.contains(NaiveTime::from_hms_opt(20, 30, 0).unwrap()));
        assert!(w.contains(NaiveTime::from_hms_opt(19, 0, 0).unwrap()));
        assert!(!w.contains(NaiveTime::from_hms_opt(17, 29, 0).unwrap()));
        assert!(!w.contains(NaiveTime::from_hms_opt(20, 31, 0).unwrap()));
    }

    #[test]
    fn test_window_rejects_inverted() {
        assert!(matches!(
            TimeWindow::parse("8:30 PM", "5:30 PM", "%I:%M %p"),
            Err(TimeError::InvertedWindow { .. })
        ));
    }

    #[tokio::test]
    async fn test_sleep_until_release_past_returns_immediately() {
        let past = Local::now().naive_local() - chrono::Duration::hours(1);
        assert!(!sleep_until_release(past).await);
    }
}
