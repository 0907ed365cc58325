use std::io::Write;

use tock_sniper::config::Config;
use tock_sniper::snipe::slots::{Slot, first_match};

fn write_config(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(json.as_bytes()).expect("Failed to write config");
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"{
            "restaurant": "ssam",
            "experience_id": "98765",
            "party_size": 2,
            "month": "october",
            "day": 3,
            "year": 2026,
            "earliest_time": "6:00 PM",
            "latest_time": "9:00 PM",
            "release_time": "2026-09-01 9:00 AM",
            "refresh_delay_ms": 100,
            "sessions": 3,
            "dry_run": true
        }"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.sessions, 3);
    assert!(config.dry_run);
    assert_eq!(
        config.search_url().unwrap(),
        "https://www.exploretock.com/ssam/experience/98765/search?date=2026-10-03&size=2&time=18%3A30"
    );
    assert_eq!(config.login_url(), "https://www.exploretock.com/ssam/login");

    let release = config.release().unwrap().unwrap();
    assert_eq!(release.format("%Y-%m-%d %H:%M").to_string(), "2026-09-01 09:00");
}

#[test]
fn test_load_rejects_bad_window() {
    let file = write_config(
        r#"{"earliest_time": "9:00 PM", "latest_time": "5:00 PM"}"#,
    );
    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_load_rejects_invalid_json() {
    let file = write_config("{ not json");
    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_config_window_drives_slot_matching() {
    let file = write_config(
        r#"{"earliest_time": "6:00 PM", "latest_time": "7:00 PM"}"#,
    );
    let config = Config::load(file.path()).unwrap();
    let window = config.window().unwrap();

    let rendered = vec![
        Slot { index: 0, label: "5:45 PM".into() },
        Slot { index: 1, label: "Notify me".into() },
        Slot { index: 2, label: "6:30 PM".into() },
        Slot { index: 3, label: "6:45 PM".into() },
    ];

    let slot = first_match(&rendered, &window, &config.time_format).unwrap();
    assert_eq!(slot.index, 2);
    assert_eq!(slot.label, "6:30 PM");
}
