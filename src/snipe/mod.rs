pub mod login;
pub mod runner;
pub mod slots;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::config::Config;
use runner::Outcome;

/// Tock markup the sniper keys on.
pub const AVAILABLE_SLOT: &str = "button.Consumer-resultsListItem.is-available";
pub const SLOT_TIME_LABEL: &str = "span.Consumer-resultsListItemTime span";
pub const LOGIN_EMAIL: &str = "input[name=\"email\"]";
pub const LOGIN_PASSWORD: &str = "input[name=\"password\"]";
pub const LOGIN_SUBMIT: &str = ".Button";
pub const ACCOUNT_NAME: &str = ".MainHeader-accountName";

/// Race `config.sessions` independent browser sessions until one claims a
/// slot. Sessions share nothing but the claimed flag; a round where every
/// session fails or loses is followed by a fresh round with new browsers.
///
/// A claim deliberately ends the run — the endless relaunch only covers
/// empty rounds, so an exit here means a slot was taken, not given up on.
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    loop {
        let claimed = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(config.sessions as usize);

        for id in 0..config.sessions {
            let session_config = Arc::clone(&config);
            let claimed = Arc::clone(&claimed);
            handles.push(tokio::spawn(async move {
                runner::run_session(id, &session_config, &claimed).await
            }));
            if id + 1 < config.sessions {
                tokio::time::sleep(std::time::Duration::from_secs(
                    config.session_stagger_secs,
                ))
                .await;
            }
        }

        let mut won = false;
        for handle in handles {
            match handle.await {
                Ok(Ok(Outcome::Claimed)) => won = true,
                Ok(Ok(Outcome::Lost)) => {}
                Ok(Err(e)) => tracing::warn!("Session failed: {:#}", e),
                Err(e) => tracing::warn!("Session task panicked: {}", e),
            }
        }

        if won {
            tracing::info!("Reservation claimed, exiting");
            return Ok(());
        }
        if claimed.load(Ordering::SeqCst) {
            // A session flipped the flag but errored before reporting.
            tracing::info!("Reservation claimed, exiting");
            return Ok(());
        }

        tracing::info!("No session claimed a slot this round, relaunching");
    }
}
