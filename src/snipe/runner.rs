use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::browser::Session;
use crate::config::Config;
use crate::{page, times};

use super::{AVAILABLE_SLOT, login, slots};

/// How a session's poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// This session clicked a slot (or would have, in dry-run mode).
    Claimed,
    /// Another session claimed first.
    Lost,
}

/// One full session lifecycle: launch, optional login, navigate, wait for
/// the release, then poll until this session claims or another one does.
pub async fn run_session(id: u32, config: &Config, claimed: &AtomicBool) -> Result<Outcome> {
    let window = config.window()?;
    tracing::info!(
        "[session {}] looking for {} {} {} between {} and {} for {}",
        id,
        config.month,
        config.day,
        config.year,
        config.earliest_time,
        config.latest_time,
        config.party_size,
    );

    let session = Session::launch(config).await?;
    let outcome = poll_for_slot(id, config, &session, window, claimed).await;
    session.close().await?;
    outcome
}

async fn poll_for_slot(
    id: u32,
    config: &Config,
    session: &Session,
    window: times::TimeWindow,
    claimed: &AtomicBool,
) -> Result<Outcome> {
    let page = session.page();

    if let Some(creds) = &config.login {
        login::sign_in(page, config, creds).await?;
    }

    session.goto_persistent(&config.search_url()?).await?;

    // Camp on the loaded page until the release instant, then refresh so the
    // first poll sees post-release markup.
    if let Some(release) = config.release()? {
        if times::sleep_until_release(release).await {
            session.refresh().await;
        }
    }

    while !claimed.load(Ordering::SeqCst) {
        // No slot buttons at all means the release hasn't hit the backend
        // yet (or the page is mid-render). Refresh and try again.
        if page::wait_for_selector(page, AVAILABLE_SLOT, config.slot_timeout_ms)
            .await
            .is_err()
        {
            tracing::info!("[session {}] no slot buttons yet, refreshing", id);
            session.refresh().await;
            continue;
        }

        // Give the rest of the list a beat to render.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let scanned = slots::scan(page).await?;
        match slots::first_match(&scanned, &window, &config.time_format) {
            Some(slot) => {
                if config.dry_run {
                    tracing::info!(
                        "[session {}] dry run: would claim {}",
                        id,
                        slot.label
                    );
                } else {
                    tracing::info!("[session {}] claiming {}", id, slot.label);
                    if !slots::claim(page, slot).await? {
                        tracing::warn!(
                            "[session {}] slot list changed before the click, rescanning",
                            id
                        );
                        continue;
                    }
                }
                claimed.store(true, Ordering::SeqCst);

                tracing::info!(
                    "[session {}] holding browser open for {}s to finalize",
                    id,
                    config.hold_open_secs
                );
                tokio::time::sleep(Duration::from_secs(config.hold_open_secs)).await;
                return Ok(Outcome::Claimed);
            }
            None => {
                tracing::info!(
                    "[session {}] {} slots rendered, none in window, refreshing",
                    id,
                    scanned.len()
                );
                tokio::time::sleep(Duration::from_millis(config.refresh_delay_ms)).await;
                session.refresh().await;
            }
        }
    }

    tracing::info!("[session {}] another session claimed, standing down", id);
    Ok(Outcome::Lost)
}
