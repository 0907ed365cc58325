use anyhow::{Context, Result};
use chromiumoxide::page::Page;

use crate::config::{Config, Login};
use crate::page;

use super::{ACCOUNT_NAME, LOGIN_EMAIL, LOGIN_PASSWORD, LOGIN_SUBMIT};

/// Sign in to Tock before polling. Not required to hold a slot today, but
/// kept for the day Tock starts gating the claim behind an account.
pub async fn sign_in(page: &Page, config: &Config, creds: &Login) -> Result<()> {
    let url = config.login_url();
    tracing::info!("Signing in at {}", url);

    page.goto(&url).await.context("Failed to open login page")?;
    page::wait_for_selector(page, LOGIN_EMAIL, config.slot_timeout_ms).await?;

    page::fill_field(page, LOGIN_EMAIL, &creds.email).await?;
    page::fill_field(page, LOGIN_PASSWORD, &creds.password).await?;
    page::click_element(page, LOGIN_SUBMIT).await?;

    // The account name header renders once the session cookie lands.
    page::wait_for_selector(page, ACCOUNT_NAME, config.slot_timeout_ms)
        .await
        .context("Login did not complete")?;

    tracing::info!("Signed in as {}", creds.email);
    Ok(())
}
