//! DOM helpers built on `Runtime.evaluate`. Everything here takes plain CSS
//! selectors; the Tock markup is stable enough that nothing fancier is
//! needed.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::page::Page;

/// JS expression resolving a CSS selector to an element (or null).
fn selector_js(selector: &str) -> Result<String> {
    let sel = serde_json::to_string(selector)?;
    Ok(format!("document.querySelector({})", sel))
}

/// Run `check` until it reports true or the deadline passes. The deadline is
/// wall-clock, so slow CDP round-trips inside `check` count against it.
async fn wait_until<F, Fut>(timeout_ms: u64, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Wait up to `timeout_ms` for a selector to resolve to a non-null element,
/// polling every 250 ms. Err on timeout.
pub async fn wait_for_selector(page: &Page, selector: &str, timeout_ms: u64) -> Result<()> {
    let check_js = format!(
        r#"(() => {{ const el = {}; return el !== null && el !== undefined; }})()"#,
        selector_js(selector)?
    );

    let found = wait_until(timeout_ms, || {
        let check_js = check_js.clone();
        async move {
            page.evaluate(check_js.as_str())
                .await
                .ok()
                .and_then(|r| r.into_value().ok())
                .unwrap_or(false)
        }
    })
    .await;

    if found {
        Ok(())
    } else {
        anyhow::bail!(
            "Timed out after {}ms waiting for element: {}",
            timeout_ms,
            selector
        )
    }
}

/// Fill an input through the native value setter so framework-bound forms
/// (Tock's login is React) see the change.
pub async fn fill_field(page: &Page, selector: &str, value: &str) -> Result<()> {
    let js = format!(
        r#"(() => {{
            const el = {selector_js};
            if (!el) throw new Error('Element not found: ' + {sel_str});
            el.scrollIntoView({{ block: 'center', behavior: 'instant' }});
            el.focus();
            const setter = Object.getOwnPropertyDescriptor(
                window.HTMLInputElement.prototype, 'value'
            )?.set;
            if (setter) {{
                setter.call(el, {value});
            }} else {{
                el.value = {value};
            }}
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        selector_js = selector_js(selector)?,
        sel_str = serde_json::to_string(selector)?,
        value = serde_json::to_string(value)?
    );

    page.evaluate(js.as_str())
        .await
        .with_context(|| format!("Failed to fill field {}", selector))?;
    Ok(())
}

/// Click the first element matching `selector`. Err if nothing matches.
pub async fn click_element(page: &Page, selector: &str) -> Result<()> {
    if !click_expr(page, &selector_js(selector)?, selector).await? {
        anyhow::bail!("Element not found: {}", selector);
    }
    Ok(())
}

/// Click JS over an arbitrary element expression: scroll into view, dispatch
/// the mouse event sequence when visible, fall back to `el.click()` when the
/// element is hidden or obscured. An expression resolving to null reports
/// `missing` instead of clicking.
fn click_js(element_expr: &str) -> String {
    format!(
        r#"(() => {{
            const el = {element_expr};
            if (!el) return {{ missing: true }};

            el.scrollIntoView({{ block: 'center', inline: 'center', behavior: 'instant' }});
            const rect = el.getBoundingClientRect();
            if (rect.width === 0 && rect.height === 0) {{
                return {{ error: 'Element has zero size' }};
            }}

            const x = rect.left + rect.width / 2;
            const y = rect.top + rect.height / 2;
            const style = getComputedStyle(el);
            const visible = style.display !== 'none'
                && style.visibility !== 'hidden'
                && parseFloat(style.opacity) !== 0;
            const topEl = document.elementFromPoint(x, y);
            const unobscured = topEl && (el === topEl || el.contains(topEl) || topEl.contains(el));

            if (visible && unobscured) {{
                const opts = {{ bubbles: true, cancelable: true, clientX: x, clientY: y, button: 0 }};
                el.dispatchEvent(new MouseEvent('mousemove', opts));
                el.dispatchEvent(new MouseEvent('mousedown', opts));
                el.dispatchEvent(new MouseEvent('mouseup', opts));
                el.dispatchEvent(new MouseEvent('click', opts));
                return {{ method: 'mouse_event' }};
            }}

            el.click();
            return {{ method: 'js_click' }};
        }})()"#,
        element_expr = element_expr
    )
}

/// Evaluate a click over `element_expr`. Ok(false) when the expression
/// resolved to no element (the caller decides whether that is an error).
pub(crate) async fn click_expr(page: &Page, element_expr: &str, label: &str) -> Result<bool> {
    let js = click_js(element_expr);

    let result: serde_json::Value = page
        .evaluate(js.as_str())
        .await
        .context("Failed to evaluate click")?
        .into_value()
        .context("Failed to parse click result")?;

    if result.get("missing").and_then(|m| m.as_bool()).unwrap_or(false) {
        return Ok(false);
    }
    if let Some(error) = result.get("error").and_then(|e| e.as_str()) {
        anyhow::bail!("{}", error);
    }
    tracing::debug!(
        "Clicked {} ({})",
        label,
        result["method"].as_str().unwrap_or("unknown")
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_js_escapes_quotes() {
        let js = selector_js(r#"a[name="x"]"#).unwrap();
        assert_eq!(js, r#"document.querySelector("a[name=\"x\"]")"#);
    }

    #[test]
    fn test_selector_js_plain() {
        let js = selector_js("#submit").unwrap();
        assert_eq!(js, r##"document.querySelector("#submit")"##);
    }

    #[test]
    fn test_click_js_reports_missing_before_dispatch() {
        let js = click_js("document.querySelector(\"button\")");
        assert!(js.contains("if (!el) return { missing: true };"));
        // dispatch order: move, down, up, click
        let order = ["'mousemove'", "'mousedown'", "'mouseup'", "'click'"];
        let mut last = 0;
        for ev in order {
            let pos = js.find(ev).unwrap();
            assert!(pos > last);
            last = pos;
        }
        assert!(js.contains("el.click();"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_true_returns_at_once() {
        assert!(wait_until(1000, || async { true }).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_false_times_out() {
        let start = tokio::time::Instant::now();
        assert!(!wait_until(1000, || async { false }).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_deadline_counts_slow_checks() {
        // Each check burns 400ms of wall clock; the deadline must account
        // for that instead of only summing the 250ms sleeps.
        let start = tokio::time::Instant::now();
        let found = wait_until(1000, || async {
            tokio::time::advance(Duration::from_millis(400)).await;
            false
        })
        .await;
        assert!(!found);
        assert!(start.elapsed() < Duration::from_millis(1500));
    }
}
