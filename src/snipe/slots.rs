use anyhow::{Context, Result};
use chromiumoxide::page::Page;

use crate::page;
use crate::times::TimeWindow;

use super::{AVAILABLE_SLOT, SLOT_TIME_LABEL};

/// One available-slot button and the time text rendered inside it. The index
/// is the button's position in the rendered list, used to click it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    pub label: String,
}

fn scan_js() -> String {
    format!(
        r#"(() => {{
            const buttons = document.querySelectorAll({button_sel});
            return Array.from(buttons).map((el, index) => {{
                const span = el.querySelector({label_sel});
                return {{ index: index, label: span ? span.textContent.trim() : '' }};
            }});
        }})()"#,
        button_sel = serde_json::to_string(AVAILABLE_SLOT).unwrap_or_default(),
        label_sel = serde_json::to_string(SLOT_TIME_LABEL).unwrap_or_default()
    )
}

/// Collect the time label of every available slot button on the page.
pub async fn scan(page: &Page) -> Result<Vec<Slot>> {
    let result: serde_json::Value = page
        .evaluate(scan_js().as_str())
        .await
        .context("Failed to scan slot buttons")?
        .into_value()
        .context("Failed to parse slot scan result")?;

    let arr = result.as_array().context("Expected array of slots")?;
    let mut slots = Vec::with_capacity(arr.len());
    for item in arr {
        slots.push(Slot {
            index: item["index"].as_u64().unwrap_or(0) as usize,
            label: item["label"].as_str().unwrap_or("").to_string(),
        });
    }
    Ok(slots)
}

/// Pick the first slot whose label parses as a clock time inside the window.
/// Labels that don't parse (Tock sometimes renders non-time chips in the
/// same list) are logged and skipped.
pub fn first_match<'a>(slots: &'a [Slot], window: &TimeWindow, format: &str) -> Option<&'a Slot> {
    for slot in slots {
        tracing::info!("Encountered time {}", slot.label);
        match chrono::NaiveTime::parse_from_str(&slot.label, format) {
            Ok(time) if window.contains(time) => return Some(slot),
            Ok(_) => {}
            Err(_) => tracing::debug!("Skipping unparseable slot label: {}", slot.label),
        }
    }
    None
}

/// Element expression resolving the slot's button only while its time label
/// still reads `label`. The list is React-rendered and can reshuffle between
/// the scan and the click, so an index alone may land on a different time.
fn guarded_button_js(slot: &Slot) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelectorAll({button_sel})[{index}];
            if (!el) return null;
            const span = el.querySelector({label_sel});
            const label = span ? span.textContent.trim() : '';
            return label === {expected} ? el : null;
        }})()"#,
        button_sel = serde_json::to_string(AVAILABLE_SLOT).unwrap_or_default(),
        index = slot.index,
        label_sel = serde_json::to_string(SLOT_TIME_LABEL).unwrap_or_default(),
        expected = serde_json::to_string(&slot.label).unwrap_or_default()
    )
}

/// Click the chosen slot button. Ok(false) when the list re-rendered and the
/// button no longer carries the scanned time; the caller should rescan.
pub async fn claim(page: &Page, slot: &Slot) -> Result<bool> {
    page::click_expr(page, &guarded_button_js(slot), &slot.label)
        .await
        .with_context(|| format!("Failed to click slot {}", slot.label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: usize, label: &str) -> Slot {
        Slot {
            index,
            label: label.to_string(),
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::parse("5:30 PM", "8:30 PM", "%I:%M %p").unwrap()
    }

    #[test]
    fn test_first_match_picks_earliest_listed() {
        let slots = vec![
            slot(0, "12:00 PM"),
            slot(1, "6:15 PM"),
            slot(2, "7:00 PM"),
        ];
        let found = first_match(&slots, &window(), "%I:%M %p").unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn test_first_match_window_boundaries_inclusive() {
        let slots = vec![slot(0, "5:30 PM")];
        assert!(first_match(&slots, &window(), "%I:%M %p").is_some());
        let slots = vec![slot(0, "8:30 PM")];
        assert!(first_match(&slots, &window(), "%I:%M %p").is_some());
        let slots = vec![slot(0, "8:45 PM")];
        assert!(first_match(&slots, &window(), "%I:%M %p").is_none());
    }

    #[test]
    fn test_first_match_skips_garbage_labels() {
        let slots = vec![
            slot(0, ""),
            slot(1, "Waitlist"),
            slot(2, "6:00 PM"),
        ];
        let found = first_match(&slots, &window(), "%I:%M %p").unwrap();
        assert_eq!(found.index, 2);
    }

    #[test]
    fn test_first_match_empty_scan() {
        assert!(first_match(&[], &window(), "%I:%M %p").is_none());
    }

    #[test]
    fn test_scan_js_embeds_escaped_selectors() {
        let js = scan_js();
        assert!(js.contains(r#"document.querySelectorAll("button.Consumer-resultsListItem.is-available")"#));
        assert!(js.contains(r#"el.querySelector("span.Consumer-resultsListItemTime span")"#));
    }

    #[test]
    fn test_guarded_button_js_checks_label_before_resolving() {
        let js = guarded_button_js(&slot(1, "6:30 PM"));
        assert!(js.contains(r#"document.querySelectorAll("button.Consumer-resultsListItem.is-available")[1]"#));
        assert!(js.contains(r#"label === "6:30 PM" ? el : null"#));
    }

    #[test]
    fn test_guarded_button_js_escapes_label() {
        // A label with a quote must not break out of the comparison string.
        let js = guarded_button_js(&slot(0, r#"6:30 PM ""special""#));
        assert!(js.contains(r#"label === "6:30 PM \"special\"""#));
    }
}
