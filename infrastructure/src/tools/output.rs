//! Output size limits shared by every tool.
//!
//! Tool text is capped at [`MAX_OUTPUT_CHARS`] characters, notice and footer
//! included. Truncation keeps whole items (lines, paths, results) and appends
//! a notice naming how many were shown, so the model can narrow its request.

use klaude_domain::core::string::truncate_chars;

/// Ceiling on the text of one tool result, in characters.
pub const MAX_OUTPUT_CHARS: usize = 30_000;

/// Items kept by [`cap_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capped {
    pub text: String,
    /// Items that appear in `text`, including one cut short.
    pub shown: usize,
    pub total: usize,
    /// The last shown item was cut short.
    pub partial: bool,
}

impl Capped {
    pub fn is_truncated(&self) -> bool {
        self.partial || self.shown < self.total
    }
}

/// How an item that does not fit is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Drop it, unless nothing was shown yet.
    WholeItems,
    /// Cut it to the remaining room.
    SplitLast,
}

/// Join `items` with newlines, keeping only whole items while the text fits in
/// `max_chars`. A first item longer than the limit is cut rather than dropped.
pub fn cap_items<S: AsRef<str>>(items: &[S], max_chars: usize) -> Capped {
    cap_items_with(items, max_chars, Overflow::WholeItems)
}

pub fn cap_items_with<S: AsRef<str>>(items: &[S], max_chars: usize, overflow: Overflow) -> Capped {
    let total = items.len();
    let mut text = String::new();
    let mut used = 0;
    let mut shown = 0;
    let mut partial = false;

    for item in items {
        let item = item.as_ref();
        let len = item.chars().count();
        let sep = usize::from(shown > 0);
        if used + sep + len > max_chars {
            let room = max_chars.saturating_sub(used + sep);
            if room > 0 && (shown == 0 || overflow == Overflow::SplitLast) {
                if sep > 0 {
                    text.push('\n');
                }
                text.push_str(truncate_chars(item, room));
                shown += 1;
                partial = true;
            }
            break;
        }
        if sep > 0 {
            text.push('\n');
        }
        text.push_str(item);
        used += sep + len;
        shown += 1;
    }

    Capped {
        text,
        shown,
        total,
        partial,
    }
}

fn notice(shown: usize, total: usize, partial: bool, unit: &str, hint: &str) -> String {
    let cut = if partial { ", the last one cut short" } else { "" };
    format!(
        "\n\n[Output truncated: showing {} of {} {}{}]\n{}",
        shown, total, unit, cut, hint
    )
}

/// Cap `items` at [`MAX_OUTPUT_CHARS`] and describe any cut.
///
/// `unit` names the items in the notice ("files", "results", "lines") and
/// `hint` tells the model how to get the rest.
pub fn render_capped<S: AsRef<str>>(items: &[S], unit: &str, hint: &str) -> String {
    render_capped_full(items, MAX_OUTPUT_CHARS, Overflow::WholeItems, unit, hint, None)
}

/// Like [`render_capped`], then `footer` after a blank line. The footer is
/// always kept and counts against the cap.
pub fn render_capped_with_footer<S: AsRef<str>>(
    items: &[S],
    unit: &str,
    hint: &str,
    footer: &str,
) -> String {
    render_capped_full(
        items,
        MAX_OUTPUT_CHARS,
        Overflow::WholeItems,
        unit,
        hint,
        Some(footer),
    )
}

/// Like [`render_capped`], but a line that does not fit is cut to the
/// remaining room instead of dropped. Suits prose, where one line can be a
/// whole paragraph.
pub fn render_capped_prose<S: AsRef<str>>(items: &[S], unit: &str, hint: &str) -> String {
    render_capped_full(items, MAX_OUTPUT_CHARS, Overflow::SplitLast, unit, hint, None)
}

pub fn render_capped_with<S: AsRef<str>>(
    items: &[S],
    max_chars: usize,
    unit: &str,
    hint: &str,
) -> String {
    render_capped_full(items, max_chars, Overflow::WholeItems, unit, hint, None)
}

pub fn render_capped_full<S: AsRef<str>>(
    items: &[S],
    max_chars: usize,
    overflow: Overflow,
    unit: &str,
    hint: &str,
    footer: Option<&str>,
) -> String {
    let footer = footer.map(|f| format!("\n\n{}", f)).unwrap_or_default();
    let budget = max_chars.saturating_sub(footer.chars().count());

    let whole = cap_items_with(items, budget, overflow);
    if !whole.is_truncated() {
        return format!("{}{}", whole.text, footer);
    }

    // Counts never exceed `total`, so this is the longest notice possible.
    let total = items.len();
    let reserve = notice(total, total, true, unit, hint).chars().count();
    let capped = cap_items_with(items, budget.saturating_sub(reserve), overflow);
    let text = format!(
        "{}{}{}",
        capped.text,
        notice(capped.shown, capped.total, capped.partial, unit, hint),
        footer
    );
    truncate_chars(&text, max_chars).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_output_untouched() {
        let items = vec!["a", "b", "c"];
        assert_eq!(render_capped(&items, "lines", "hint"), "a\nb\nc");
    }

    #[test]
    fn test_cut_keeps_whole_items() {
        let items = vec!["aaaa", "bbbb", "cccc"];
        let capped = cap_items(&items, 10);
        assert_eq!(capped.text, "aaaa\nbbbb");
        assert_eq!((capped.shown, capped.total), (2, 3));
        assert!(!capped.partial);
    }

    #[test]
    fn test_notice_names_counts() {
        let items = vec!["aaaa"; 20];
        let text = render_capped_with(&items, 90, "files", "Narrow.");
        assert!(text.chars().count() <= 90);
        assert_eq!(
            text,
            "aaaa\naaaa\naaaa\n\n[Output truncated: showing 3 of 20 files]\nNarrow."
        );
    }

    #[test]
    fn test_truncated_body_never_exceeds_limit() {
        let items: Vec<String> = (0..10_000).map(|i| format!("/some/path/file_{i}.rs")).collect();
        let capped = cap_items(&items, MAX_OUTPUT_CHARS);
        assert!(capped.text.chars().count() <= MAX_OUTPUT_CHARS);
        assert!(capped.is_truncated());
    }

    #[test]
    fn test_rendered_output_with_notice_and_footer_fits_cap() {
        let items: Vec<String> = (0..10_000).map(|i| format!("/some/path/file_{i}.rs")).collect();
        let footer = "NOTE: footer text that must survive.";

        let plain = render_capped(&items, "files", "Narrow the pattern.");
        assert!(plain.chars().count() <= MAX_OUTPUT_CHARS);
        assert!(plain.ends_with("Narrow the pattern."));

        let with_footer = render_capped_with_footer(&items, "files", "Narrow the pattern.", footer);
        assert!(with_footer.chars().count() <= MAX_OUTPUT_CHARS);
        assert!(with_footer.contains("[Output truncated: showing "));
        assert!(with_footer.ends_with(footer));
    }

    #[test]
    fn test_footer_alone_when_output_fits() {
        let items = vec!["a", "b"];
        assert_eq!(
            render_capped_with_footer(&items, "lines", "hint", "NOTE"),
            "a\nb\n\nNOTE"
        );
    }

    #[test]
    fn test_oversized_first_item_is_cut_and_counted() {
        let long = "x".repeat(50);
        let capped = cap_items(&[long], 20);
        assert_eq!(capped.text.len(), 20);
        assert_eq!(capped.shown, 1);
        assert!(capped.partial);
        assert!(capped.is_truncated());
    }

    #[test]
    fn test_partial_item_named_in_notice() {
        let long = "x".repeat(500);
        let text = render_capped_with(&[long], 200, "lines", "hint");
        assert!(text.chars().count() <= 200);
        assert!(text.starts_with("xxxx"));
        assert!(text.contains("[Output truncated: showing 1 of 1 lines, the last one cut short]"));
    }

    #[test]
    fn test_split_last_cuts_overflowing_line() {
        let items = vec!["short".to_string(), "y".repeat(100)];
        let capped = cap_items_with(&items, 20, Overflow::SplitLast);
        assert_eq!(capped.text, format!("short\n{}", "y".repeat(14)));
        assert_eq!((capped.shown, capped.total), (2, 2));
        assert!(capped.partial);

        let whole = cap_items(&items, 20);
        assert_eq!(whole.text, "short");
        assert_eq!(whole.shown, 1);
    }
}
