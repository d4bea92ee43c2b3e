//! Free-text input sanitization.
//!
//! Search boxes and other free-text fields go through [`sanitize_text`]
//! before they reach the data layer or get echoed back to a browser.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));

static EVENT_HANDLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+\s*=").expect("valid regex"));

/// Strip markup and script-injection fragments from user input.
///
/// - Trims leading/trailing whitespace.
/// - Removes `<` and `>`.
/// - Removes `javascript:` (any casing).
/// - Removes inline event-handler tokens such as `onclick=` or `OnLoad =`.
///
/// Removal is repeated until nothing changes, so fragments that only form a
/// forbidden token once their neighbour is removed are caught as well.
///
/// # Examples
///
/// ```
/// use repairdesk_core::sanitize::sanitize_text;
///
/// assert_eq!(sanitize_text("  jane doe "), "jane doe");
/// assert_eq!(sanitize_text("<b>bold</b>"), "bbold/b");
/// assert_eq!(sanitize_text("JavaScript:alert(1)"), "alert(1)");
/// assert_eq!(sanitize_text(""), "");
/// ```
pub fn sanitize_text(input: &str) -> String {
    let mut current = input.trim().to_string();

    loop {
        let stripped: String = current.chars().filter(|c| *c != '<' && *c != '>').collect();
        let stripped = SCRIPT_SCHEME_RE.replace_all(&stripped, "");
        let stripped = EVENT_HANDLER_RE.replace_all(&stripped, "");

        if stripped == current {
            break;
        }
        current = stripped.into_owned();
    }

    current.trim().to_string()
}
