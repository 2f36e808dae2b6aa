//! Free-text sanitization applied to user-supplied strings before validation.

use std::sync::LazyLock;

use regex::Regex;

/// Opening `<script ...>` tags, attributes included.
static SCRIPT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>").expect("valid regex"));

static SCRIPT_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)</script>").expect("valid regex"));

/// Any remaining HTML tag.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static JS_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));

/// Inline event handler attributes such as `onclick=`.
static EVENT_HANDLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+=").expect("valid regex"));

/// Strip markup and script-like substrings, then trim.
///
/// Steps run in a fixed order: opening script tags, closing script tags,
/// all other tags, the `javascript:` scheme, `on<word>=` handlers. The text
/// between script tags is kept.
pub fn sanitize_input(input: &str) -> String {
    let out = SCRIPT_OPEN_RE.replace_all(input, "");
    let out = SCRIPT_CLOSE_RE.replace_all(&out, "");
    let out = TAG_RE.replace_all(&out, "");
    let out = JS_SCHEME_RE.replace_all(&out, "");
    let out = EVENT_HANDLER_RE.replace_all(&out, "");
    out.trim().to_string()
}

/// [`sanitize_input`] lifted over an optional value; `None` passes through.
pub fn sanitize_opt(input: Option<String>) -> Option<String> {
    input.map(|s| sanitize_input(&s))
}
