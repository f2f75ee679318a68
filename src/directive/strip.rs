//! Section stripping and placeholder substitution

use std::sync::LazyLock;

use regex::Regex;

/// Any start or end marker, paired or not
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"% /?[a-z0-9-]+ %").expect("marker pattern is valid"));

/// Start marker for a section name, e.g. `% fullscreen %`
pub fn start_marker(name: &str) -> String {
    format!("% {name} %")
}

/// End marker for a section name, e.g. `% /fullscreen %`
pub fn end_marker(name: &str) -> String {
    format!("% /{name} %")
}

/// Remove every `% name %` ... `% /name %` span, markers included.
///
/// Each pass pairs the first start marker with the first end marker that
/// follows it. A start without a later end, or an end without an earlier
/// start, stops the loop and is left in place.
pub fn strip_section(text: &str, name: &str) -> String {
    let start = start_marker(name);
    let end = end_marker(name);

    let mut out = text.to_string();
    while let Some(open) = out.find(&start) {
        let Some(close) = out[open..].find(&end) else {
            break;
        };
        let close = open + close + end.len();
        out.replace_range(open..close, "");
    }
    out
}

/// Erase every remaining marker token regardless of pairing.
///
/// Runs until no marker is left, so text that only forms a marker once
/// another marker inside it is removed gets erased too.
pub fn strip_all_markers(text: &str) -> String {
    let mut out = text.to_string();
    while MARKER.is_match(&out) {
        out = MARKER.replace_all(&out, "").into_owned();
    }
    out
}

/// Replace the first occurrence of `token` with `value`
pub fn substitute(text: &str, token: &str, value: &str) -> String {
    text.replacen(token, value, 1)
}

/// Replace every occurrence of `token` with `value`
pub fn substitute_all(text: &str, token: &str, value: &str) -> String {
    text.replace(token, value)
}

/// Byte spans of every marker in `text`, with the section name and whether it closes
pub(crate) fn marker_spans(
    text: &str,
) -> impl Iterator<Item = (std::ops::Range<usize>, &str, bool)> {
    MARKER.find_iter(text).map(|m| {
        let inner = &m.as_str()[2..m.as_str().len() - 2];
        match inner.strip_prefix('/') {
            Some(name) => (m.range(), name, true),
            None => (m.range(), inner, false),
        }
    })
}
