//! Lint pass for template markers.
//!
//! Stripping tolerates malformed markers silently; this pass reports them so
//! template authors can see which sections would survive unexpectedly.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use super::strip::marker_spans;

/// A problem with the marker pairing in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerWarning {
    pub category: MarkerCategory,
    /// Section name the marker belongs to
    pub name: String,
    /// Byte range of the offending marker
    pub span: Range<usize>,
}

/// Category of marker defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerCategory {
    /// Start marker with no end marker after it
    UnclosedStart,
    /// End marker with no start marker before it
    UnopenedEnd,
    /// A second start marker before the first one was closed
    RepeatedStart,
}

impl fmt::Display for MarkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerCategory::UnclosedStart => write!(f, "unclosed"),
            MarkerCategory::UnopenedEnd => write!(f, "unopened"),
            MarkerCategory::RepeatedStart => write!(f, "repeated"),
        }
    }
}

impl fmt::Display for MarkerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            MarkerCategory::UnclosedStart => {
                write!(f, "section '{}' is never closed", self.name)
            }
            MarkerCategory::UnopenedEnd => {
                write!(f, "section '{}' is closed without being opened", self.name)
            }
            MarkerCategory::RepeatedStart => {
                write!(f, "section '{}' is opened again before it was closed", self.name)
            }
        }
    }
}

impl MarkerWarning {
    /// Format the warning with template context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        // ariadne counts chars, the lexer hands out bytes
        let start = char_offset(source, self.span.start);
        let end = char_offset(source, self.span.end);

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Warning, filename, start)
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, start..end))
                    .with_message(format!("{} marker", self.category))
                    .with_color(Color::Yellow),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

fn char_offset(source: &str, byte: usize) -> usize {
    source[..byte.min(source.len())].chars().count()
}

/// Check that every section marker in `text` is paired in appearance order.
///
/// Warnings are returned in the order their markers appear.
pub fn check_markers(text: &str) -> Vec<MarkerWarning> {
    let mut warnings = Vec::new();
    let mut open: HashMap<&str, Range<usize>> = HashMap::new();

    for (span, name, closing) in marker_spans(text) {
        if closing {
            if open.remove(name).is_none() {
                warnings.push(MarkerWarning {
                    category: MarkerCategory::UnopenedEnd,
                    name: name.to_string(),
                    span,
                });
            }
        } else if open.contains_key(name) {
            warnings.push(MarkerWarning {
                category: MarkerCategory::RepeatedStart,
                name: name.to_string(),
                span,
            });
        } else {
            open.insert(name, span);
        }
    }

    let mut unclosed: Vec<_> = open.into_iter().collect();
    unclosed.sort_by_key(|(_, span)| span.start);
    warnings.extend(unclosed.into_iter().map(|(name, span)| MarkerWarning {
        category: MarkerCategory::UnclosedStart,
        name: name.to_string(),
        span,
    }));

    warnings.sort_by_key(|w| w.span.start);
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_template() {
        let text = "% a %x% /a %% b %% /b %% a %y% /a %";
        assert!(check_markers(text).is_empty());
    }

    #[test]
    fn test_unclosed_start() {
        let warnings = check_markers("head % fullscreen % tail");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, MarkerCategory::UnclosedStart);
        assert_eq!(warnings[0].name, "fullscreen");
        assert_eq!(warnings[0].span, 5..19);
    }

    #[test]
    fn test_unopened_end() {
        let warnings = check_markers("% /cloud-ws %");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, MarkerCategory::UnopenedEnd);
    }

    #[test]
    fn test_repeated_start() {
        let warnings = check_markers("% a %% a %% /a %");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, MarkerCategory::RepeatedStart);
        assert_eq!(warnings[0].span, 5..10);
    }

    #[test]
    fn test_warnings_in_source_order() {
        let warnings = check_markers("% b % % /a %");
        let categories: Vec<String> = warnings.iter().map(|w| w.category.to_string()).collect();
        assert_eq!(categories, vec!["unclosed", "unopened"]);
    }

    #[test]
    fn test_format_mentions_section() {
        let source = "<p>\n% no-vm %\n</p>\n";
        let warnings = check_markers(source);
        let report = warnings[0].format(source, "template.html");
        assert!(report.contains("section 'no-vm' is never closed"));
        assert!(report.contains("template.html"));
    }
}
