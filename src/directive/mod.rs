//! Template directives
//!
//! Templates mark conditional spans with plain-text markers:
//!
//! ```text
//! % fullscreen %
//! <button id="fullscreen">Fullscreen</button>
//! % /fullscreen %
//! ```
//!
//! A section is removed with [`strip_section`]; markers of sections that are
//! kept are erased afterwards with [`strip_all_markers`]. Placeholders such as
//! `{TITLE}` are filled with [`substitute`] and [`substitute_all`].

mod lint;
mod strip;

pub use lint::{check_markers, MarkerCategory, MarkerWarning};
pub use strip::{
    end_marker, start_marker, strip_all_markers, strip_section, substitute, substitute_all,
};
