//! Scratch Htmlifier - package a Scratch project into a single HTML file
//!
//! This library fetches a project and all of its assets, inlines them as
//! data URIs next to the project runner, and fills an HTML template whose
//! optional sections are switched on and off by an [`OutputConfig`].
//!
//! # Example
//!
//! ```rust
//! use scratch_htmlifier::{render_template, OutputConfig};
//!
//! let template = "<title>{TITLE}</title>% fullscreen %<button>Full</button>% /fullscreen %";
//! let config = OutputConfig::new().with_title("Pong").with_fullscreen(false);
//!
//! let html = render_template(template, &config, "");
//! assert_eq!(html, "<title>Pong</title>");
//! ```

pub mod assets;
pub mod config;
pub mod directive;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod storage;

pub use assets::{AssetDescriptor, AssetKind, AssetResolver, ResolvedAssetMap};
pub use config::{ConfigError, ConfigFile, Endpoints, OutputConfig};
pub use error::{FetchError, LoadError};
pub use fetch::{Fetcher, HttpFetcher, Resource};
pub use pipeline::{
    compose_scripts, default_log, render_template, Htmlifier, ProjectSource, TemplateSource,
    BUNDLED_TEMPLATE,
};
pub use progress::{LoadObserver, LoadedAsset, ProgressState, ProgressTracker};
pub use runner::{ProjectRunner, ScratchRunner};
pub use storage::WebStorage;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a conversion
#[derive(Debug, Error)]
pub enum HtmlifyError {
    /// The runner script or a remote template could not be fetched
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The project or one of its assets could not be loaded
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// A local template could not be read
    #[error("failed to read template '{}': {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The runner finished without asking for the project document
    #[error("project {id} finished loading without its project document")]
    MissingProjectJson { id: String },

    /// Embedded data could not be encoded
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Package a project with default endpoints, printing progress to stderr
///
/// This is the main entry point for the library.
pub fn htmlify(source: &ProjectSource, config: &OutputConfig) -> Result<String, HtmlifyError> {
    Htmlifier::default().convert(source, config)
}
