//! Output options and service endpoints
//!
//! Both can be built in code with the `with_*` methods or loaded from a TOML
//! file:
//!
//! ```toml
//! [output]
//! title = "My Game"
//! ratio_16_9 = true
//! cloud_server = "wss://clouddata.example.com"
//!
//! [endpoints]
//! timeout_secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Options chosen for one conversion
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Document title
    pub title: String,
    /// Username the project sees
    pub username: String,
    /// Use the 16:9 stage and runner build instead of 4:3
    pub ratio_16_9: bool,
    /// Show a loading progress bar while the project starts
    pub progress_bar: bool,
    /// Show a fullscreen button
    pub fullscreen: bool,
    /// Override colour for variable monitors
    pub monitor_colour: Option<String>,
    /// Cloud variable server; cloud data stays in local storage when unset
    pub cloud_server: Option<String>,
    /// Project id announced to the project
    pub project_id: Option<String>,
    /// Leave the runner script out of the document
    pub no_vm: bool,
    /// Simulate 30 fps compatibility mode
    pub compatibility: bool,
    /// Start in turbo mode
    pub turbo: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            title: "Project".to_string(),
            username: "griffpatch".to_string(),
            ratio_16_9: false,
            progress_bar: true,
            fullscreen: true,
            monitor_colour: None,
            cloud_server: None,
            project_id: None,
            no_vm: false,
            compatibility: true,
            turbo: false,
        }
    }
}

impl OutputConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Choose between the 16:9 and 4:3 stage
    pub fn with_ratio_16_9(mut self, wide: bool) -> Self {
        self.ratio_16_9 = wide;
        self
    }

    pub fn with_progress_bar(mut self, progress_bar: bool) -> Self {
        self.progress_bar = progress_bar;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_monitor_colour(mut self, colour: impl Into<String>) -> Self {
        self.monitor_colour = Some(colour.into());
        self
    }

    pub fn with_cloud_server(mut self, host: impl Into<String>) -> Self {
        self.cloud_server = Some(host.into());
        self
    }

    pub fn with_project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    /// Leave the runner out of the output
    pub fn with_no_vm(mut self, no_vm: bool) -> Self {
        self.no_vm = no_vm;
        self
    }

    pub fn with_compatibility(mut self, compatibility: bool) -> Self {
        self.compatibility = compatibility;
        self
    }

    pub fn with_turbo(mut self, turbo: bool) -> Self {
        self.turbo = turbo;
        self
    }
}

/// Remote services a conversion talks to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    /// Root of the project document service, with trailing slash
    pub project_root: String,
    /// Root of the asset CDN, with trailing slash
    pub asset_root: String,
    /// Runner build for the 4:3 stage
    pub vm_script: String,
    /// Runner build for the 16:9 stage
    pub vm_script_16_9: String,
    /// Per-request timeout in seconds; 0 disables the timeout
    pub timeout_secs: u64,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            project_root: "https://projects.scratch.mit.edu/".to_string(),
            asset_root: "https://cdn.assets.scratch.mit.edu/".to_string(),
            vm_script: "https://sheeptester.github.io/scratch-vm/vm.min.js".to_string(),
            vm_script_16_9: "https://sheeptester.github.io/scratch-vm/16-9/vm.min.js".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Endpoints {
    /// Runner script URL for the chosen stage ratio
    pub fn vm_script_for(&self, ratio_16_9: bool) -> &str {
        if ratio_16_9 {
            &self.vm_script_16_9
        } else {
            &self.vm_script
        }
    }

    /// Request timeout, `None` when `timeout_secs` is 0
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Contents of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub output: OutputConfig,
    pub endpoints: Endpoints,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OutputConfig::default();
        assert_eq!(config.title, "Project");
        assert_eq!(config.username, "griffpatch");
        assert!(!config.ratio_16_9);
        assert!(config.progress_bar);
        assert!(config.fullscreen);
        assert_eq!(config.monitor_colour, None);
        assert_eq!(config.cloud_server, None);
        assert_eq!(config.project_id, None);
        assert!(!config.no_vm);
    }

    #[test]
    fn test_builder_pattern() {
        let config = OutputConfig::new()
            .with_title("Game")
            .with_ratio_16_9(true)
            .with_progress_bar(false)
            .with_monitor_colour("#ff8000")
            .with_cloud_server("wss://cloud.example.com");

        assert_eq!(config.title, "Game");
        assert!(config.ratio_16_9);
        assert!(!config.progress_bar);
        assert_eq!(config.monitor_colour.as_deref(), Some("#ff8000"));
        assert_eq!(config.cloud_server.as_deref(), Some("wss://cloud.example.com"));
    }

    #[test]
    fn test_vm_script_for_ratio() {
        let endpoints = Endpoints::default();
        assert!(endpoints.vm_script_for(true).contains("/16-9/"));
        assert!(!endpoints.vm_script_for(false).contains("/16-9/"));
    }

    #[test]
    fn test_parse_partial_file() {
        let file = ConfigFile::from_str(
            r##"
[output]
title = "Platformer"
fullscreen = false
monitor_colour = "#123456"

[endpoints]
timeout_secs = 5
"##,
        )
        .expect("Should parse");

        assert_eq!(file.output.title, "Platformer");
        assert!(!file.output.fullscreen);
        assert_eq!(file.output.username, "griffpatch");
        assert_eq!(file.output.monitor_colour.as_deref(), Some("#123456"));
        assert_eq!(file.endpoints.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(file.endpoints.asset_root, Endpoints::default().asset_root);
    }

    #[test]
    fn test_zero_timeout_disables_timeout() {
        let file = ConfigFile::from_str("[endpoints]\ntimeout_secs = 0\n").expect("Should parse");
        assert_eq!(file.endpoints.timeout(), None);
        assert_eq!(Endpoints::default().timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = ConfigFile::from_str("").expect("Should parse");
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = ConfigFile::from_str("[output]\ntitel = \"typo\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
