//! Conversion pipeline: project + runner + template -> one HTML document

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::assets::AssetResolver;
use crate::config::{Endpoints, OutputConfig};
use crate::directive::{
    check_markers, strip_all_markers, strip_section, substitute, substitute_all,
};
use crate::error::FetchError;
use crate::fetch::{data_uri, guess_media_type, Fetcher, HttpFetcher};
use crate::progress::{progress_line, LoadedAsset, ProgressState, ProgressTracker};
use crate::runner::{ProjectRunner, ScratchRunner};
use crate::storage::WebStorage;
use crate::HtmlifyError;

/// Template shipped with the crate
pub const BUNDLED_TEMPLATE: &str = include_str!("template.html");

/// Sink for progress lines
pub type Log<'a> = &'a (dyn Fn(&str) + Sync);

/// Print a progress line to stderr
pub fn default_log(line: &str) {
    eprintln!("{line}");
}

/// The project to package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSource {
    /// Remote project id, optionally with a revision: `123456` or `123456.2`
    Id(String),
    /// Project file already in hand
    File { name: String, data: Vec<u8> },
}

impl ProjectSource {
    /// Read a local project file
    pub fn read_file(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ProjectSource::File { name, data })
    }
}

/// Where the HTML template comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    #[default]
    Bundled,
    File(PathBuf),
    Url(String),
}

/// Assembles standalone HTML documents.
///
/// # Example
///
/// ```no_run
/// use scratch_htmlifier::{Htmlifier, OutputConfig, ProjectSource};
///
/// let html = Htmlifier::default()
///     .convert(
///         &ProjectSource::Id("104".to_string()),
///         &OutputConfig::new().with_title("Scratch Cat"),
///     )
///     .unwrap();
/// assert!(html.contains("<title>Scratch Cat</title>"));
/// ```
pub struct Htmlifier {
    fetcher: Box<dyn Fetcher>,
    runner: Box<dyn ProjectRunner>,
    endpoints: Endpoints,
    template: TemplateSource,
}

impl Default for Htmlifier {
    fn default() -> Self {
        Self::new(Endpoints::default())
    }
}

impl Htmlifier {
    /// Create a pipeline talking to `endpoints` over HTTP
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            fetcher: Box::new(HttpFetcher::new(endpoints.timeout())),
            runner: Box::new(ScratchRunner),
            endpoints,
            template: TemplateSource::Bundled,
        }
    }

    /// Fetch resources through `fetcher` instead of HTTP
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_runner(mut self, runner: impl ProjectRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_template(mut self, template: TemplateSource) -> Self {
        self.template = template;
        self
    }

    /// Build the document, printing progress to stderr
    pub fn convert(
        &self,
        source: &ProjectSource,
        config: &OutputConfig,
    ) -> Result<String, HtmlifyError> {
        self.convert_with_log(source, config, &default_log)
    }

    /// Build the document, sending progress lines to `log`.
    ///
    /// The project, the runner script and the template are gathered
    /// concurrently. Any failure aborts the whole conversion.
    pub fn convert_with_log(
        &self,
        source: &ProjectSource,
        config: &OutputConfig,
        log: Log<'_>,
    ) -> Result<String, HtmlifyError> {
        log("Getting assets...");

        let (preface, (scripts, template)) = rayon::join(
            || self.preface(source, log),
            || rayon::join(|| self.runner_script(config, log), || self.template_text()),
        );
        let scripts = compose_scripts(&preface?, config, &scripts?);
        let template = template?;

        for warning in check_markers(&template) {
            tracing::warn!(%warning, "template marker");
        }

        log("Done!");
        Ok(render_template(&template, config, &scripts))
    }

    /// Declarations that carry the project into the document
    fn preface(&self, source: &ProjectSource, log: Log<'_>) -> Result<String, HtmlifyError> {
        match source {
            ProjectSource::Id(id) => self.embed_project(id, log),
            ProjectSource::File { name, data } => Ok(format!(
                "var SRC = \"file\", FILE = \"{}\",",
                data_uri(&guess_media_type(name), data)
            )),
        }
    }

    fn embed_project(&self, id: &str, log: Log<'_>) -> Result<String, HtmlifyError> {
        let resolver = AssetResolver::new(&self.endpoints);
        let tracker = ProgressTracker::new(|state: ProgressState, loaded: Option<LoadedAsset<'_>>| {
            log(&progress_line(state, loaded));
        });
        let storage = WebStorage::new(self.fetcher.as_ref(), &resolver).with_observer(&tracker);

        self.runner.load_project(id, &storage)?;

        let resolved = resolver.resolved();
        let project_url = resolved
            .project_json
            .ok_or_else(|| HtmlifyError::MissingProjectJson { id: id.to_string() })?;

        log("Assembling assets...");
        tracing::info!(id, assets = resolved.assets.len(), "embedding project");

        let (project_json, assets) = rayon::join(
            || storage.embed(&project_url),
            || {
                resolved
                    .assets
                    .par_iter()
                    .map(|(asset_id, url)| storage.embed(url).map(|data| (asset_id.clone(), data)))
                    .collect::<Result<BTreeMap<String, String>, FetchError>>()
            },
        );

        Ok(format!(
            "var SRC = \"id\", PROJECT_JSON = \"{}\",ASSETS = {},",
            project_json?,
            serde_json::to_string(&assets?)?
        ))
    }

    /// Runner source, safe to inline in a `<script>` element
    fn runner_script(&self, config: &OutputConfig, log: Log<'_>) -> Result<String, HtmlifyError> {
        if config.no_vm {
            return Ok(String::new());
        }

        let code = self
            .fetcher
            .fetch_text(self.endpoints.vm_script_for(config.ratio_16_9))?;
        log("Scratch engine obtained...");
        Ok(code.replacen("</script>", "", 1))
    }

    fn template_text(&self) -> Result<String, HtmlifyError> {
        match &self.template {
            TemplateSource::Bundled => Ok(BUNDLED_TEMPLATE.to_string()),
            TemplateSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| HtmlifyError::Template {
                    path: path.clone(),
                    source,
                })
            }
            TemplateSource::Url(url) => Ok(self.fetcher.fetch_text(url)?),
        }
    }
}

/// JSON string literal for `value`
fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Prefix the runner script with the project preface and player settings
pub fn compose_scripts(preface: &str, config: &OutputConfig, scripts: &str) -> String {
    let project_id = config
        .project_id
        .as_deref()
        .map_or_else(|| "null".to_string(), json_string);

    format!(
        "{preface}DESIRED_USERNAME = {},COMPAT = {}, TURBO = {},PROJECT_ID = {};{scripts}",
        json_string(&config.username),
        config.compatibility,
        config.turbo,
        project_id,
    )
}

/// Apply `config` to a template and fill in the title and scripts
pub fn render_template(template: &str, config: &OutputConfig, scripts: &str) -> String {
    let mut html = template.to_string();

    if !config.no_vm {
        html = strip_section(&html, "no-vm");
    }
    html = strip_section(&html, if config.ratio_16_9 { "4-3" } else { "16-9" });
    if !config.progress_bar {
        html = strip_section(&html, "loading-progress");
    }
    if !config.fullscreen {
        html = strip_section(&html, "fullscreen");
    }
    // an empty option counts as unset
    let monitor_colour = config.monitor_colour.as_deref().filter(|s| !s.is_empty());
    let cloud_server = config.cloud_server.as_deref().filter(|s| !s.is_empty());

    html = match monitor_colour {
        Some(colour) => substitute_all(&html, "{COLOUR}", colour),
        None => strip_section(&html, "monitor-colour"),
    };
    html = match cloud_server {
        Some(host) => substitute_all(
            &strip_section(&html, "cloud-localstorage"),
            "{CLOUD_HOST}",
            &json_string(host),
        ),
        None => strip_section(&html, "cloud-ws"),
    };

    let html = strip_all_markers(&html);
    let html = substitute(&html, "{TITLE}", &config.title);
    substitute(&html, "{SCRIPTS}", scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compose_scripts_defaults() {
        let preface = "var SRC = \"file\", FILE = \"x\",";
        let scripts = compose_scripts(preface, &OutputConfig::default(), "run();");
        insta::assert_snapshot!(
            scripts,
            @r#"var SRC = "file", FILE = "x",DESIRED_USERNAME = "griffpatch",COMPAT = true, TURBO = false,PROJECT_ID = null;run();"#
        );
    }

    #[test]
    fn test_compose_scripts_quotes_values() {
        let config = OutputConfig::new()
            .with_username("a \"quoted\" name")
            .with_project_id("123")
            .with_turbo(true)
            .with_compatibility(false);
        let scripts = compose_scripts("", &config, "");
        assert_eq!(
            scripts,
            r#"DESIRED_USERNAME = "a \"quoted\" name",COMPAT = false, TURBO = true,PROJECT_ID = "123";"#
        );
    }

    #[test]
    fn test_render_keeps_chosen_ratio() {
        let template = "% 4-3 %narrow% /4-3 %% 16-9 %wide% /16-9 %";
        let narrow = render_template(template, &OutputConfig::default(), "");
        let wide = render_template(template, &OutputConfig::new().with_ratio_16_9(true), "");
        assert_eq!(narrow, "narrow");
        assert_eq!(wide, "wide");
    }

    #[test]
    fn test_render_no_vm_section() {
        let template = "% no-vm %offline% /no-vm %";
        assert_eq!(render_template(template, &OutputConfig::default(), ""), "");
        assert_eq!(
            render_template(template, &OutputConfig::new().with_no_vm(true), ""),
            "offline"
        );
    }

    #[test]
    fn test_render_monitor_colour_substituted_everywhere() {
        let template = "% monitor-colour %a{COLOUR}b{COLOUR}% /monitor-colour %";
        let config = OutputConfig::new().with_monitor_colour("#abc");
        assert_eq!(render_template(template, &config, ""), "a#abcb#abc");
    }

    #[test]
    fn test_render_cloud_server() {
        let template = "% cloud-ws %ws({CLOUD_HOST})% /cloud-ws %\
% cloud-localstorage %ls% /cloud-localstorage %";
        let config = OutputConfig::new().with_cloud_server("wss://c.example");
        assert_eq!(render_template(template, &config, ""), r#"ws("wss://c.example")"#);
        assert_eq!(render_template(template, &OutputConfig::default(), ""), "ls");
    }

    #[test]
    fn test_render_empty_options_count_as_unset() {
        let template = "% monitor-colour %[{COLOUR}]% /monitor-colour %\
% cloud-ws %({CLOUD_HOST})% /cloud-ws %% cloud-localstorage %L% /cloud-localstorage %";

        let file = ConfigFile::from_str("[output]\nmonitor_colour = \"\"\ncloud_server = \"\"\n")
            .expect("Should parse");
        assert_eq!(render_template(template, &file.output, ""), "L");

        let config = OutputConfig::new()
            .with_monitor_colour("")
            .with_cloud_server("");
        assert_eq!(render_template(template, &config, ""), "L");
    }

    #[test]
    fn test_render_title_and_scripts_once() {
        let config = OutputConfig::new().with_title("T");
        let html = render_template("{TITLE}|{SCRIPTS}|{TITLE}", &config, "S");
        assert_eq!(html, "T|S|{TITLE}");
    }

    #[test]
    fn test_scripts_are_not_scanned_for_markers() {
        let html = render_template("{SCRIPTS}", &OutputConfig::default(), "a % b % c");
        assert_eq!(html, "a % b % c");
    }

    #[test]
    fn test_bundled_template_is_well_formed() {
        assert!(check_markers(BUNDLED_TEMPLATE).is_empty());
        assert!(BUNDLED_TEMPLATE.contains("{TITLE}"));
        assert!(BUNDLED_TEMPLATE.contains("{SCRIPTS}"));
    }

    #[test]
    fn test_bundled_template_renders_without_markers() {
        let html = render_template(BUNDLED_TEMPLATE, &OutputConfig::default(), "var X;");
        assert!(!html.contains("% /"));
        assert!(!html.contains("{TITLE}"));
        assert!(html.contains("<title>Project</title>"));
        assert!(html.contains("var X;"));
        assert!(!html.contains("{COLOUR}"));
        assert!(html.contains("localStorage"));
        assert!(!html.contains("new WebSocket"));
    }
}
