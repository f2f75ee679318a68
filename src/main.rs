//! Scratch Htmlifier CLI
//!
//! Usage:
//!   scratch-htmlifier [OPTIONS] <PROJECT>
//!
//! PROJECT is a project id (`104`, `104.2`) or a path to a project file.
//! The document is written to stdout unless `--output` is given.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scratch_htmlifier::directive::check_markers;
use scratch_htmlifier::{
    ConfigFile, Htmlifier, ProjectSource, TemplateSource, BUNDLED_TEMPLATE,
};

#[derive(Parser)]
#[command(name = "scratch-htmlifier", version)]
#[command(about = "Package a Scratch project into a single offline HTML file")]
struct Cli {
    /// Project id or path to a project file
    project: Option<String>,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTML template to use instead of the bundled one
    #[arg(long)]
    template: Option<PathBuf>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// Username the project sees
    #[arg(long)]
    username: Option<String>,

    /// Use the 16:9 stage
    #[arg(long = "ratio-16-9")]
    ratio_16_9: bool,

    /// Hide the loading progress bar
    #[arg(long)]
    no_progress_bar: bool,

    /// Hide the fullscreen button
    #[arg(long)]
    no_fullscreen: bool,

    /// Background colour for variable monitors
    #[arg(long)]
    monitor_colour: Option<String>,

    /// Cloud variable server (WebSocket URL)
    #[arg(long)]
    cloud_server: Option<String>,

    /// Project id announced to the project
    #[arg(long)]
    project_id: Option<String>,

    /// Leave the runner out of the document
    #[arg(long)]
    no_vm: bool,

    /// Disable 30 fps compatibility mode
    #[arg(long)]
    no_compatibility: bool,

    /// Start in turbo mode
    #[arg(long)]
    turbo: bool,

    /// Request timeout in seconds (0 for none)
    #[arg(long)]
    timeout: Option<u64>,

    /// Check the template's section markers and exit
    #[arg(long)]
    check_template: bool,

    /// Log pipeline details
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.check_template {
        std::process::exit(check_template(cli.template.as_deref()));
    }

    let Some(project) = cli.project.as_deref() else {
        eprintln!("Error: no project given (pass a project id or a project file)");
        std::process::exit(2);
    };

    // Load configuration file
    let file = match &cli.config {
        Some(path) => match ConfigFile::from_file(path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ConfigFile::default(),
    };

    let mut config = file.output;
    if let Some(title) = cli.title {
        config.title = title;
    }
    if let Some(username) = cli.username {
        config.username = username;
    }
    if cli.ratio_16_9 {
        config.ratio_16_9 = true;
    }
    if cli.no_progress_bar {
        config.progress_bar = false;
    }
    if cli.no_fullscreen {
        config.fullscreen = false;
    }
    if cli.monitor_colour.is_some() {
        config.monitor_colour = cli.monitor_colour;
    }
    if cli.cloud_server.is_some() {
        config.cloud_server = cli.cloud_server;
    }
    if cli.project_id.is_some() {
        config.project_id = cli.project_id;
    }
    if cli.no_vm {
        config.no_vm = true;
    }
    if cli.no_compatibility {
        config.compatibility = false;
    }
    if cli.turbo {
        config.turbo = true;
    }

    let mut endpoints = file.endpoints;
    if let Some(timeout) = cli.timeout {
        endpoints.timeout_secs = timeout;
    }

    let source = match parse_project(project) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading project '{}': {}", project, e);
            std::process::exit(1);
        }
    };

    let template = cli
        .template
        .map_or(TemplateSource::Bundled, TemplateSource::File);
    let htmlifier = Htmlifier::new(endpoints).with_template(template);

    let html = match htmlifier.convert(&source, &config) {
        Ok(html) => html,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, html) {
                eprintln!("Error writing '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        }
        None => println!("{}", html),
    }
}

/// Numeric ids (with an optional `.revision`) are remote projects, anything
/// else is a file
fn parse_project(project: &str) -> std::io::Result<ProjectSource> {
    let is_id = project
        .split('.')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if is_id && !Path::new(project).exists() {
        Ok(ProjectSource::Id(project.to_string()))
    } else {
        ProjectSource::read_file(Path::new(project))
    }
}

/// Print marker diagnostics for a template; returns the exit status
fn check_template(path: Option<&Path>) -> i32 {
    let (source, name) = match path {
        Some(path) => match fs::read_to_string(path) {
            Ok(source) => (source, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading template '{}': {}", path.display(), e);
                return 1;
            }
        },
        None => (BUNDLED_TEMPLATE.to_string(), "template.html".to_string()),
    };

    let warnings = check_markers(&source);
    for warning in &warnings {
        eprintln!("{}", warning.format(&source, &name));
    }
    if warnings.is_empty() {
        eprintln!("{}: all section markers are paired", name);
        0
    } else {
        1
    }
}
