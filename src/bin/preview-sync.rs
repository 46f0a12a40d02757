//! preview-sync command line
//!
//! Runs the correlation engine against files on disk: locate a fingerprint
//! in an HTML file, trace a rendered element back to its source line,
//! reveal the preview target of a source line, or export the single-file
//! website.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use preview_sync::dom::{DomTree, ElementFingerprint, Selector};
use preview_sync::tools::{ToolContext, ToolRegistry};
use preview_sync::{BufferSet, Language, LaunchOptions, PreviewBrowser, SyncOptions, SyncSession};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LanguageArg {
    Html,
    Css,
    Js,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Html => Language::Html,
            LanguageArg::Css => Language::Css,
            LanguageArg::Js => Language::Js,
        }
    }
}

#[derive(Parser)]
#[command(name = "preview-sync")]
#[command(version)]
#[command(about = "Correlate rendered preview elements with HTML source lines", long_about = None)]
struct Cli {
    /// JSON file with SyncOptions overrides
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Source files making up a document
#[derive(Args)]
struct SourceArgs {
    /// HTML source file
    #[arg(long, value_name = "FILE")]
    html: PathBuf,

    /// CSS source file
    #[arg(long, value_name = "FILE")]
    css: Option<PathBuf>,

    /// JavaScript source file
    #[arg(long, value_name = "FILE")]
    js: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Find the source line of an element fingerprint (JSON, as sent in an inspect message)
    Locate {
        #[command(flatten)]
        sources: SourceArgs,

        /// Fingerprint JSON file
        #[arg(long, value_name = "FILE")]
        fingerprint: PathBuf,
    },

    /// Render the document, pick an element and trace it back to its source line
    Trace {
        #[command(flatten)]
        sources: SourceArgs,

        /// Selector of the element to trace, e.g. `nav > a[href="#about"]`
        #[arg(long)]
        selector: String,

        /// Which match of the selector to trace
        #[arg(long, default_value = "0")]
        nth: usize,

        /// Use a saved DOM dump instead of rendering in Chrome
        #[arg(long, value_name = "FILE")]
        dom: Option<PathBuf>,

        /// Launch the browser in headed mode (default: headless)
        #[arg(long, short = 'H')]
        headed: bool,

        /// Path to custom browser executable
        #[arg(long, value_name = "PATH")]
        executable_path: Option<PathBuf>,
    },

    /// Show which rendered elements a source line highlights
    Reveal {
        #[command(flatten)]
        sources: SourceArgs,

        /// Buffer the line belongs to
        #[arg(long, value_enum, default_value = "html")]
        language: LanguageArg,

        /// Zero-based line index
        #[arg(long)]
        line: usize,
    },

    /// Write the standalone single-file website
    Export {
        #[command(flatten)]
        sources: SourceArgs,

        /// Document title
        #[arg(long, default_value = "My Website")]
        title: String,

        /// Output file (default: stdout)
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_buffers(sources: &SourceArgs) -> Result<BufferSet> {
    let html = read_source(&sources.html)?;
    let css = sources.css.as_deref().map(read_source).transpose()?.unwrap_or_default();
    let js = sources.js.as_deref().map(read_source).transpose()?.unwrap_or_default();
    Ok(BufferSet::new(html, css, js))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a registered tool, turning an unsuccessful result into an error
fn run_tool(registry: &ToolRegistry, session: &mut SyncSession, name: &str, params: Value) -> Result<Value> {
    let mut context = ToolContext::new(session);
    let result = registry.execute(name, params, &mut context)?;
    if !result.success {
        bail!("{}", result.error.unwrap_or_else(|| format!("{} failed", name)));
    }
    Ok(result.data.unwrap_or(Value::Null))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let options = match &cli.config {
        Some(path) => SyncOptions::from_json_file(path)?,
        None => SyncOptions::default(),
    };
    let registry = ToolRegistry::with_defaults();

    match cli.command {
        Command::Locate { sources, fingerprint } => {
            let mut session = SyncSession::new(load_buffers(&sources)?, options);
            let fingerprint: Value =
                serde_json::from_str(&read_source(&fingerprint)?).context("Invalid fingerprint JSON")?;
            let data = run_tool(&registry, &mut session, "locate", json!({ "fingerprint": fingerprint }))?;
            print_json(&data)?;
        }
        Command::Trace {
            sources,
            selector,
            nth,
            dom,
            headed,
            executable_path,
        } => {
            let buffers = load_buffers(&sources)?;
            let tree = match dom {
                Some(path) => DomTree::from_json(&read_source(&path)?)?,
                None => {
                    let mut launch = LaunchOptions::new().headless(!headed);
                    if let Some(path) = executable_path {
                        launch = launch.chrome_path(path);
                    }
                    let browser = PreviewBrowser::launch(launch, options.clone())?;
                    browser.render(&buffers)?;
                    browser.extract_dom()?
                }
            };

            let path = tree.nth_match(&Selector::parse(&selector)?, nth)?;
            let Some(fingerprint) = ElementFingerprint::extract(&tree, &path, &options) else {
                bail!("{} addresses the document container", selector);
            };
            info!("Tracing {} (render index {})", fingerprint.selector, fingerprint.index);

            let mut session = SyncSession::new(buffers, options);
            let resolution = run_tool(&registry, &mut session, "locate", json!({ "fingerprint": fingerprint }))?;
            print_json(&json!({
                "fingerprint": fingerprint,
                "resolution": resolution,
            }))?;
        }
        Command::Reveal { sources, language, line } => {
            let mut session = SyncSession::new(load_buffers(&sources)?, options);
            let language = Language::from(language);
            let data = run_tool(
                &registry,
                &mut session,
                "select_line",
                json!({ "language": language, "line": line }),
            )?;
            match data.get("preview") {
                Some(preview) if !preview.is_null() => print_json(preview)?,
                _ => bail!("Line {} has no preview target", line),
            }
        }
        Command::Export { sources, title, output } => {
            let mut session = SyncSession::new(load_buffers(&sources)?, options);
            let params = json!({
                "title": title,
                "output": output.as_ref().map(|path| path.to_string_lossy()),
            });
            let data = run_tool(&registry, &mut session, "export_document", params)?;
            match data.get("html").and_then(Value::as_str) {
                Some(html) => println!("{}", html),
                None => info!("Exported {} bytes", data["length"]),
            }
        }
    }

    Ok(())
}
