//! Glosstip CLI - glossary tooltips for page content
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use dialoguer::Confirm;
use glosstip::config::parse_source_list;
use glosstip::entry::GlossaryEntry;
use glosstip::{render, source, AnnotateOptions, Config, PayloadCache, TermMatcher};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glosstip")]
#[command(author, version, about = "Annotate page content with glossary tooltips", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate HTML content with glossary tooltips
    Annotate {
        /// File to annotate (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Glossary source to use instead of the configured ones (repeatable)
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Always fetch, ignoring the payload cache
        #[arg(long)]
        no_cache: bool,
        /// CSS class for annotation elements
        #[arg(long)]
        class: Option<String>,
    },
    /// List the merged glossary
    List {
        /// Render an HTML definition list
        #[arg(long, conflicts_with = "json")]
        html: bool,
        /// Print the wire-format JSON
        #[arg(long)]
        json: bool,
        /// Always fetch, ignoring the payload cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Manage glossary sources
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Inspect or clear the payload cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Print the JSON Schema of the glossary wire format
    Schema,
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SourcesAction {
    /// Show configured sources in priority order
    List,
    /// Append a source
    Add { url: String },
    /// Remove a source
    Remove {
        url: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Edit the source list in $EDITOR, one URL per line
    Edit,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cached payloads
    List,
    /// Delete all cached payloads
    Clear {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let load_config = || -> anyhow::Result<Config> {
        match &cli.config {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("loading config from {}", path.display())),
            None => Ok(Config::load()?),
        }
    };

    match cli.command {
        Commands::Annotate {
            ref file,
            ref sources,
            no_cache,
            ref class,
        } => {
            let mut config = load_config()?;
            if !sources.is_empty() {
                config.set_sources(sources.clone())?;
            }
            if let Some(class) = class {
                config.annotate.class_name = class.clone();
            }

            let content = read_input(file.as_deref())?;
            let table = load_table(&config, no_cache).await;
            let options: AnnotateOptions = config.annotate.options();

            let annotated = match TermMatcher::compile_with(&table, &options) {
                Ok(matcher) => {
                    let (annotated, spans) = matcher.apply_counted(&content);
                    tracing::info!(terms = matcher.len(), spans, "annotation complete");
                    annotated
                }
                Err(e) => {
                    tracing::warn!("glossary annotation skipped: {}", e);
                    content
                }
            };

            let mut stdout = std::io::stdout().lock();
            stdout.write_all(annotated.as_bytes())?;
            stdout.flush()?;
        }
        Commands::List {
            html,
            json,
            no_cache,
        } => {
            let config = load_config()?;
            let table = load_table(&config, no_cache).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else if html {
                print!("{}", render::render_definition_list(&table));
            } else if table.is_empty() {
                println!("No glossary terms found.");
            } else {
                println!("Glossary terms ({}):\n", table.len());
                print!("{}", render::render_terminal(&table));
            }
        }
        Commands::Sources { ref action } => {
            // edits are saved back, so the environment override stays out
            let mut config = Config::load_file(&config_path)?;
            match action {
                SourcesAction::List => {
                    if config.sources.urls.is_empty() {
                        println!("No glossary sources configured.");
                    } else {
                        for (i, url) in config.sources.urls.iter().enumerate() {
                            println!("{}. {}", i + 1, url);
                            println!(
                                "   {}",
                                source::glossary_endpoint(url, &config.sources.endpoint).dimmed()
                            );
                        }
                    }
                }
                SourcesAction::Add { url } => {
                    if config.add_source(url)? {
                        config.save_to(&config_path)?;
                        println!("{} {}", "Added".green(), url.trim());
                    } else {
                        println!("Already configured: {}", url.trim());
                    }
                }
                SourcesAction::Remove { url, yes } => {
                    if !config.sources.urls.iter().any(|u| u == url.trim()) {
                        bail!("source not configured: {}", url.trim());
                    }
                    if *yes || confirm(&format!("Remove {}?", url.trim()))? {
                        config.remove_source(url);
                        config.save_to(&config_path)?;
                        println!("{} {}", "Removed".red(), url.trim());
                    }
                }
                SourcesAction::Edit => {
                    let edited = edit::edit(config.sources_text())
                        .context("failed to open editor")?;
                    config.set_sources(parse_source_list(&edited))?;
                    config.save_to(&config_path)?;
                    println!(
                        "Saved {} source(s) to {}",
                        config.sources.urls.len(),
                        config_path.display()
                    );
                }
            }
        }
        Commands::Cache { ref action } => {
            let config = load_config()?;
            let cache = PayloadCache::open(&config.cache.path)?;
            match action {
                CacheAction::List => {
                    let payloads = cache.list_all()?;
                    if payloads.is_empty() {
                        println!("Cache is empty.");
                    } else {
                        println!("Cached payloads ({}):\n", payloads.len());
                        for cached in payloads {
                            let terms = glosstip::entry::parse_entries(&cached.body).len();
                            println!(
                                "📄 {} ({})",
                                cached.url,
                                cached.fetched_at.format("%Y-%m-%d %H:%M")
                            );
                            println!("   {} term(s)\n", terms);
                        }
                    }
                }
                CacheAction::Clear { yes } => {
                    let count = cache.count();
                    if *yes || confirm(&format!("Delete {} cached payload(s)?", count))? {
                        cache.clear()?;
                        println!("Cleared {} cached payload(s).", count);
                    }
                }
            }
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(Vec<GlossaryEntry>);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "glosstip", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Log to stderr so stdout only carries command output
fn init_logging(verbose: bool) {
    let default = if verbose { "glosstip=debug" } else { "glosstip=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Fetch and merge the configured sources, with the cache unless disabled
async fn load_table(config: &Config, no_cache: bool) -> glosstip::GlossaryTable {
    let cache = if config.cache.enabled && !no_cache {
        match PayloadCache::open(&config.cache.path) {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!("payload cache unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };
    source::fetch_glossary(config, cache.as_ref()).await
}

/// Read content from a file, or from stdin when it is not a terminal
fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            if atty::is(atty::Stream::Stdin) {
                bail!("no input: pass a file or pipe content on stdin");
            }
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
