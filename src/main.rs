//! CLI entry point for symdex.
//!
//! Loads a SCIP index, answers graph and query-language lookups, and builds
//! or searches the symbol embedding map.

use anyhow::{Context, Result, bail};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use symdex::{
    EmbeddingMap, FastEmbedProvider, QueryDispatcher, Settings, SimilaritySearch, Symbol,
    SymbolGraph, WorkspaceSources,
};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Code intelligence over SCIP indexes
#[derive(Parser)]
#[command(
    name = "symdex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Query SCIP code-intelligence indexes",
    long_about = "Load a SCIP index, query symbols and references, and rank symbols by semantic similarity.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SCIP index (overrides config)
    #[arg(short, long, global = true, env = "SYMDEX_INDEX")]
    index: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .symdex directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// List indexed files
    Files,

    /// List symbols, optionally filtered by a URI fragment
    Symbols {
        /// Keep symbols whose URI contains this fragment
        #[arg(short, long)]
        matching: Option<String>,
    },

    /// Show every reference of a symbol
    Refs {
        /// Canonical symbol URI
        uri: String,
    },

    /// Summarize where a symbol is declared and used
    Context {
        /// Canonical symbol URI
        uri: String,
    },

    /// Run a query: type:symbol|exact|source|replace <args>
    #[command(
        after_help = "Examples:\n  symdex query 'type:symbol scip-python python pkg 1.0 mod/Class#'\n  symdex query 'type:exact TODO'\n  symdex query 'type:source scip-python python pkg 1.0 mod/run().'\n  symdex query 'type:replace old_name new_name False'"
    )]
    Query {
        /// The query string
        query: String,
    },

    /// Build or refresh the embedding map
    Embed {
        /// Refresh an existing map, recomputing only changed symbols
        #[arg(short, long)]
        update: bool,

        /// Replace an existing map
        #[arg(long)]
        overwrite: bool,
    },

    /// Rank embedded symbols by similarity to a text
    Search {
        /// Free-text query
        text: String,

        /// Number of results (defaults to search.default_k)
        #[arg(short, long)]
        k: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(config_path) => Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(1);
        }),
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };
    if let Some(index) = &cli.index {
        config.index_path = index.clone();
    }

    symdex::logging::init(&config.logging);

    if let Err(e) = run(&cli, &config) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &Settings) -> Result<()> {
    match &cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(*force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(config)?);
        }

        Commands::Files => {
            let graph = load_graph(config)?;
            let paths: Vec<&str> = graph.all_files().iter().map(|f| f.path.as_str()).collect();
            emit(cli.json, &paths, || paths.join("\n"))?;
        }

        Commands::Symbols { matching } => {
            let graph = load_graph(config)?;
            let mut uris: Vec<String> = match matching {
                Some(fragment) => graph
                    .symbols_matching(fragment)
                    .into_iter()
                    .map(|s| s.uri().to_string())
                    .collect(),
                None => graph.all_symbols().iter().map(|s| s.uri().to_string()).collect(),
            };
            uris.sort();
            emit(cli.json, &uris, || uris.join("\n"))?;
        }

        Commands::Refs { uri } => {
            let graph = load_graph(config)?;
            let symbol = Symbol::parse(uri)?;
            let refs = graph.references(&symbol);
            emit(cli.json, &refs, || {
                symdex::QueryResult::References(refs.clone())
                    .to_string()
                    .trim_end()
                    .to_string()
            })?;
        }

        Commands::Context { uri } => {
            let graph = load_graph(config)?;
            let symbol = Symbol::parse(uri)?;
            let context = symdex::SymbolContext::collect(&graph, &symbol);
            emit(cli.json, &context, || context.format_full("").trim_end().to_string())?;
        }

        Commands::Query { query } => {
            let graph = load_graph(config)?;
            let sources = WorkspaceSources::open(config.resolve(&config.source_root), &graph);
            let mut dispatcher = QueryDispatcher::new(&graph, sources);
            let result = dispatcher.dispatch(query)?;
            emit(cli.json, &result, || result.to_string().trim_end().to_string())?;
        }

        Commands::Embed { update, overwrite } => embed(config, *update, *overwrite)?,

        Commands::Search { text, k } => {
            let map_path = config.resolve(&config.embeddings.path);
            let map = EmbeddingMap::load(&map_path)?;
            let provider = FastEmbedProvider::new(&config.embeddings.model, true)?;
            let k = k.unwrap_or(config.search.default_k);

            let results = SimilaritySearch::new(&map, &provider).nearest_scored(text, k)?;

            #[derive(Serialize)]
            struct Hit<'a> {
                symbol: &'a str,
                score: f32,
            }
            let hits: Vec<Hit> = results
                .iter()
                .map(|(symbol, score)| Hit {
                    symbol: symbol.uri(),
                    score: *score,
                })
                .collect();
            emit(cli.json, &hits, || {
                hits.iter()
                    .map(|h| format!("{:.3}  {}", h.score, h.symbol))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
    }
    Ok(())
}

fn load_graph(config: &Settings) -> Result<SymbolGraph> {
    let path = config.resolve(&config.index_path);
    let start = Instant::now();
    let graph = SymbolGraph::from_path(&path)
        .with_context(|| format!("Failed to load index {}", path.display()))?;
    tracing::debug!("[cli] loaded {} in {:?}", path.display(), start.elapsed());
    Ok(graph)
}

fn embed(config: &Settings, update: bool, overwrite: bool) -> Result<()> {
    let map_path = config.resolve(&config.embeddings.path);
    let mut embeddings = config.embeddings.clone();
    embeddings.path = map_path.clone();

    if map_path.exists() && !update && !overwrite {
        bail!(
            "Embedding map {} already exists. Use --update to refresh it or --overwrite to rebuild",
            map_path.display()
        );
    }

    let graph = load_graph(config)?;
    let sources = WorkspaceSources::open(config.resolve(&config.source_root), &graph);
    let provider = FastEmbedProvider::new(&embeddings.model, true)?;
    let start = Instant::now();

    let map = if update && map_path.exists() {
        let mut map = EmbeddingMap::load(&map_path)?;
        let report = map.update_embeddings(graph.all_symbols(), &provider, &sources, &embeddings)?;
        println!(
            "Updated embeddings: {} computed, {} unchanged, {} skipped, {} failed",
            report.computed, report.unchanged, report.skipped, report.failed
        );
        map
    } else {
        EmbeddingMap::build(graph.all_symbols(), &provider, &sources, &embeddings)?
    };

    map.save(&map_path, true)?;
    println!(
        "Saved {} embedding(s) to {} in {:.1}s",
        map.len(),
        map_path.display(),
        start.elapsed().as_secs_f32()
    );
    Ok(())
}

/// Print `value` as JSON, or the text rendering
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        let text = text();
        if !text.is_empty() {
            println!("{text}");
        }
    }
    Ok(())
}
