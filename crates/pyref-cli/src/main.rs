//! pyref CLI - Command-line interface for the pyref reference generator

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use pyref_core::{Config, Project, SymbolKind};

#[derive(Parser)]
#[command(name = "pyref")]
#[command(version = pyref_core::VERSION)]
#[command(about = "Cross-linked Markdown API reference for Python packages", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the Markdown reference for a package
    Build {
        /// Package directory (the one containing `__init__.py`)
        package_path: PathBuf,

        /// Output directory
        output_path: PathBuf,

        /// Config file (pyref.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Document names with a single leading underscore
        #[arg(long)]
        include_private: bool,

        /// Never import the package to resolve names
        #[arg(long)]
        no_runtime: bool,

        /// Python interpreter used for runtime lookup
        #[arg(long)]
        python: Option<String>,
    },

    /// List every symbol the crawl discovers
    Symbols {
        /// Package directory
        package_path: PathBuf,

        /// Config file (pyref.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Route `tracing` output to stderr, filtered by `PYREF_LOG`
fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("PYREF_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,pyref=debug")
        } else {
            EnvFilter::new("warn,pyref=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display())),
        None => Ok(Config::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            package_path,
            output_path,
            config,
            include_private,
            no_runtime,
            python,
        } => {
            let mut config = load_config(config.as_deref())?;
            if include_private {
                config.include_private = true;
            }
            if no_runtime {
                config.runtime = false;
            }
            if let Some(python) = python {
                config.python = python;
            }
            build(&package_path, &output_path, &config)?;
        }

        Commands::Symbols {
            package_path,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            list_symbols(&package_path, &config, json)?;
        }
    }

    Ok(())
}

fn build(package_path: &Path, output_path: &Path, config: &Config) -> Result<()> {
    let project = Project::crawl(package_path, config)
        .with_context(|| format!("Failed to crawl '{}'", package_path.display()))?;
    tracing::info!(
        package = %project.package.name,
        modules = project.package.modules.len(),
        symbols = project.registry.len(),
        "crawled package"
    );

    let site = project.render(config);
    let written = site
        .write(output_path)
        .with_context(|| format!("Failed to write output to '{}'", output_path.display()))?;

    for path in &written {
        println!("Generated: {}", path.display());
    }
    Ok(())
}

#[derive(Serialize)]
struct SymbolRow<'a> {
    short_name: &'a str,
    fully_qualified_name: &'a str,
    kind: SymbolKind,
    ambiguous: bool,
}

fn list_symbols(package_path: &Path, config: &Config, json: bool) -> Result<()> {
    let project = Project::crawl(package_path, config)
        .with_context(|| format!("Failed to crawl '{}'", package_path.display()))?;
    let registry = &project.registry;
    let ambiguous = registry.ambiguous_names();

    let rows: Vec<SymbolRow<'_>> = registry
        .all_bindings()
        .into_iter()
        .map(|b| SymbolRow {
            short_name: &b.short_name,
            fully_qualified_name: &b.fully_qualified_name,
            kind: b.kind,
            ambiguous: ambiguous.contains(&b.short_name.as_str()),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        println!(
            "{}{:<24} {:<10} {}",
            if row.ambiguous { "*" } else { " " },
            row.short_name,
            row.kind,
            row.fully_qualified_name
        );
    }
    println!();
    println!(
        "{} symbols, {} ambiguous short names (marked *)",
        rows.len(),
        ambiguous.len()
    );
    Ok(())
}
