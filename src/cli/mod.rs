//! Command-line interface for coresolve.
//!
//! Provides commands for resolving an entity's coreferences in a document,
//! inspecting model output, batch-resolving collated tables, and collating
//! annotation datasets.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adapters::{CorefModel, PrecomputedModel, SubprocessModel};
use crate::batch::{default_output_path, resolve_table};
use crate::collate::collate_documents;
use crate::config::{self, ResolvedConfig};
use crate::core::Resolver;

/// coresolve - Entity-targeted coreference substitution
#[derive(Parser, Debug)]
#[command(name = "coresolve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace every coreferent mention of an entity with the entity itself
    Resolve {
        /// Entity text, matched exactly against mention text
        entity: String,

        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Use a precomputed analysis JSON instead of running the model
        #[arg(long)]
        analysis: Option<PathBuf>,
    },

    /// Run the coreference model and print its analysis as JSON
    Analyze {
        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Resolve every row of a collated CSV (entity = mention column)
    Batch {
        /// Collated CSV with `text` and `mention` columns
        table: PathBuf,

        /// Output CSV (defaults to <table>_resolved.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Join annotation tables with raw documents into CSV files
    Collate {
        /// Dataset root containing one folder per language
        root: PathBuf,

        /// Language folders to process (defaults to config value)
        #[arg(short, long = "lang")]
        langs: Vec<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Resolve {
                entity,
                input,
                analysis,
            } => {
                resolve(&entity, input, analysis).await
            }
            Commands::Analyze { input } => {
                analyze(input).await
            }
            Commands::Batch { table, output } => {
                batch(&table, output).await
            }
            Commands::Collate { root, langs } => {
                collate(&root, langs).await
            }
            Commands::Config => {
                show_config()
            }
        }
    }
}

/// Read the document from a file or stdin
fn read_input(input_file: Option<PathBuf>) -> Result<String> {
    if let Some(path) = input_file {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    }
}

/// Build a resolver around the configured model, or a precomputed analysis
async fn build_resolver(
    cfg: &ResolvedConfig,
    analysis: Option<PathBuf>,
) -> Result<Resolver<Box<dyn CorefModel>>> {
    let model: Box<dyn CorefModel> = match analysis {
        Some(path) => Box::new(PrecomputedModel::from_file(&path).await?),
        None => Box::new(SubprocessModel::from_settings(&cfg.model)),
    };
    Ok(Resolver::with_settings(model, cfg.resolver.clone()))
}

/// Resolve an entity's coreferences in one document
async fn resolve(entity: &str, input_file: Option<PathBuf>, analysis: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let text = read_input(input_file)?;

    let resolver = build_resolver(cfg, analysis).await?;
    info!(model = resolver.model().name(), entity, "Resolving coreferences");

    let output = resolver
        .resolve_coref(entity, &text)
        .await
        .with_context(|| format!("Failed to resolve coreferences of '{}'", entity))?;

    // Output is the document itself; no extra newline
    print!("{}", output);
    Ok(())
}

/// Print the model's analysis of a document
async fn analyze(input_file: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let text = read_input(input_file)?;

    let resolver = build_resolver(cfg, None).await?;
    let analysis = resolver.analyze(&text).await?;

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

/// Resolve every row of a collated table
async fn batch(table: &Path, output: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let output = output.unwrap_or_else(|| default_output_path(table));

    let resolver = build_resolver(cfg, None).await?;
    let summary = resolve_table(&resolver, table, &output).await?;

    eprintln!("Resolved {} of {} rows", summary.resolved, summary.rows);
    eprintln!("   Documents analyzed: {}", summary.documents);
    if summary.failed > 0 {
        eprintln!("   Rows left empty:    {}", summary.failed);
    }
    eprintln!("   Output: {}", output.display());
    Ok(())
}

/// Collate annotation tables with raw documents
async fn collate(root: &Path, langs: Vec<String>) -> Result<()> {
    let cfg = config::config()?;
    let langs = if langs.is_empty() { cfg.langs.clone() } else { langs };

    let outputs = collate_documents(root, &langs).await?;
    for path in outputs {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("coresolve configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Model:");
    println!("  Command: {}", cfg.model.command);
    println!("  Args:    {}", cfg.model.args.join(" "));
    println!("  Timeout: {}s", cfg.model.timeout_seconds);
    println!();
    println!("Resolver:");
    println!("  Group prefix:   {}", cfg.resolver.group_prefix);
    println!("  Max input size: {} bytes", cfg.resolver.max_input_bytes);
    println!();
    println!("Collation languages: {}", cfg.langs.join(", "));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve_command() {
        let cli = Cli::parse_from([
            "coresolve",
            "resolve",
            "the president",
            "--input",
            "doc.txt",
            "--analysis",
            "doc.json",
        ]);
        match cli.command {
            Commands::Resolve {
                entity,
                input,
                analysis,
            } => {
                assert_eq!(entity, "the president");
                assert_eq!(input, Some(PathBuf::from("doc.txt")));
                assert_eq!(analysis, Some(PathBuf::from("doc.json")));
            }
            other => panic!("Expected Resolve, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_collate_languages() {
        let cli = Cli::parse_from(["coresolve", "collate", "data/", "-l", "EN", "--lang", "PT"]);
        match cli.command {
            Commands::Collate { root, langs } => {
                assert_eq!(root, PathBuf::from("data/"));
                assert_eq!(langs, vec!["EN", "PT"]);
            }
            other => panic!("Expected Collate, got {:?}", other),
        }
    }

    #[test]
    fn test_read_input_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "Alice went home.\n").unwrap();
        assert_eq!(
            read_input(Some(temp.path().to_path_buf())).unwrap(),
            "Alice went home.\n"
        );
    }
}
