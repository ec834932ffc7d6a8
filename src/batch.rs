//! Batch resolution over a collated CSV.
//!
//! Every row is resolved with its `mention` as the entity and its `text` as
//! the document. The output keeps all input columns and appends `resolved`.
//! Consecutive rows sharing a document reuse one analysis; collated tables
//! keep a document's rows together, so only the current analysis is held.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::adapters::CorefModel;
use crate::core::Resolver;
use crate::domain::Analysis;

/// Name of the column appended to the output
pub const RESOLVED_COLUMN: &str = "resolved";

/// Outcome counts for a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Data rows read
    pub rows: usize,
    /// Rows with a resolved document
    pub resolved: usize,
    /// Rows left empty because their input was malformed
    pub failed: usize,
    /// Document analyses run (one per run of consecutive rows sharing a text)
    pub documents: usize,
}

/// Default output path: input file stem with `_resolved` appended
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_resolved.csv", stem))
}

/// Resolve every row of `input` and write the result to `output`
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub async fn resolve_table<M: CorefModel>(
    resolver: &Resolver<M>,
    input: &Path,
    output: &Path,
) -> Result<BatchSummary> {
    let content = fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read table: {}", input.display()))?;

    let (bytes, summary) = resolve_csv(resolver, &content).await?;

    fs::write(output, bytes)
        .await
        .with_context(|| format!("Failed to write table: {}", output.display()))?;

    info!(
        rows = summary.rows,
        resolved = summary.resolved,
        failed = summary.failed,
        documents = summary.documents,
        "Batch resolution finished"
    );
    Ok(summary)
}

/// Resolve every row of CSV `content`, returning the output CSV bytes
pub async fn resolve_csv<M: CorefModel>(
    resolver: &Resolver<M>,
    content: &str,
) -> Result<(Vec<u8>, BatchSummary)> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().context("Failed to read table header")?.clone();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Table has no '{}' column", name))
    };
    let text_col = column("text")?;
    let mention_col = column("mention")?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut out_headers = headers.clone();
    out_headers.push_field(RESOLVED_COLUMN);
    writer.write_record(&out_headers)?;

    // Current document text and its analysis; None marks a rejected document
    let mut current: Option<(String, Option<Analysis>)> = None;
    let mut summary = BatchSummary::default();

    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read table row {}", index + 1))?;
        summary.rows += 1;

        let text = record.get(text_col).unwrap_or_default();
        let entity = record.get(mention_col).unwrap_or_default();

        let cached = matches!(&current, Some((cached_text, _)) if cached_text == text);
        if !cached {
            let analysis = match resolver.analyze(text).await {
                Ok(analysis) => Some(analysis),
                Err(e) if e.is_malformed_input() => {
                    warn!(row = index + 1, error = %e, "Document rejected");
                    None
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to analyze row {}", index + 1))
                }
            };
            summary.documents += 1;
            current = Some((text.to_string(), analysis));
        }

        let resolved = match current.as_ref().and_then(|(_, analysis)| analysis.as_ref()) {
            Some(analysis) => match resolver.resolve_with(entity, analysis) {
                Ok(resolved) => Some(resolved),
                Err(e) => {
                    warn!(row = index + 1, entity, error = %e, "Row not resolved");
                    None
                }
            },
            None => None,
        };

        let mut out = record.clone();
        match resolved {
            Some(resolved) => {
                summary.resolved += 1;
                out.push_field(&resolved);
            }
            None => {
                summary.failed += 1;
                out.push_field("");
            }
        }
        writer.write_record(&out)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV output")?;
    Ok((bytes, summary))
}
