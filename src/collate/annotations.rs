//! Annotation table reading and collated CSV writing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::StringRecord;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Annotation file inside each language folder
pub const ANNOTATIONS_FILE: &str = "subtask-1-annotations.txt";

/// Raw document folder inside each language folder
pub const RAW_DOCUMENTS_DIR: &str = "raw-documents";

/// Column order of the collated CSV
pub const COLLATED_COLUMNS: [&str; 9] = [
    "document",
    "text",
    "mention",
    "start",
    "end",
    "superlabel",
    "label1",
    "label2",
    "label3",
];

/// One line of a language's annotation table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub document: String,
    pub mention: String,
    pub start: u64,
    pub end: u64,
    pub superlabel: String,
    pub label1: Option<String>,
    pub label2: Option<String>,
    pub label3: Option<String>,
}

/// One row of the collated CSV (`text` follows `document`)
#[derive(Debug, Clone, Serialize)]
pub struct CollatedRow<'a> {
    pub document: &'a str,
    pub text: &'a str,
    pub mention: &'a str,
    pub start: u64,
    pub end: u64,
    pub superlabel: &'a str,
    pub label1: Option<&'a str>,
    pub label2: Option<&'a str>,
    pub label3: Option<&'a str>,
}

impl Annotation {
    fn from_record(record: &StringRecord, line: usize) -> Result<Self> {
        let required = |index: usize, name: &str| -> Result<String> {
            record
                .get(index)
                .map(str::to_string)
                .with_context(|| format!("Line {}: missing '{}' column", line, name))
        };
        let optional = |index: usize| -> Option<String> {
            record
                .get(index)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };
        let offset = |index: usize, name: &str| -> Result<u64> {
            let raw = required(index, name)?;
            raw.trim()
                .parse()
                .with_context(|| format!("Line {}: invalid '{}' offset: {:?}", line, name, raw))
        };

        Ok(Self {
            document: required(0, "document")?,
            mention: required(1, "mention")?,
            start: offset(2, "start")?,
            end: offset(3, "end")?,
            superlabel: required(4, "superlabel")?,
            label1: optional(5),
            label2: optional(6),
            label3: optional(7),
        })
    }
}

/// Parse a tab-separated annotation table without a header row
pub fn parse_annotations(content: &str) -> Result<Vec<Annotation>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut annotations = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read annotation line {}", index + 1))?;
        annotations.push(Annotation::from_record(&record, index + 1)?);
    }

    Ok(annotations)
}

/// Render collated rows as CSV with a header line
pub fn write_collated_csv(annotations: &[Annotation], texts: &HashMap<String, String>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if annotations.is_empty() {
        writer.write_record(COLLATED_COLUMNS)?;
    }

    for annotation in annotations {
        let text = texts
            .get(&annotation.document)
            .with_context(|| format!("No raw text loaded for document {}", annotation.document))?;

        writer.serialize(CollatedRow {
            document: &annotation.document,
            text,
            mention: &annotation.mention,
            start: annotation.start,
            end: annotation.end,
            superlabel: &annotation.superlabel,
            label1: annotation.label1.as_deref(),
            label2: annotation.label2.as_deref(),
            label3: annotation.label3.as_deref(),
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV output")
}

/// Read a raw document as text with line endings normalized to `\n`
async fn read_raw_document(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read raw document: {}", path.display()))?;

    Ok(content.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Path of the collated CSV for a language
pub fn output_path(root: &Path, lang: &str) -> PathBuf {
    root.join(format!("subtask1_{}_clean.csv", lang))
}

/// Collate one language folder, returning the written CSV path
#[instrument(skip(root), fields(root = %root.display()))]
pub async fn collate_language(root: &Path, lang: &str) -> Result<PathBuf> {
    let lang_dir = root.join(lang);
    let table_path = lang_dir.join(ANNOTATIONS_FILE);

    let content = fs::read_to_string(&table_path)
        .await
        .with_context(|| format!("Failed to read annotations: {}", table_path.display()))?;
    let annotations = parse_annotations(&content)
        .with_context(|| format!("Failed to parse annotations: {}", table_path.display()))?;

    let mut texts: HashMap<String, String> = HashMap::new();
    for annotation in &annotations {
        if texts.contains_key(&annotation.document) {
            continue;
        }
        let doc_path = lang_dir.join(RAW_DOCUMENTS_DIR).join(&annotation.document);
        debug!(document = %annotation.document, "Reading raw document");
        texts.insert(annotation.document.clone(), read_raw_document(&doc_path).await?);
    }

    let csv = write_collated_csv(&annotations, &texts)?;
    let out_path = output_path(root, lang);
    fs::write(&out_path, csv)
        .await
        .with_context(|| format!("Failed to write collated CSV: {}", out_path.display()))?;

    info!(
        rows = annotations.len(),
        documents = texts.len(),
        output = %out_path.display(),
        "Collated annotations"
    );
    Ok(out_path)
}

/// Collate every language folder under `root`
pub async fn collate_documents(root: &Path, langs: &[String]) -> Result<Vec<PathBuf>> {
    let mut outputs = Vec::with_capacity(langs.len());
    for lang in langs {
        outputs.push(collate_language(root, lang).await?);
    }
    Ok(outputs)
}
