//! Batch Resolution Integration Tests
//!
//! Runs table-wide resolution with a local model that tokenizes the
//! document and clusters pronouns with the first word.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use coresolve::batch::{resolve_csv, resolve_table, BatchSummary, RESOLVED_COLUMN};
use coresolve::core::{Resolver, ResolverSettings};
use coresolve::domain::Analysis;
use coresolve::CorefModel;
use tempfile::TempDir;

const PRONOUNS: [&str; 4] = ["He", "She", "he", "she"];

/// Clusters the first token with every pronoun in the document
struct PronounModel {
    calls: AtomicUsize,
}

impl PronounModel {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CorefModel for PronounModel {
    fn name(&self) -> &str {
        "pronoun"
    }

    async fn analyze(&self, text: &str) -> Result<Analysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let analysis = Analysis::tokenized(text);
        let mut ranges = vec![0..1];
        for (i, token) in analysis.tokens.iter().enumerate().skip(1) {
            if PRONOUNS.contains(&token.text.as_str()) {
                ranges.push(i..i + 1);
            }
        }
        Ok(analysis.with_group("coref_clusters_1", &ranges))
    }
}

const TABLE: &str = "\
document,text,mention,start,end,superlabel
a.txt,Alice went home. She was tired.,Alice,0,5,Protagonist
a.txt,Alice went home. She was tired.,home,11,15,Innocent
b.txt,\"Bob lied, and he ran.\",Bob,0,3,Antagonist
";

#[tokio::test]
async fn test_resolve_csv_appends_column() {
    let resolver = Resolver::new(PronounModel::new());
    let (bytes, summary) = resolve_csv(&resolver, TABLE).await.unwrap();

    assert_eq!(
        summary,
        BatchSummary {
            rows: 3,
            resolved: 3,
            failed: 0,
            documents: 2,
        }
    );
    // Adjacent rows of the same document share one analysis
    assert_eq!(resolver.model().calls.load(Ordering::SeqCst), 2);

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 7);
    assert_eq!(&headers[6], RESOLVED_COLUMN);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(&rows[0][6], "Alice went home. Alice was tired.");
    // "home" is not in any cluster, so the document is unchanged
    assert_eq!(&rows[1][6], "Alice went home. She was tired.");
    assert_eq!(&rows[2][6], "Bob lied, and Bob ran.");
    assert_eq!(&rows[2][1], "Bob lied, and he ran.");
}

#[tokio::test]
async fn test_oversize_documents_left_empty() {
    let settings = ResolverSettings {
        max_input_bytes: 25,
        ..Default::default()
    };
    let resolver = Resolver::with_settings(PronounModel::new(), settings);
    let (bytes, summary) = resolve_csv(&resolver, TABLE).await.unwrap();

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(resolver.model().calls.load(Ordering::SeqCst), 1);

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(&rows[0][6], "");
    assert_eq!(&rows[1][6], "");
    assert_eq!(&rows[2][6], "Bob lied, and Bob ran.");
}

#[tokio::test]
async fn test_only_current_document_cached() {
    let table = "\
document,text,mention
a.txt,Alice went home. She was tired.,Alice
b.txt,Bob ran.,Bob
a.txt,Alice went home. She was tired.,Alice
";
    let resolver = Resolver::new(PronounModel::new());
    let (bytes, summary) = resolve_csv(&resolver, table).await.unwrap();

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.resolved, 3);
    assert_eq!(summary.documents, 3);
    assert_eq!(resolver.model().calls.load(Ordering::SeqCst), 3);

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(&rows[0][3], &rows[2][3]);
}

#[tokio::test]
async fn test_missing_columns_rejected() {
    let resolver = Resolver::new(PronounModel::new());
    let err = resolve_csv(&resolver, "document,mention\na.txt,Alice\n")
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("no 'text' column"));
}

#[tokio::test]
async fn test_model_failure_aborts_batch() {
    struct BrokenModel;

    #[async_trait]
    impl CorefModel for BrokenModel {
        fn name(&self) -> &str {
            "broken"
        }

        async fn analyze(&self, _text: &str) -> Result<Analysis> {
            anyhow::bail!("model crashed")
        }
    }

    let resolver = Resolver::new(BrokenModel);
    let err = resolve_csv(&resolver, TABLE).await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("row 1"));
    assert!(message.contains("model crashed"));
}

#[tokio::test]
async fn test_resolve_table_writes_file() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("subtask1_EN_clean.csv");
    let output = temp.path().join("out.csv");
    std::fs::write(&input, TABLE).unwrap();

    let resolver = Resolver::new(PronounModel::new());
    let summary = resolve_table(&resolver, &input, &output).await.unwrap();
    assert_eq!(summary.resolved, 3);

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("document,text,mention,start,end,superlabel,resolved\n"));
    assert!(written.contains("Alice went home. Alice was tired."));
}
