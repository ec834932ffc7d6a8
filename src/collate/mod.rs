//! Collation of annotation tables with raw documents.
//!
//! Input layout (per language folder):
//! - `<root>/<LANG>/subtask-1-annotations.txt`: TSV, no header, columns
//!   `document, mention, start, end, superlabel, label1, label2, label3`
//! - `<root>/<LANG>/raw-documents/<document>`: raw document text
//!
//! Output: `<root>/subtask1_<LANG>_clean.csv` with a `text` column holding
//! each row's document inserted after `document`.

pub mod annotations;

pub use annotations::{
    collate_documents, collate_language, output_path, parse_annotations, Annotation,
    ANNOTATIONS_FILE, COLLATED_COLUMNS, RAW_DOCUMENTS_DIR,
};
