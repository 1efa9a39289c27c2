use serde::{Deserialize, Serialize};

use crate::processor::ProcessReport;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfEntry {
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub pdf_count: usize,
    pub pdfs: Vec<PdfEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub lawchunk: String,
    pub pdftotext: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestPaths {
    pub source_dir: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSettings {
    pub title_mode: String,
    pub title_timeout_ms: u64,
    pub max_chunk_chars: usize,
    pub window_chars: usize,
    pub overlap_chars: usize,
    pub boilerplate_pattern: String,
    pub strip_repeated_edges: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestCounts {
    pub pdf_count: usize,
    pub processed_pdf_count: usize,
    pub failed_pdf_count: usize,
    pub docs_total: i64,
    pub chunks_total: i64,
    pub chunks_inserted: usize,
    pub articles_found: usize,
    pub articles_resolved: usize,
    pub articles_dropped: usize,
    pub whole_document_fallbacks: usize,
    pub untitled_documents: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentIngestEntry {
    pub filename: String,
    pub status: String,
    pub title: Option<String>,
    pub report: Option<ProcessReport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub store_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: IngestPaths,
    pub settings: ProcessingSettings,
    pub counts: IngestCounts,
    pub documents: Vec<DocumentIngestEntry>,
    pub source_hashes: Vec<PdfEntry>,
    pub warnings: Vec<String>,
}
