use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::commands::inventory;
use crate::commands::processing::{ProcessingSetup, render_processing_flags};
use crate::extract::pdftotext_version;
use crate::model::{
    DocumentIngestEntry, IngestCounts, IngestPaths, IngestRunManifest, PdfEntry,
    PdfInventoryManifest, ToolVersions,
};
use crate::processor::ProcessedDocument;
use crate::store::{
    DocumentRecord, STORE_SCHEMA_VERSION, count_rows, open_store, replace_document_chunks,
};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

mod manifest;
mod pipeline;
mod run;

pub use run::run;

use manifest::*;
use pipeline::*;
