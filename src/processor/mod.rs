use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::extract::PageTextSource;
use crate::util::now_utc_string;

mod compose;
mod pattern;
mod span;
mod structure;
#[cfg(test)]
mod tests;
mod title;
mod types;

pub use compose::ChunkingConfig;
pub use title::{CommandTitleResolver, HeadingTitleResolver, NoTitleResolver, TitleResolver};
pub use types::Chunk;

use compose::compose_chunks;
use span::{fold_whole_document, resolve_spans};
use structure::HeadingClassifier;
use title::{resolve_title, title_preview};
use types::PageTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub chunking: ChunkingConfig,
    pub title_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            title_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub pages: PageTable,
    pub title: String,
    pub file_path: String,
    pub file_name: String,
    pub processed_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    pub page_count: usize,
    pub chapter_count: usize,
    pub section_count: usize,
    pub article_count: usize,
    pub articles_resolved: usize,
    pub articles_dropped: Vec<String>,
    pub heading_divider_found: bool,
    pub whole_document_fallback: bool,
    pub chunk_count: usize,
}

#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub title: String,
    pub chunks: Vec<Chunk>,
    pub report: ProcessReport,
}

pub struct DocumentProcessor {
    config: ProcessorConfig,
    classifier: HeadingClassifier,
    title_resolver: Arc<dyn TitleResolver>,
}

impl DocumentProcessor {
    pub fn new(config: ProcessorConfig, title_resolver: Arc<dyn TitleResolver>) -> Result<Self> {
        Ok(Self {
            config,
            classifier: HeadingClassifier::new()?,
            title_resolver,
        })
    }

    pub fn process_file(
        &self,
        source: &dyn PageTextSource,
        pdf_path: &Path,
    ) -> Result<ProcessedDocument> {
        let pages = source
            .extract_pages(pdf_path)
            .with_context(|| format!("failed to extract pages from {}", pdf_path.display()))?;

        Ok(self.process_pages(pages, &pdf_path.display().to_string()))
    }

    pub fn process_pages(&self, page_texts: Vec<String>, file_path: &str) -> ProcessedDocument {
        let pages = PageTable::from_texts(page_texts);
        let title = resolve_title(
            Arc::clone(&self.title_resolver),
            title_preview(pages.first_page_text()),
            self.config.title_timeout,
        );

        let context = DocumentContext {
            pages,
            title,
            file_path: display_file_path(file_path),
            file_name: file_name_of(file_path),
            processed_at: now_utc_string(),
        };

        let scanned = self.classifier.scan(context.pages.text());
        let mut report = ProcessReport {
            page_count: context.pages.page_count(),
            chapter_count: scanned.chapters.len(),
            section_count: scanned
                .chapters
                .iter()
                .map(|chapter| chapter.sections.len())
                .sum(),
            article_count: scanned.article_count(),
            heading_divider_found: scanned
                .region
                .map(|region| region.divider_found)
                .unwrap_or(false),
            ..ProcessReport::default()
        };

        let body_start = scanned.body_start();
        let mut chapters = scanned.chapters;
        if report.article_count == 0 {
            chapters = fold_whole_document(&context.pages);
            report.whole_document_fallback = true;
            report.articles_resolved = chapters.iter().map(|chapter| chapter.article_count()).sum();
        } else {
            match resolve_spans(&mut chapters, &context.pages, body_start) {
                Ok(spans) => {
                    report.articles_resolved = spans.spans.len();
                    report.articles_dropped = spans.dropped;
                }
                Err(err) => {
                    warn!(error = %err, file = %context.file_name, "span resolution failed");
                    report.articles_dropped = chapters
                        .iter()
                        .flat_map(|chapter| &chapter.sections)
                        .flat_map(|section| &section.articles)
                        .map(|article| article.title.clone())
                        .collect();
                }
            }
        }

        let chunks = compose_chunks(&chapters, &context, &self.config.chunking);
        report.chunk_count = chunks.len();

        info!(
            file = %context.file_name,
            title = %context.title,
            pages = report.page_count,
            articles = report.article_count,
            resolved = report.articles_resolved,
            dropped = report.articles_dropped.len(),
            chunks = report.chunk_count,
            "processed document"
        );

        ProcessedDocument {
            title: context.title,
            chunks,
            report,
        }
    }
}

fn display_file_path(file_path: &str) -> String {
    file_path
        .strip_prefix('.')
        .unwrap_or(file_path)
        .to_string()
}

fn file_name_of(file_path: &str) -> String {
    file_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_path)
        .to_string()
}
