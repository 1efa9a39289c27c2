use std::collections::HashMap;

use anyhow::{Result, bail};

use super::DocumentContext;
use super::types::{Article, Chapter, Chunk, Section};

pub const PAGE_PROBE_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub max_chunk_chars: usize,
    pub window_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 1500,
            window_chars: 1500,
            overlap_chars: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn new(max_chunk_chars: usize, window_chars: usize, overlap_chars: usize) -> Result<Self> {
        if max_chunk_chars == 0 {
            bail!("max chunk size must be greater than zero");
        }
        if window_chars == 0 {
            bail!("window size must be greater than zero");
        }
        if overlap_chars >= window_chars {
            bail!(
                "window overlap ({}) must be smaller than the window size ({})",
                overlap_chars,
                window_chars
            );
        }

        Ok(Self {
            max_chunk_chars,
            window_chars,
            overlap_chars,
        })
    }

    fn windows<'a>(&self, body: &'a str) -> Vec<&'a str> {
        if body.chars().count() <= self.max_chunk_chars {
            return vec![body];
        }

        split_windows(body, self.window_chars, self.overlap_chars)
    }
}

pub fn breadcrumb(instrument: &str, chapter: &Chapter, section: &Section, article: &Article) -> String {
    let mut parts = Vec::<String>::new();

    let instrument = instrument.trim();
    if !instrument.is_empty() {
        parts.push(format!("[{instrument}]"));
    }
    if chapter.is_explicit() {
        parts.push(format!("[{}]", chapter.title));
    }
    if section.is_explicit() {
        parts.push(format!("[{}]", section.title));
    }
    if !article.title.is_empty() {
        parts.push(format!("[{}]", article.title));
    }

    parts.join(" ")
}

pub fn split_windows(text: &str, window_chars: usize, overlap_chars: usize) -> Vec<&str> {
    let offsets = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect::<Vec<usize>>();
    let char_count = offsets.len() - 1;
    if char_count <= window_chars || window_chars == 0 {
        return vec![text];
    }

    let stride = window_chars.saturating_sub(overlap_chars).max(1);
    let mut windows = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + window_chars).min(char_count);
        windows.push(&text[offsets[start]..offsets[end]]);
        if end == char_count {
            break;
        }
        start += stride;
    }

    windows
}

fn page_probe(window: &str) -> String {
    window
        .trim_start()
        .chars()
        .take(PAGE_PROBE_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn compose_chunks(
    chapters: &[Chapter],
    context: &DocumentContext,
    config: &ChunkingConfig,
) -> Vec<Chunk> {
    let mut chunks = Vec::<Chunk>::new();
    let mut page_running = HashMap::<i64, usize>::new();
    let n_page = context.pages.page_count();

    for chapter in chapters {
        for section in &chapter.sections {
            for article in section.articles.iter().filter(|article| article.is_resolved()) {
                let prefix = breadcrumb(&context.title, chapter, section, article);
                let name = format!("{} {}", context.title, article.title).replace(' ', "");

                for window in config.windows(&article.text) {
                    let text = if prefix.is_empty() {
                        window.to_string()
                    } else {
                        format!("{prefix} {window}")
                    };
                    let i_page = context
                        .pages
                        .first_page_containing(&page_probe(window))
                        .unwrap_or(article.page);
                    let on_page = page_running.entry(i_page).or_insert(0);
                    *on_page += 1;

                    chunks.push(Chunk {
                        n_char: text.chars().count(),
                        n_word: text.split_whitespace().count(),
                        text,
                        i_page,
                        i_chunk_on_page: *on_page,
                        n_chunk_of_page: 0,
                        i_chunk_on_doc: chunks.len() + 1,
                        n_chunk_of_doc: 0,
                        n_page,
                        name: name.clone(),
                        file_path: context.file_path.clone(),
                        file_name: context.file_name.clone(),
                        reg_date: context.processed_at.clone(),
                    });
                }
            }
        }
    }

    backfill_totals(&mut chunks);
    chunks
}

fn backfill_totals(chunks: &mut [Chunk]) {
    let total = chunks.len();
    let mut per_page = HashMap::<i64, usize>::new();
    for chunk in chunks.iter() {
        *per_page.entry(chunk.i_page).or_insert(0) += 1;
    }

    for chunk in chunks.iter_mut() {
        chunk.n_chunk_of_doc = total;
        chunk.n_chunk_of_page = per_page.get(&chunk.i_page).copied().unwrap_or(0);
    }
}
