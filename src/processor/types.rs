use std::ops::Range;

use serde::{Deserialize, Serialize};

pub const NO_CHAPTER: &str = "장 없음";
pub const NO_SECTION: &str = "절 없음";
pub const UNKNOWN_PAGE: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub text: String,
    pub page_number: i64,
    pub doc_offset_start: usize,
    pub doc_offset_end: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PageTable {
    pages: Vec<Page>,
    text: String,
}

impl PageTable {
    pub fn from_texts(texts: Vec<String>) -> Self {
        let mut pages = Vec::with_capacity(texts.len());
        let mut text = String::new();

        for (index, page_text) in texts.into_iter().enumerate() {
            let doc_offset_start = text.len();
            text.push_str(&page_text);
            pages.push(Page {
                text: page_text,
                page_number: (index + 1) as i64,
                doc_offset_start,
                doc_offset_end: text.len(),
            });
        }

        Self { pages, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn first_page_text(&self) -> &str {
        self.pages
            .first()
            .map(|page| page.text.as_str())
            .unwrap_or("")
    }

    pub fn page_for_offset(&self, offset: usize) -> i64 {
        let index = self
            .pages
            .partition_point(|page| page.doc_offset_end <= offset);

        match self.pages.get(index) {
            Some(page) if page.doc_offset_start <= offset && offset < page.doc_offset_end => {
                page.page_number
            }
            _ => UNKNOWN_PAGE,
        }
    }

    pub fn first_page_containing(&self, needle: &str) -> Option<i64> {
        if needle.is_empty() {
            return None;
        }

        self.pages
            .iter()
            .find(|page| page.text.contains(needle))
            .map(|page| page.page_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub text: String,
    pub page: i64,
    pub span: Option<Range<usize>>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: String::new(),
            page: UNKNOWN_PAGE,
            span: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.span.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub articles: Vec<Article>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            articles: Vec::new(),
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.title != NO_SECTION
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.title != NO_CHAPTER
    }

    pub fn article_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.articles.len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub n_char: usize,
    pub n_word: usize,
    pub i_page: i64,
    pub i_chunk_on_page: usize,
    pub n_chunk_of_page: usize,
    pub i_chunk_on_doc: usize,
    pub n_chunk_of_doc: usize,
    pub n_page: usize,
    pub name: String,
    pub file_path: String,
    pub file_name: String,
    pub reg_date: String,
}
