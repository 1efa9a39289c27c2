use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use super::types::{Article, Chapter, NO_CHAPTER, NO_SECTION, Section};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Chapter(String),
    Section(String),
    Article(String),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingRegion {
    pub start: usize,
    pub end: usize,
    pub body_start: usize,
    pub divider_found: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScannedStructure {
    pub chapters: Vec<Chapter>,
    pub region: Option<HeadingRegion>,
}

impl ScannedStructure {
    pub fn body_start(&self) -> usize {
        self.region.map(|region| region.body_start).unwrap_or(0)
    }

    pub fn article_count(&self) -> usize {
        self.chapters.iter().map(Chapter::article_count).sum()
    }
}

#[derive(Debug)]
pub struct HeadingClassifier {
    chapter_heading: Regex,
    section_heading: Regex,
    article_heading: Regex,
    bootstrap_marker: Regex,
}

impl HeadingClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            chapter_heading: Regex::new(r"^제\d+장\s+[^\n<]*")
                .context("failed to compile chapter heading regex")?,
            section_heading: Regex::new(r"^제\d+절\s+[^\n<]*")
                .context("failed to compile section heading regex")?,
            article_heading: Regex::new(
                r"^(?:제\s*\d+(?:\s*-\s*\d+){0,2}\s*조(?:의\s*\d+)?(?:\s*\([^)]+\))?|부\s*칙)",
            )
            .context("failed to compile article heading regex")?,
            bootstrap_marker: Regex::new(r"제\s*\d+\s*조(?:의\s*\d+)?(?:\s*\([^)]+\))?")
                .context("failed to compile bootstrap article marker regex")?,
        })
    }

    pub fn classify_line(&self, line: &str) -> LineKind {
        let line = line.trim();
        if line.is_empty() {
            return LineKind::Ignored;
        }

        if let Some(found) = self.chapter_heading.find(line) {
            return LineKind::Chapter(found.as_str().trim().to_string());
        }

        if let Some(found) = self.section_heading.find(line) {
            return LineKind::Section(found.as_str().trim().to_string());
        }

        if let Some(found) = self.article_heading.find(line) {
            return LineKind::Article(found.as_str().trim().to_string());
        }

        LineKind::Ignored
    }

    pub fn is_hierarchy_line(&self, line: &str) -> bool {
        !matches!(self.classify_line(line), LineKind::Ignored)
    }

    pub fn locate_heading_region(&self, text: &str) -> Option<HeadingRegion> {
        let first = self.bootstrap_marker.find(text)?;
        let divider = text[first.end()..]
            .find(first.as_str())
            .map(|offset| first.end() + offset);

        Some(match divider {
            Some(second) => HeadingRegion {
                start: first.start(),
                end: second,
                body_start: second,
                divider_found: true,
            },
            None => HeadingRegion {
                start: first.start(),
                end: text.len(),
                body_start: first.start(),
                divider_found: false,
            },
        })
    }

    pub fn scan(&self, text: &str) -> ScannedStructure {
        let Some(region) = self.locate_heading_region(text) else {
            debug!("no article marker found; structure is empty");
            return ScannedStructure::default();
        };

        if !region.divider_found {
            warn!(
                start = region.start,
                "first article heading does not repeat; scanning to end of document"
            );
        }

        let mut builder = StructureBuilder::default();
        for line in text[region.start..region.end].lines() {
            builder.apply(self.classify_line(line));
        }

        ScannedStructure {
            chapters: builder.finish(),
            region: Some(region),
        }
    }
}

#[derive(Debug, Default)]
pub struct StructureBuilder {
    chapters: Vec<Chapter>,
    section_open: bool,
}

impl StructureBuilder {
    pub fn apply(&mut self, kind: LineKind) {
        match kind {
            LineKind::Chapter(title) => {
                self.chapters.push(Chapter::new(title));
                self.section_open = false;
            }
            LineKind::Section(title) => {
                self.current_chapter().sections.push(Section::new(title));
                self.section_open = true;
            }
            LineKind::Article(title) => {
                let section = self.current_section();
                section.articles.push(Article::new(title));
            }
            LineKind::Ignored => {}
        }
    }

    pub fn finish(self) -> Vec<Chapter> {
        self.chapters
    }

    fn current_chapter(&mut self) -> &mut Chapter {
        if self.chapters.is_empty() {
            self.chapters.push(Chapter::new(NO_CHAPTER));
            self.section_open = false;
        }

        let last = self.chapters.len() - 1;
        &mut self.chapters[last]
    }

    fn current_section(&mut self) -> &mut Section {
        let open = self.section_open;
        let chapter = self.current_chapter();
        if !open || chapter.sections.is_empty() {
            chapter.sections.push(Section::new(NO_SECTION));
        }
        self.section_open = true;

        let chapter = self.current_chapter();
        let last = chapter.sections.len() - 1;
        &mut chapter.sections[last]
    }
}
