use anyhow::Result;
use regex::Regex;
use tracing::{debug, warn};

use super::pattern::compile_flexible_pattern;
use super::types::{Article, Chapter, NO_CHAPTER, NO_SECTION, PageTable, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    NextArticle,
    NextSection,
    NextChapter,
}

#[derive(Debug)]
struct ArticleSlot {
    chapter: usize,
    section: usize,
    article: usize,
    title: String,
    pattern: Regex,
    boundaries: Vec<(BoundaryKind, usize)>,
}

#[derive(Debug)]
pub struct BoundaryPlan {
    slots: Vec<ArticleSlot>,
}

impl BoundaryPlan {
    pub fn build(chapters: &[Chapter]) -> Result<Self> {
        let mut slots = Vec::<ArticleSlot>::new();
        for (chapter_index, chapter) in chapters.iter().enumerate() {
            for (section_index, section) in chapter.sections.iter().enumerate() {
                for (article_index, article) in section.articles.iter().enumerate() {
                    slots.push(ArticleSlot {
                        chapter: chapter_index,
                        section: section_index,
                        article: article_index,
                        title: article.title.clone(),
                        pattern: compile_flexible_pattern(&article.title)?,
                        boundaries: Vec::new(),
                    });
                }
            }
        }

        for index in 0..slots.len() {
            let boundaries = boundary_candidates(&slots, index);
            slots[index].boundaries = boundaries;
        }

        Ok(Self { slots })
    }

    #[cfg(test)]
    pub fn boundaries_of(&self, index: usize) -> &[(BoundaryKind, usize)] {
        self.slots
            .get(index)
            .map(|slot| slot.boundaries.as_slice())
            .unwrap_or(&[])
    }

    fn nearest_boundary(&self, index: usize, text: &str, cursor: usize) -> Option<usize> {
        self.slots[index]
            .boundaries
            .iter()
            .filter_map(|(_, target)| {
                self.slots[*target]
                    .pattern
                    .find_at(text, cursor)
                    .map(|found| found.start())
            })
            .min()
    }
}

fn boundary_candidates(slots: &[ArticleSlot], index: usize) -> Vec<(BoundaryKind, usize)> {
    let current = &slots[index];
    let mut boundaries = Vec::new();
    let mut next_section_seen = false;

    for (target, slot) in slots.iter().enumerate().skip(index + 1) {
        if slot.chapter != current.chapter {
            boundaries.push((BoundaryKind::NextChapter, target));
            break;
        }

        if slot.section == current.section {
            if target == index + 1 {
                boundaries.push((BoundaryKind::NextArticle, target));
            }
            continue;
        }

        if !next_section_seen {
            boundaries.push((BoundaryKind::NextSection, target));
            next_section_seen = true;
        }
    }

    boundaries
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    pub title: String,
    pub start: usize,
    pub end: usize,
    pub page: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanReport {
    pub spans: Vec<ResolvedSpan>,
    pub dropped: Vec<String>,
}

pub fn resolve_spans(
    chapters: &mut [Chapter],
    pages: &PageTable,
    body_start: usize,
) -> Result<SpanReport> {
    let plan = BoundaryPlan::build(chapters)?;
    let text = pages.text();
    let mut cursor = body_start.min(text.len());
    let mut located = Vec::<(usize, usize, usize)>::new();
    let mut report = SpanReport::default();

    for index in 0..plan.slots.len() {
        let slot = &plan.slots[index];
        let Some(found) = slot.pattern.find_at(text, cursor) else {
            warn!(
                article = %slot.title,
                cursor,
                "article heading not found after cursor; dropping article"
            );
            report.dropped.push(slot.title.clone());
            continue;
        };

        let start = found.start();
        cursor = found.end();
        let end = plan
            .nearest_boundary(index, text, cursor)
            .unwrap_or(text.len());
        located.push((index, start, end));
    }

    for position in 0..located.len() {
        if let Some(&(_, next_start, _)) = located.get(position + 1) {
            let (_, start, end) = &mut located[position];
            if next_start < *end {
                *end = next_start.max(*start);
            }
        }
    }

    for (index, start, end) in located {
        let slot = &plan.slots[index];
        let article = &mut chapters[slot.chapter].sections[slot.section].articles[slot.article];
        let page = pages.page_for_offset(start);
        article.text = text[start..end].trim().to_string();
        article.page = page;
        article.span = Some(start..end);

        debug!(article = %article.title, start, end, page, "resolved article span");
        report.spans.push(ResolvedSpan {
            title: article.title.clone(),
            start,
            end,
            page,
        });
    }

    Ok(report)
}

pub fn fold_whole_document(pages: &PageTable) -> Vec<Chapter> {
    let text = pages.text();
    let body = text.trim();
    if body.is_empty() {
        return Vec::new();
    }

    let start = text.len() - text.trim_start().len();
    let end = start + body.len();
    let mut article = Article::new("");
    article.text = body.to_string();
    article.page = pages.page_for_offset(start);
    article.span = Some(start..end);

    let mut section = Section::new(NO_SECTION);
    section.articles.push(article);
    let mut chapter = Chapter::new(NO_CHAPTER);
    chapter.sections.push(section);
    vec![chapter]
}
