use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::debug;

pub const DEFAULT_BOILERPLATE_PATTERN: &str = r"법제처\s+\d+\s+국가법령정보센터";

const REPEATED_EDGE_MIN_PAGES: usize = 3;
const REPEATED_EDGE_MAX_CHARS: usize = 120;

pub trait PageTextSource: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct PageNormalization {
    boilerplate: Option<Regex>,
    strip_repeated_edges: bool,
}

impl PageNormalization {
    pub fn new(boilerplate_pattern: &str, strip_repeated_edges: bool) -> Result<Self> {
        let boilerplate = if boilerplate_pattern.trim().is_empty() {
            None
        } else {
            Some(
                Regex::new(boilerplate_pattern)
                    .with_context(|| format!("invalid boilerplate pattern: {boilerplate_pattern}"))?,
            )
        };

        Ok(Self {
            boilerplate,
            strip_repeated_edges,
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizationStats {
    pub boilerplate_removed: usize,
    pub header_lines_removed: usize,
    pub footer_lines_removed: usize,
}

#[derive(Debug, Clone)]
pub struct PdftotextSource {
    normalization: PageNormalization,
    max_pages: Option<usize>,
}

impl PdftotextSource {
    pub fn new(normalization: PageNormalization, max_pages: Option<usize>) -> Self {
        Self {
            normalization,
            max_pages,
        }
    }
}

impl PageTextSource for PdftotextSource {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let raw_pages = extract_pages_with_pdftotext(path, self.max_pages)?;
        let (pages, stats) = normalize_pages(raw_pages, &self.normalization);
        debug!(
            path = %path.display(),
            pages = pages.len(),
            boilerplate_removed = stats.boilerplate_removed,
            header_lines_removed = stats.header_lines_removed,
            footer_lines_removed = stats.footer_lines_removed,
            "extracted page text"
        );
        Ok(pages)
    }
}

fn extract_pages_with_pdftotext(pdf_path: &Path, max_pages: Option<usize>) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    Ok(split_form_feed_pages(&raw))
}

fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

pub fn normalize_pages(
    pages: Vec<String>,
    normalization: &PageNormalization,
) -> (Vec<String>, NormalizationStats) {
    let mut stats = NormalizationStats::default();

    let mut pages = pages
        .into_iter()
        .map(|page| match &normalization.boilerplate {
            Some(pattern) => {
                stats.boilerplate_removed += pattern.find_iter(&page).count();
                pattern.replace_all(&page, "").into_owned()
            }
            None => page,
        })
        .collect::<Vec<String>>();

    if normalization.strip_repeated_edges {
        let header_candidates = detect_repeated_edge_lines(&pages, true);
        let footer_candidates = detect_repeated_edge_lines(&pages, false);

        for (index, page) in pages.iter_mut().enumerate() {
            let mut lines = page.lines().map(str::to_string).collect::<Vec<String>>();

            if index > 0 {
                if let Some(line_index) = first_nonempty_line_index(&lines) {
                    if header_candidates.contains(&normalize_edge_line(&lines[line_index])) {
                        lines.remove(line_index);
                        stats.header_lines_removed += 1;
                    }
                }
            }

            if let Some(line_index) = last_nonempty_line_index(&lines) {
                if footer_candidates.contains(&normalize_edge_line(&lines[line_index])) {
                    lines.remove(line_index);
                    stats.footer_lines_removed += 1;
                }
            }

            *page = lines.join("\n");
        }
    }

    for page in &mut pages {
        if !page.ends_with('\n') {
            page.push('\n');
        }
    }

    (pages, stats)
}

fn detect_repeated_edge_lines(pages: &[String], header: bool) -> HashSet<String> {
    let mut counts = HashMap::<String, usize>::new();
    for page in pages {
        let lines = page.lines().map(str::trim).collect::<Vec<&str>>();
        let candidate = if header {
            lines.iter().copied().find(|line| !line.is_empty())
        } else {
            lines.iter().rev().copied().find(|line| !line.is_empty())
        };

        let Some(candidate) = candidate else {
            continue;
        };

        let normalized = normalize_edge_line(candidate);
        if normalized.is_empty() || normalized.chars().count() > REPEATED_EDGE_MAX_CHARS {
            continue;
        }
        *counts.entry(normalized).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter_map(|(candidate, count)| {
            if count >= REPEATED_EDGE_MIN_PAGES {
                Some(candidate)
            } else {
                None
            }
        })
        .collect()
}

fn normalize_edge_line(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn first_nonempty_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().position(|line| !line.trim().is_empty())
}

fn last_nonempty_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().rposition(|line| !line.trim().is_empty())
}

pub fn pdftotext_version() -> Option<String> {
    let output = Command::new("pdftotext").arg("-v").output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| text.to_string()).collect()
    }

    #[test]
    fn split_form_feed_pages_drops_trailing_empty_pages() {
        let raw = "첫 페이지\n\u{000C}둘째\u{0000} 페이지\n\u{000C}\n\u{000C}";
        let split = split_form_feed_pages(raw);
        assert_eq!(split, vec!["첫 페이지\n".to_string(), "둘째 페이지\n".to_string()]);
    }

    #[test]
    fn normalize_pages_removes_law_portal_footer() {
        let normalization = PageNormalization::new(DEFAULT_BOILERPLATE_PATTERN, false)
            .expect("default pattern compiles");
        let (normalized, stats) = normalize_pages(
            pages(&["제1조(목적) 이 법은\n법제처 1 국가법령정보센터"]),
            &normalization,
        );

        assert_eq!(stats.boilerplate_removed, 1);
        assert!(!normalized[0].contains("국가법령정보센터"));
        assert!(normalized[0].ends_with('\n'));
    }

    #[test]
    fn normalize_pages_strips_repeated_edges_but_keeps_first_header() {
        let normalization = PageNormalization::new("", true).expect("empty pattern is allowed");
        let (normalized, stats) = normalize_pages(
            pages(&[
                "개인정보 보호법\n제1조(목적) 본문\n- 1 -",
                "개인정보 보호법\n제2조(정의) 본문\n- 1 -",
                "개인정보 보호법\n제3조(적용) 본문\n- 1 -",
            ]),
            &normalization,
        );

        assert_eq!(stats.header_lines_removed, 2);
        assert_eq!(stats.footer_lines_removed, 3);
        assert!(normalized[0].starts_with("개인정보 보호법"));
        assert!(normalized[1].starts_with("제2조(정의)"));
        assert!(!normalized[2].contains("- 1 -"));
    }

    #[test]
    fn normalize_pages_rejects_invalid_boilerplate_pattern() {
        assert!(PageNormalization::new("(unclosed", true).is_err());
    }
}
