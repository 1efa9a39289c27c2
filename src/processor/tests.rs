use std::fs;
use std::path::Path;
use std::thread;
use std::time::Instant;

use super::*;
use super::compose::{breadcrumb, split_windows};
use super::pattern::{compile_flexible_pattern, heading_runs};
use super::span::{BoundaryKind, BoundaryPlan};
use super::structure::LineKind;
use super::types::{Article, Chapter, NO_CHAPTER, NO_SECTION, Section, UNKNOWN_PAGE};

struct SlowResolver;

impl TitleResolver for SlowResolver {
    fn resolve(&self, _preview: &str) -> Result<String> {
        thread::sleep(Duration::from_secs(2));
        Ok("느린 제목".to_string())
    }
}

struct FailingResolver;

impl TitleResolver for FailingResolver {
    fn resolve(&self, _preview: &str) -> Result<String> {
        anyhow::bail!("title service unavailable")
    }
}

struct FixedResolver(&'static str);

impl TitleResolver for FixedResolver {
    fn resolve(&self, _preview: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

fn processor_with(resolver: Arc<dyn TitleResolver>) -> DocumentProcessor {
    DocumentProcessor::new(ProcessorConfig::default(), resolver).expect("processor")
}

fn process(pages: &[&str]) -> ProcessedDocument {
    processor_with(Arc::new(NoTitleResolver)).process_pages(
        pages.iter().map(|page| page.to_string()).collect(),
        "./pdfs/개인정보 보호법.pdf",
    )
}

fn article_with_titles(titles: &[&str]) -> Section {
    let mut section = Section::new(NO_SECTION);
    section.articles = titles.iter().map(|title| Article::new(*title)).collect();
    section
}

fn varied_text(chars: usize) -> String {
    (0..chars)
        .map(|index| char::from_u32(0xAC00 + (index % 400) as u32).unwrap_or('가'))
        .collect()
}

#[test]
fn heading_runs_group_letter_classes() {
    assert_eq!(
        heading_runs("제1조의2(정의)"),
        vec!["제", "1", "조의", "2", "(", "정의", ")"]
    );
    assert_eq!(heading_runs("  부 칙 "), vec!["부", "칙"]);
}

#[test]
fn flexible_pattern_tolerates_spacing_but_not_other_numbers() {
    let pattern = compile_flexible_pattern("제1조(목적)").expect("pattern");

    assert!(pattern.is_match("제1조 ( 목적 )"));
    assert!(pattern.is_match("제 1 조(목적) 이 법은"));
    assert!(!pattern.is_match("제11조(목적)"));
    assert!(!pattern.is_match("제1조[목적]"));
}

#[test]
fn flexible_pattern_rejects_blank_heading() {
    assert!(compile_flexible_pattern("   ").is_err());
}

#[test]
fn classify_line_recognises_hierarchy_markers() {
    let classifier = HeadingClassifier::new().expect("classifier");

    assert_eq!(
        classifier.classify_line("제1장 총칙 <개정 2020. 2. 4.>"),
        LineKind::Chapter("제1장 총칙".to_string())
    );
    assert_eq!(
        classifier.classify_line("제2절 통칙"),
        LineKind::Section("제2절 통칙".to_string())
    );
    assert_eq!(
        classifier.classify_line("제3조의2(적용 범위) 이 법은 다음 각 호에 적용한다."),
        LineKind::Article("제3조의2(적용 범위)".to_string())
    );
    assert_eq!(
        classifier.classify_line("부칙 <법률 제19234호, 2023. 3. 14.>"),
        LineKind::Article("부칙".to_string())
    );
    assert_eq!(classifier.classify_line("   "), LineKind::Ignored);
    assert_eq!(
        classifier.classify_line("이 법은 공포한 날부터 시행한다."),
        LineKind::Ignored
    );
}

#[test]
fn scan_builds_hierarchy_with_sentinels() {
    let classifier = HeadingClassifier::new().expect("classifier");
    let text = "제1조(목적)\n제1장 총칙\n제1절 통칙\n제2조(정의)\n제2절 보칙\n제3조(위임)\n제2장 벌칙\n제4조(벌칙)\n\
                제1조(목적) 이 법은 목적을 정한다.\n";

    let scanned = classifier.scan(text);

    let region = scanned.region.expect("region");
    assert!(region.divider_found);
    assert_eq!(region.start, 0);
    assert_eq!(&text[region.body_start..region.body_start + "제1조(목적)".len()], "제1조(목적)");
    assert!(region.body_start > 0);

    let titles = scanned
        .chapters
        .iter()
        .map(|chapter| chapter.title.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(titles, vec![NO_CHAPTER, "제1장 총칙", "제2장 벌칙"]);

    assert_eq!(scanned.chapters[0].sections[0].title, NO_SECTION);
    assert_eq!(scanned.chapters[0].sections[0].articles[0].title, "제1조(목적)");
    assert_eq!(scanned.chapters[1].sections[0].title, "제1절 통칙");
    assert_eq!(scanned.chapters[1].sections[1].title, "제2절 보칙");
    assert_eq!(scanned.chapters[1].sections[1].articles[0].title, "제3조(위임)");
    assert_eq!(scanned.chapters[2].sections[0].title, NO_SECTION);
    assert_eq!(scanned.article_count(), 4);
}

#[test]
fn scan_falls_back_to_document_end_when_marker_never_repeats() {
    let classifier = HeadingClassifier::new().expect("classifier");
    let text = "[시행 2024. 1. 1.]\n제1조(목적) 이 법은 목적을 정한다.\n제2조(정의) 용어의 뜻은 다음과 같다.\n";

    let scanned = classifier.scan(text);

    let region = scanned.region.expect("region");
    assert!(!region.divider_found);
    assert_eq!(region.end, text.len());
    assert_eq!(scanned.body_start(), text.find("제1조").expect("marker"));
    assert_eq!(scanned.article_count(), 2);
}

#[test]
fn scan_without_article_marker_is_empty() {
    let classifier = HeadingClassifier::new().expect("classifier");
    let scanned = classifier.scan("별표 1\n서식\n");

    assert!(scanned.region.is_none());
    assert!(scanned.chapters.is_empty());
    assert_eq!(scanned.body_start(), 0);
}

#[test]
fn boundary_plan_prefers_article_then_section_then_chapter() {
    let mut first = Chapter::new("제1장 총칙");
    let mut opening = Section::new("제1절 통칙");
    opening.articles = vec![Article::new("제1조(목적)"), Article::new("제2조(정의)")];
    let mut closing = Section::new("제2절 보칙");
    closing.articles = vec![Article::new("제3조(위임)")];
    first.sections = vec![opening, closing];
    let mut second = Chapter::new("제2장 벌칙");
    second.sections = vec![article_with_titles(&["제4조(벌칙)"])];

    let plan = BoundaryPlan::build(&[first, second]).expect("plan");

    assert_eq!(
        plan.boundaries_of(0),
        &[(BoundaryKind::NextArticle, 1), (BoundaryKind::NextSection, 2), (BoundaryKind::NextChapter, 3)]
    );
    assert_eq!(
        plan.boundaries_of(1),
        &[(BoundaryKind::NextSection, 2), (BoundaryKind::NextChapter, 3)]
    );
    assert_eq!(plan.boundaries_of(2), &[(BoundaryKind::NextChapter, 3)]);
    assert!(plan.boundaries_of(3).is_empty());
}

#[test]
fn spans_close_at_next_article_and_last_runs_to_document_end() {
    let text = "제1장 총칙\n제1조(목적) 이 법은 목적을 정한다.\n제2조(정의) 용어의 뜻은 다음과 같다.\n\
                제2장 보칙\n제3조(벌칙) 위반한 자는 처벌한다.\n";
    let pages = PageTable::from_texts(vec![text.to_string()]);

    let mut first = Chapter::new("제1장 총칙");
    first.sections = vec![article_with_titles(&["제1조(목적)", "제2조(정의)"])];
    let mut second = Chapter::new("제2장 보칙");
    second.sections = vec![article_with_titles(&["제3조(벌칙)"])];
    let mut chapters = vec![first, second];

    let report = span::resolve_spans(&mut chapters, &pages, 0).expect("spans");

    assert_eq!(report.spans.len(), 3);
    assert!(report.dropped.is_empty());
    assert_eq!(report.spans[0].end, text.find("제2조(정의)").expect("second"));
    assert_eq!(report.spans[1].end, text.find("제3조(벌칙)").expect("third"));
    assert_eq!(report.spans[2].end, text.len());
    assert!(report.spans.windows(2).all(|pair| pair[0].start < pair[1].start));
    assert!(report.spans.iter().all(|span| span.page == 1));

    let first_article = &chapters[0].sections[0].articles[0];
    assert_eq!(first_article.text, "제1조(목적) 이 법은 목적을 정한다.");
}

#[test]
fn dropped_article_leaves_neighbours_disjoint() {
    let text = "제1조(목적) 목적 본문.\n제2조[정의] 깨진 제목.\n제3조(위임) 위임 본문.\n";
    let pages = PageTable::from_texts(vec![text.to_string()]);
    let mut chapters = vec![Chapter::new(NO_CHAPTER)];
    chapters[0].sections = vec![article_with_titles(&["제1조(목적)", "제2조(정의)", "제3조(위임)"])];

    let report = span::resolve_spans(&mut chapters, &pages, 0).expect("spans");

    assert_eq!(report.dropped, vec!["제2조(정의)".to_string()]);
    assert_eq!(report.spans.len(), 2);
    assert_eq!(report.spans[0].end, report.spans[1].start);
    assert!(!chapters[0].sections[0].articles[1].is_resolved());
    assert_eq!(chapters[0].sections[0].articles[1].page, UNKNOWN_PAGE);
}

#[test]
fn duplicate_headings_in_different_sections_resolve_to_distinct_spans() {
    let text = "제1조(목적) 목적 본문.\n부칙 첫째 조항이다.\n부칙 둘째 조항이다.\n";
    let pages = PageTable::from_texts(vec![text.to_string()]);
    let mut chapters = vec![Chapter::new(NO_CHAPTER)];
    chapters[0].sections = vec![
        article_with_titles(&["제1조(목적)", "부칙"]),
        article_with_titles(&["부칙"]),
    ];

    let report = span::resolve_spans(&mut chapters, &pages, 0).expect("spans");

    assert_eq!(report.spans.len(), 3);
    assert_eq!(chapters[0].sections[0].articles[1].text, "부칙 첫째 조항이다.");
    assert_eq!(chapters[0].sections[1].articles[0].text, "부칙 둘째 조항이다.");
}

#[test]
fn page_for_offset_maps_bytes_to_pages() {
    let pages = PageTable::from_texts(vec!["가나\n".to_string(), "다라\n".to_string()]);

    assert_eq!(pages.page_for_offset(0), 1);
    assert_eq!(pages.page_for_offset("가나\n".len()), 2);
    assert_eq!(pages.page_for_offset(pages.text().len()), UNKNOWN_PAGE);
    assert_eq!(pages.first_page_containing("라"), Some(2));
    assert_eq!(pages.first_page_containing(""), None);
}

#[test]
fn windows_overlap_by_configured_amount() {
    let text = varied_text(3200);

    let windows = split_windows(&text, 1500, 200);

    assert_eq!(windows.len(), (3200usize - 200).div_ceil(1500 - 200));
    assert!(windows.iter().all(|window| window.chars().count() <= 1500));
    for pair in windows.windows(2) {
        let tail = pair[0].chars().skip(1300).collect::<String>();
        let head = pair[1].chars().take(200).collect::<String>();
        assert_eq!(tail, head);
    }
    assert_eq!(windows.last().map(|window| window.chars().count()), Some(600));
}

#[test]
fn short_text_stays_in_one_window() {
    assert_eq!(split_windows("짧은 조문", 1500, 200), vec!["짧은 조문"]);
}

#[test]
fn chunking_config_rejects_invalid_sizes() {
    assert!(ChunkingConfig::new(0, 1500, 200).is_err());
    assert!(ChunkingConfig::new(1500, 0, 0).is_err());
    assert!(ChunkingConfig::new(1500, 1500, 1500).is_err());
    assert_eq!(
        ChunkingConfig::new(1500, 1500, 200).expect("valid"),
        ChunkingConfig::default()
    );
}

#[test]
fn breadcrumb_omits_sentinels_and_empty_parts() {
    let article = Article::new("제1조(목적)");

    assert_eq!(
        breadcrumb(
            "개인정보 보호법",
            &Chapter::new(NO_CHAPTER),
            &Section::new(NO_SECTION),
            &article
        ),
        "[개인정보 보호법] [제1조(목적)]"
    );
    assert_eq!(
        breadcrumb(
            "개인정보 보호법",
            &Chapter::new("제1장 총칙"),
            &Section::new("제1절 통칙"),
            &article
        ),
        "[개인정보 보호법] [제1장 총칙] [제1절 통칙] [제1조(목적)]"
    );
    assert_eq!(
        breadcrumb(
            "",
            &Chapter::new(NO_CHAPTER),
            &Section::new(NO_SECTION),
            &Article::new("")
        ),
        ""
    );
}

#[test]
fn chunk_counters_are_consistent() {
    let long_body = varied_text(3200);
    let body = format!("제1조(목적) {long_body}\n제2조(정의) 용어의 뜻은 다음과 같다.\n");
    let heading_list = "제1조(목적)\n제2조(정의)\n";

    let processed = process(&[heading_list, body.as_str()]);
    let chunks = &processed.chunks;

    assert_eq!(processed.report.articles_resolved, 2);
    assert!(chunks.len() >= 4);
    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.i_chunk_on_doc, index + 1);
        assert_eq!(chunk.n_chunk_of_doc, chunks.len());
        assert_eq!(chunk.n_page, 2);

        let same_page = chunks
            .iter()
            .filter(|other| other.i_page == chunk.i_page)
            .count();
        assert_eq!(chunk.n_chunk_of_page, same_page);
        assert!(chunk.i_chunk_on_page >= 1 && chunk.i_chunk_on_page <= same_page);
        assert_eq!(chunk.n_char, chunk.text.chars().count());
    }
}

#[test]
fn chunks_carry_document_identity() {
    let processed = processor_with(Arc::new(FixedResolver("개인정보 보호법"))).process_pages(
        vec!["제1조(목적)\n".to_string(), "제1조(목적) 이 법은 목적을 정한다.\n".to_string()],
        "./pdfs/privacy.pdf",
    );

    assert_eq!(processed.title, "개인정보 보호법");
    let chunk = &processed.chunks[0];
    assert_eq!(chunk.name, "개인정보보호법제1조(목적)");
    assert_eq!(chunk.file_path, "/pdfs/privacy.pdf");
    assert_eq!(chunk.file_name, "privacy.pdf");
    assert_eq!(
        chunk.text,
        "[개인정보 보호법] [제1조(목적)] 제1조(목적) 이 법은 목적을 정한다."
    );
    assert_eq!(chunk.n_word, chunk.text.split_whitespace().count());
}

#[test]
fn processing_is_idempotent_apart_from_timestamps() {
    let pages = [
        "제1장 총칙\n제1조(목적)\n제2조(정의)\n",
        "제1조(목적) 이 법은 목적을 정한다.\n제2조(정의) 용어의 뜻은 다음과 같다.\n",
    ];

    let strip = |processed: ProcessedDocument| {
        processed
            .chunks
            .into_iter()
            .map(|mut chunk| {
                chunk.reg_date.clear();
                chunk
            })
            .collect::<Vec<Chunk>>()
    };

    assert_eq!(strip(process(&pages)), strip(process(&pages)));
}

#[test]
fn slow_title_resolver_times_out_without_losing_chunks() {
    let pages = vec![
        "제1조(목적)\n제2조(정의)\n".to_string(),
        "제1조(목적) 이 법은 목적을 정한다.\n제2조(정의) 용어의 뜻은 다음과 같다.\n".to_string(),
    ];
    let config = ProcessorConfig {
        title_timeout: Duration::from_millis(50),
        ..ProcessorConfig::default()
    };

    let slow = DocumentProcessor::new(config, Arc::new(SlowResolver))
        .expect("processor")
        .process_pages(pages.clone(), "pdfs/law.pdf");
    let baseline = processor_with(Arc::new(NoTitleResolver)).process_pages(pages, "pdfs/law.pdf");

    assert_eq!(slow.title, "");
    assert_eq!(slow.chunks.len(), baseline.chunks.len());
    assert_eq!(slow.chunks[0].name, "제1조(목적)");
    assert!(slow.chunks[0].text.starts_with("[제1조(목적)] "));
}

#[test]
fn failing_title_resolver_yields_empty_title() {
    let title = title::resolve_title(
        Arc::new(FailingResolver),
        "미리보기".to_string(),
        Duration::from_secs(1),
    );
    assert_eq!(title, "");

    let title = title::resolve_title(
        Arc::new(FixedResolver("\n  개인정보 보호법  \n부가 설명\n")),
        "미리보기".to_string(),
        Duration::from_secs(1),
    );
    assert_eq!(title, "개인정보 보호법");
}

#[test]
fn heading_title_resolver_skips_notes_and_headings() {
    let resolver = HeadingTitleResolver::new().expect("resolver");

    let preview = title::title_preview(
        "[시행 2024. 3. 15.] [법률 제19234호]\n1\n개인정보 보호법\n제1장 총칙\n",
    );
    assert_eq!(resolver.resolve(&preview).expect("title"), "개인정보 보호법");

    let only_headings = title::title_preview("제1장 총칙\n제1조(목적)\n");
    assert_eq!(resolver.resolve(&only_headings).expect("title"), "");
}

#[test]
fn title_preview_is_bounded() {
    let preview = title::title_preview(&varied_text(500));
    assert_eq!(preview.chars().count(), title::TITLE_PREVIEW_CHARS + 3);
    assert!(preview.ends_with("..."));
}

#[test]
fn first_matching_page_wins_for_shared_prefix() {
    let line = "제1조(목적) 이 법은 공통 문구로 시작한다.\n";

    let processed = process(&[line, line]);

    assert!(processed.report.heading_divider_found);
    assert_eq!(processed.chunks.len(), 1);
    assert_eq!(processed.chunks[0].i_page, 1);
}

#[test]
fn probe_miss_falls_back_to_span_page() {
    let processed = process(&["제1조(목적)\n", "제1조(목적) 가나", "다라 끝\n"]);

    assert_eq!(processed.chunks.len(), 1);
    assert_eq!(processed.chunks[0].i_page, 2);
}

#[test]
fn missing_body_heading_is_reported_as_dropped() {
    let processed = process(&[
        "제1조(목적)\n제2조(정의)\n",
        "제1조(목적) 본문이다.\n제2조[정의] 깨진 본문이다.\n",
    ]);

    assert_eq!(processed.report.article_count, 2);
    assert_eq!(processed.report.articles_resolved, 1);
    assert_eq!(processed.report.articles_dropped, vec!["제2조(정의)".to_string()]);
    assert_eq!(processed.chunks.len(), 1);
}

#[test]
fn document_without_articles_becomes_one_chunk() {
    let processed = process(&["  별표 1\n서식 내용\n", "붙임 자료\n"]);

    assert!(processed.report.whole_document_fallback);
    assert_eq!(processed.report.articles_resolved, 1);
    assert_eq!(processed.chunks.len(), 1);
    let chunk = &processed.chunks[0];
    assert_eq!(chunk.text, "별표 1\n서식 내용\n붙임 자료");
    assert_eq!(chunk.i_page, 1);
    assert_eq!(chunk.name, "");
}

#[test]
fn empty_document_yields_no_chunks() {
    let processed = process(&["", "  \n"]);

    assert!(processed.report.whole_document_fallback);
    assert!(processed.chunks.is_empty());
}

fn resolve_with_late_boundary(chapters: &mut [Chapter], text: &str) -> span::SpanReport {
    let pages = PageTable::from_texts(vec![text.to_string()]);
    span::resolve_spans(chapters, &pages, 0).expect("spans")
}

#[test]
fn span_ends_at_next_section_when_it_precedes_next_article() {
    let text = "제1조(목적) 목적 본문.\n제3조(위임) 위임 본문.\n제2조(정의) 정의 본문.\n";
    let mut opening = Section::new("제1절 통칙");
    opening.articles = vec![Article::new("제1조(목적)"), Article::new("제2조(정의)")];
    let mut closing = Section::new("제2절 보칙");
    closing.articles = vec![Article::new("제3조(위임)")];
    let mut chapter = Chapter::new("제1장 총칙");
    chapter.sections = vec![opening, closing];
    let mut chapters = vec![chapter];

    let report = resolve_with_late_boundary(&mut chapters, text);

    assert_eq!(report.dropped, vec!["제3조(위임)".to_string()]);
    assert_eq!(report.spans.len(), 2);
    assert_eq!(report.spans[0].end, text.find("제3조(위임)").expect("section boundary"));
    assert_eq!(chapters[0].sections[0].articles[0].text, "제1조(목적) 목적 본문.");
}

#[test]
fn span_ends_at_next_chapter_when_it_precedes_next_article() {
    let text = "제1조(목적) 목적 본문.\n제3조(벌칙) 벌칙 본문.\n제2조(정의) 정의 본문.\n";
    let mut first = Chapter::new("제1장 총칙");
    first.sections = vec![article_with_titles(&["제1조(목적)", "제2조(정의)"])];
    let mut second = Chapter::new("제2장 벌칙");
    second.sections = vec![article_with_titles(&["제3조(벌칙)"])];
    let mut chapters = vec![first, second];

    let report = resolve_with_late_boundary(&mut chapters, text);

    assert_eq!(report.spans.len(), 2);
    assert_eq!(report.spans[0].end, text.find("제3조(벌칙)").expect("chapter boundary"));
    assert_eq!(report.spans[1].start, text.find("제2조(정의)").expect("second"));
    assert_eq!(report.spans[1].end, text.len());
}

#[test]
fn command_title_resolver_reads_first_output() {
    let resolver = CommandTitleResolver::new(
        "sh",
        vec![
            "-c".to_string(),
            "cat > /dev/null; echo 개인정보 보호법".to_string(),
        ],
        Duration::from_secs(5),
    );

    assert_eq!(resolver.resolve("미리보기").expect("title"), "개인정보 보호법");
}

#[cfg(target_os = "linux")]
#[test]
fn command_title_resolver_kills_program_after_deadline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pid_path = dir.path().join("title.pid");
    let resolver = CommandTitleResolver::new(
        "sh",
        vec![
            "-c".to_string(),
            "echo $$ > \"$0\"; exec sleep 5".to_string(),
            pid_path.display().to_string(),
        ],
        Duration::from_millis(500),
    );

    let started = Instant::now();
    let err = resolver.resolve("미리보기").expect_err("deadline exceeded");

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(err.to_string().contains("timed out"));
    let pid = fs::read_to_string(&pid_path).expect("pid file");
    assert!(!Path::new("/proc").join(pid.trim()).exists());
}
