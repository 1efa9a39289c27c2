use super::*;

#[derive(Debug)]
pub(super) struct DocumentOutcome {
    pub(super) entry: PdfEntry,
    pub(super) result: Result<ProcessedDocument>,
}

pub(super) fn select_targets(pdfs: &[PdfEntry], target_files: &[String]) -> Vec<PdfEntry> {
    let target_set: HashSet<&str> = target_files.iter().map(String::as_str).collect();

    pdfs.iter()
        .filter(|pdf| target_set.is_empty() || target_set.contains(pdf.filename.as_str()))
        .cloned()
        .collect()
}

pub(super) fn process_documents(
    source_dir: &Path,
    pdfs: &[PdfEntry],
    setup: &ProcessingSetup,
    jobs: usize,
) -> Vec<DocumentOutcome> {
    let workers = jobs.clamp(1, pdfs.len().max(1));
    let next = AtomicUsize::new(0);
    let mut results: Vec<Option<Result<ProcessedDocument>>> =
        (0..pdfs.len()).map(|_| None).collect();

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(scope.spawn(|| {
                let mut done = Vec::new();
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(pdf) = pdfs.get(index) else {
                        break;
                    };
                    done.push((index, process_document(source_dir, pdf, setup)));
                }
                done
            }));
        }

        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (index, result) in done {
                        results[index] = Some(result);
                    }
                }
                Err(_) => warn!("document worker panicked"),
            }
        }
    });

    pdfs.iter()
        .cloned()
        .zip(results)
        .map(|(entry, result)| {
            let result = result.unwrap_or_else(|| {
                Err(anyhow!(
                    "document worker stopped before processing {}",
                    entry.filename
                ))
            });
            DocumentOutcome { entry, result }
        })
        .collect()
}

fn process_document(
    source_dir: &Path,
    pdf: &PdfEntry,
    setup: &ProcessingSetup,
) -> Result<ProcessedDocument> {
    let pdf_path = source_dir.join(&pdf.filename);
    if !pdf_path.exists() {
        return Err(anyhow!("missing source PDF: {}", pdf_path.display()));
    }

    let processor = setup.processor()?;
    processor.process_file(&setup.source, &pdf_path)
}

pub(super) fn store_outcomes(
    connection: &mut Connection,
    source_dir: &Path,
    outcomes: Vec<DocumentOutcome>,
    counts: &mut IngestCounts,
    warnings: &mut Vec<String>,
) -> Result<Vec<DocumentIngestEntry>> {
    let ingested_at = now_utc_string();
    let mut entries = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        let processed = match outcome.result {
            Ok(processed) => processed,
            Err(err) => {
                let warning = format!("skipped {}: {err:#}", outcome.entry.filename);
                warn!(warning = %warning, "pdf processing warning");
                warnings.push(warning);
                counts.failed_pdf_count += 1;
                entries.push(failed_entry(&outcome.entry, &err));
                continue;
            }
        };

        let record = DocumentRecord {
            file_name: outcome.entry.filename.clone(),
            file_path: source_dir
                .join(&outcome.entry.filename)
                .display()
                .to_string(),
            sha256: outcome.entry.sha256.clone(),
            title: processed.title.clone(),
            n_page: processed.report.page_count,
        };
        let inserted =
            match replace_document_chunks(connection, &record, &processed.chunks, &ingested_at) {
                Ok(inserted) => inserted,
                Err(err) => {
                    let warning = format!("failed to store {}: {err:#}", outcome.entry.filename);
                    warn!(warning = %warning, "chunk store warning");
                    warnings.push(warning);
                    counts.failed_pdf_count += 1;
                    entries.push(failed_entry(&outcome.entry, &err));
                    continue;
                }
            };

        for article in &processed.report.articles_dropped {
            warnings.push(format!(
                "{}: article heading {article} not found in body; no chunk emitted",
                outcome.entry.filename
            ));
        }

        counts.processed_pdf_count += 1;
        counts.chunks_inserted += inserted;
        counts.articles_found += processed.report.article_count;
        counts.articles_resolved += processed.report.articles_resolved;
        counts.articles_dropped += processed.report.articles_dropped.len();
        if processed.report.whole_document_fallback {
            counts.whole_document_fallbacks += 1;
        }
        if processed.title.is_empty() {
            counts.untitled_documents += 1;
        }

        info!(
            file = %outcome.entry.filename,
            chunks = inserted,
            "stored document chunks"
        );
        entries.push(processed_entry(&outcome.entry, processed));
    }

    Ok(entries)
}
