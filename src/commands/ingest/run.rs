use super::*;

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_inventory_path(&cache_root));
    let ingest_manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| crate::commands::default_db_path(&cache_root));

    info!(
        source_dir = %args.source_dir.display(),
        run_id = %run_id,
        jobs = args.jobs,
        "starting ingest"
    );

    let setup = ProcessingSetup::from_args(&args.processing)?;
    let inventory = load_or_refresh_inventory(
        &args.source_dir,
        &inventory_manifest_path,
        args.refresh_inventory,
    )?;
    let targets = select_targets(&inventory.pdfs, &args.target_files);
    if targets.is_empty() {
        warn!(
            requested = args.target_files.len(),
            "no inventory entries match the requested files"
        );
    }

    let mut connection = open_store(&db_path)?;

    let outcomes = process_documents(&args.source_dir, &targets, &setup, args.jobs);

    let mut counts = IngestCounts {
        pdf_count: inventory.pdf_count,
        ..IngestCounts::default()
    };
    let mut warnings = Vec::<String>::new();
    let documents = store_outcomes(
        &mut connection,
        &args.source_dir,
        outcomes,
        &mut counts,
        &mut warnings,
    )?;

    counts.docs_total = count_rows(&connection, "SELECT COUNT(*) FROM docs")?;
    counts.chunks_total = count_rows(&connection, "SELECT COUNT(*) FROM chunks")?;
    let updated_at = now_utc_string();

    let status = if counts.failed_pdf_count == 0 {
        "completed"
    } else {
        "completed_with_warnings"
    };

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        store_schema_version: STORE_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        started_at,
        updated_at,
        command: render_ingest_command(&args),
        tool_versions: collect_tool_versions(),
        paths: IngestPaths {
            source_dir: args.source_dir.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        settings: setup.settings.clone(),
        counts: counts.clone(),
        documents,
        source_hashes: targets,
        warnings,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;

    info!(path = %ingest_manifest_path.display(), "wrote ingest run manifest");
    info!(
        processed = counts.processed_pdf_count,
        failed = counts.failed_pdf_count,
        docs = counts.docs_total,
        chunks = counts.chunks_total,
        dropped_articles = counts.articles_dropped,
        "ingest completed"
    );

    Ok(())
}
