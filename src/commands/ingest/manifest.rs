use super::*;

pub(super) fn load_or_refresh_inventory(
    source_dir: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<PdfInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(source_dir)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            pdf_count = manifest.pdf_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let raw = fs::read(inventory_manifest_path)
        .with_context(|| format!("failed to read {}", inventory_manifest_path.display()))?;
    let manifest: PdfInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", inventory_manifest_path.display()))?;

    info!(
        path = %inventory_manifest_path.display(),
        pdf_count = manifest.pdf_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

pub(super) fn collect_tool_versions() -> ToolVersions {
    ToolVersions {
        lawchunk: env!("CARGO_PKG_VERSION").to_string(),
        pdftotext: pdftotext_version(),
    }
}

pub(super) fn processed_entry(pdf: &PdfEntry, processed: ProcessedDocument) -> DocumentIngestEntry {
    DocumentIngestEntry {
        filename: pdf.filename.clone(),
        status: "stored".to_string(),
        title: Some(processed.title),
        report: Some(processed.report),
        error: None,
    }
}

pub(super) fn failed_entry(pdf: &PdfEntry, error: &anyhow::Error) -> DocumentIngestEntry {
    DocumentIngestEntry {
        filename: pdf.filename.clone(),
        status: "skipped".to_string(),
        title: None,
        report: None,
        error: Some(format!("{error:#}")),
    }
}

pub(super) fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "lawchunk".to_string(),
        "ingest".to_string(),
        "--source-dir".to_string(),
        args.source_dir.display().to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.ingest_manifest_path {
        command.push("--ingest-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    for file in &args.target_files {
        command.push("--file".to_string());
        command.push(file.clone());
    }
    if args.jobs != 1 {
        command.push("--jobs".to_string());
        command.push(args.jobs.to_string());
    }
    command.extend(render_processing_flags(&args.processing));

    command.join(" ")
}
