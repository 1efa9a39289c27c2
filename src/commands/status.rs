use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::{default_db_path, inventory};
use crate::model::PdfInventoryManifest;
use crate::store::{count_rows, document_summaries, open_store};

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = inventory::default_inventory_path(&args.cache_root);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: PdfInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            pdf_count = inventory.pdf_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if !db_path.exists() {
        warn!(path = %db_path.display(), "chunk store missing");
        return Ok(());
    }

    let connection = open_store(&db_path)?;
    let docs_count = count_rows(&connection, "SELECT COUNT(*) FROM docs")?;
    let chunks_count = count_rows(&connection, "SELECT COUNT(*) FROM chunks")?;

    info!(
        path = %db_path.display(),
        docs = docs_count,
        chunks = chunks_count,
        "chunk store status"
    );

    for summary in document_summaries(&connection)? {
        info!(
            file = %summary.file_name,
            title = %summary.title,
            pages = summary.n_page,
            chunks = summary.n_chunk,
            ingested_at = %summary.ingested_at,
            "stored document"
        );
    }

    Ok(())
}
