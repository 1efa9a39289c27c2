use anyhow::{Result, bail};
use tracing::info;

use crate::cli::ChunkArgs;
use crate::commands::processing::ProcessingSetup;
use crate::util::{print_json_pretty, write_json_pretty};

pub fn run(args: ChunkArgs) -> Result<()> {
    if !args.pdf.exists() {
        bail!("missing source PDF: {}", args.pdf.display());
    }

    let setup = ProcessingSetup::from_args(&args.processing)?;
    let processed = setup.processor()?.process_file(&setup.source, &args.pdf)?;

    info!(
        pdf = %args.pdf.display(),
        title = %processed.title,
        pages = processed.report.page_count,
        articles = processed.report.article_count,
        resolved = processed.report.articles_resolved,
        dropped = processed.report.articles_dropped.len(),
        whole_document = processed.report.whole_document_fallback,
        chunks = processed.chunks.len(),
        "chunked document"
    );

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &processed.chunks)?;
            info!(path = %path.display(), "wrote chunk file");
        }
        None => print_json_pretty(&processed.chunks)?,
    }

    Ok(())
}
