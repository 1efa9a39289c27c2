use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{PdfEntry, PdfInventoryManifest};
use crate::util::{digest_file, file_name_string, now_utc_string, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_dir)?;

    if args.dry_run {
        info!(
            pdf_count = manifest.pdf_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_inventory_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(pdf_count = manifest.pdf_count, "inventory completed");

    Ok(())
}

pub fn default_inventory_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("pdf_inventory.json")
}

pub fn build_manifest(source_dir: &Path) -> Result<PdfInventoryManifest> {
    let mut pdf_paths = discover_pdfs(source_dir)?;
    pdf_paths.sort();

    if pdf_paths.is_empty() {
        bail!("no PDFs found in {}", source_dir.display());
    }

    let mut pdfs = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let filename = file_name_string(&path)?;
        let digest = digest_file(&path)?;

        pdfs.push(PdfEntry {
            filename,
            size_bytes: digest.size_bytes,
            sha256: digest.sha256,
        });
    }

    pdfs.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(PdfInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        pdf_count: pdfs.len(),
        pdfs,
    })
}

fn discover_pdfs(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            pdfs.push(path);
        }
    }

    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_manifest_lists_only_pdfs_sorted_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("시행령.pdf"), b"%PDF-1.4 b").expect("write");
        fs::write(dir.path().join("법률.PDF"), b"%PDF-1.4 a").expect("write");
        fs::write(dir.path().join("notes.txt"), b"skip").expect("write");
        fs::create_dir(dir.path().join("nested.pdf")).expect("mkdir");

        let manifest = build_manifest(dir.path()).expect("manifest");

        assert_eq!(manifest.pdf_count, 2);
        let names = manifest
            .pdfs
            .iter()
            .map(|entry| entry.filename.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(names, vec!["법률.PDF", "시행령.pdf"]);
        assert!(manifest.pdfs.iter().all(|entry| entry.size_bytes == 10));
    }

    #[test]
    fn build_manifest_fails_without_pdfs() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(build_manifest(dir.path()).is_err());
    }
}
