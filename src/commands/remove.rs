use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::RemoveArgs;
use crate::commands::default_db_path;
use crate::store::{open_store, remove_document};

pub fn run(args: RemoveArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    if !db_path.exists() {
        bail!("chunk store missing: {}", db_path.display());
    }

    let mut connection = open_store(&db_path)?;
    let removed = remove_document(&mut connection, &args.file_name)?;

    if removed == 0 {
        warn!(file = %args.file_name, "no chunks stored for document");
    } else {
        info!(file = %args.file_name, chunks = removed, "removed document chunks");
    }

    Ok(())
}
