pub mod chunk;
pub mod ingest;
pub mod inventory;
mod processing;
pub mod remove;
pub mod status;

fn default_db_path(cache_root: &std::path::Path) -> std::path::PathBuf {
    cache_root.join("lawchunk.sqlite")
}
