use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::extract::DEFAULT_BOILERPLATE_PATTERN;

#[derive(Parser, Debug)]
#[command(
    name = "lawchunk",
    version,
    about = "Structural parsing and chunking of Korean legal PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Ingest(IngestArgs),
    Chunk(ChunkArgs),
    Status(StatusArgs),
    Remove(RemoveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "pdfs")]
    pub source_dir: PathBuf,

    #[arg(long, default_value = ".cache/lawchunk")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TitleMode {
    Heading,
    Command,
    Off,
}

impl TitleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Command => "command",
            Self::Off => "off",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProcessingArgs {
    #[arg(long, value_enum, default_value_t = TitleMode::Heading)]
    pub title_mode: TitleMode,

    #[arg(long)]
    pub title_command: Option<String>,

    #[arg(long = "title-arg", allow_hyphen_values = true)]
    pub title_args: Vec<String>,

    #[arg(long, default_value_t = 10_000)]
    pub title_timeout_ms: u64,

    #[arg(long, default_value_t = 1500)]
    pub max_chunk_chars: usize,

    #[arg(long, default_value_t = 1500)]
    pub window_chars: usize,

    #[arg(long, default_value_t = 200)]
    pub overlap_chars: usize,

    #[arg(long, default_value = DEFAULT_BOILERPLATE_PATTERN)]
    pub boilerplate_pattern: String,

    #[arg(long, default_value_t = false)]
    pub keep_repeated_edges: bool,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = "pdfs")]
    pub source_dir: PathBuf,

    #[arg(long, default_value = ".cache/lawchunk")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    #[arg(long = "file")]
    pub target_files: Vec<String>,

    #[arg(long, default_value_t = 1)]
    pub jobs: usize,

    #[command(flatten)]
    pub processing: ProcessingArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub processing: ProcessingArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/lawchunk")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    #[arg(long, default_value = ".cache/lawchunk")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub file_name: String,
}
