use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::{ProcessingArgs, TitleMode};
use crate::extract::{PageNormalization, PdftotextSource};
use crate::model::ProcessingSettings;
use crate::processor::{
    ChunkingConfig, CommandTitleResolver, DocumentProcessor, HeadingTitleResolver,
    NoTitleResolver, ProcessorConfig, TitleResolver,
};

pub struct ProcessingSetup {
    pub config: ProcessorConfig,
    pub title_resolver: Arc<dyn TitleResolver>,
    pub source: PdftotextSource,
    pub settings: ProcessingSettings,
}

impl ProcessingSetup {
    pub fn from_args(args: &ProcessingArgs) -> Result<Self> {
        let chunking =
            ChunkingConfig::new(args.max_chunk_chars, args.window_chars, args.overlap_chars)?;
        let config = ProcessorConfig {
            chunking,
            title_timeout: Duration::from_millis(args.title_timeout_ms),
        };

        let title_resolver: Arc<dyn TitleResolver> = match args.title_mode {
            TitleMode::Heading => Arc::new(HeadingTitleResolver::new()?),
            TitleMode::Command => {
                let program = args
                    .title_command
                    .clone()
                    .context("--title-mode command requires --title-command")?;
                Arc::new(CommandTitleResolver::new(
                    program,
                    args.title_args.clone(),
                    config.title_timeout,
                ))
            }
            TitleMode::Off => Arc::new(NoTitleResolver),
        };

        let normalization =
            PageNormalization::new(&args.boilerplate_pattern, !args.keep_repeated_edges)?;
        let source = PdftotextSource::new(normalization, args.max_pages_per_doc);

        let settings = ProcessingSettings {
            title_mode: args.title_mode.as_str().to_string(),
            title_timeout_ms: args.title_timeout_ms,
            max_chunk_chars: chunking.max_chunk_chars,
            window_chars: chunking.window_chars,
            overlap_chars: chunking.overlap_chars,
            boilerplate_pattern: args.boilerplate_pattern.clone(),
            strip_repeated_edges: !args.keep_repeated_edges,
        };

        Ok(Self {
            config,
            title_resolver,
            source,
            settings,
        })
    }

    pub fn processor(&self) -> Result<DocumentProcessor> {
        DocumentProcessor::new(self.config, Arc::clone(&self.title_resolver))
    }
}

pub fn render_processing_flags(args: &ProcessingArgs) -> Vec<String> {
    let mut flags = Vec::<String>::new();

    if args.title_mode != TitleMode::Heading {
        flags.push("--title-mode".to_string());
        flags.push(args.title_mode.as_str().to_string());
    }
    if let Some(program) = &args.title_command {
        flags.push("--title-command".to_string());
        flags.push(program.clone());
    }
    for arg in &args.title_args {
        flags.push("--title-arg".to_string());
        flags.push(arg.clone());
    }
    flags.push("--title-timeout-ms".to_string());
    flags.push(args.title_timeout_ms.to_string());
    flags.push("--max-chunk-chars".to_string());
    flags.push(args.max_chunk_chars.to_string());
    flags.push("--window-chars".to_string());
    flags.push(args.window_chars.to_string());
    flags.push("--overlap-chars".to_string());
    flags.push(args.overlap_chars.to_string());
    if args.keep_repeated_edges {
        flags.push("--keep-repeated-edges".to_string());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        flags.push("--max-pages-per-doc".to_string());
        flags.push(max_pages.to_string());
    }

    flags
}
