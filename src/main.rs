//! `blockscan`: print the block structure of a source file

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use blockscan::buffer::TextBuffer;
use blockscan::cli::{CliArgs, OutputFormat};
use blockscan::config::ScanConfig;
use blockscan::fs_watcher::FileWatcher;
use blockscan::report::TreeReport;
use blockscan::syntax::{parser_for, LanguageId};
use blockscan::tagger::BlockTagger;
use blockscan::util::read_source_file;

/// How long to block on a scan before checking it is still alive
const SCAN_POLL: Duration = Duration::from_millis(500);
const WATCH_POLL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    blockscan::tracing::init();

    let args = CliArgs::parse();
    let config = match &args.config {
        Some(path) => ScanConfig::load_from(path)?,
        None => ScanConfig::load(),
    };

    let language = args
        .resolve_language(&config)
        .map_err(anyhow::Error::msg)?;
    let parser = parser_for(language, &config)
        .with_context(|| format!("no block parser for {}", language.display_name()))?;

    let text = read_source_file(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let mut buffer = TextBuffer::new(&text);
    let mut tagger = BlockTagger::new(parser, buffer.current_snapshot());
    let _events = tagger.subscribe();

    wait_for_tree(&mut tagger)?;
    print_tree(&tagger, language, &args)?;

    if !args.watch {
        return Ok(());
    }

    let watcher = FileWatcher::new(&args.file)
        .with_context(|| format!("failed to watch {}", args.file.display()))?;
    loop {
        if !watcher.wait_changed(WATCH_POLL) {
            continue;
        }

        let text = match read_source_file(&args.file) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping rescan of {}: {}", args.file.display(), e);
                continue;
            }
        };

        let event = buffer.replace_all(&text);
        tagger.on_text_changed(&event);
        if !tagger.is_scanning() {
            tracing::debug!("File touched without text changes");
            continue;
        }

        wait_for_tree(&mut tagger)?;
        println!();
        print_tree(&tagger, language, &args)?;
    }
}

fn wait_for_tree(tagger: &mut BlockTagger) -> Result<()> {
    while !tagger.wait_for_update(SCAN_POLL) {
        if !tagger.is_scanning() {
            bail!("block scan did not complete");
        }
    }
    Ok(())
}

fn print_tree(tagger: &BlockTagger, language: LanguageId, args: &CliArgs) -> Result<()> {
    let tree = tagger
        .current_tree()
        .context("no block tree available")?;
    let report = TreeReport::new(&tree, language, args.context);

    match args.format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
