//! Command-line argument parsing for `blockscan`

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::ScanConfig;
use crate::syntax::LanguageId;

/// Print the block structure of a source file
#[derive(Parser, Debug)]
#[command(
    name = "blockscan",
    version,
    about = "Print the block structure of a source file"
)]
pub struct CliArgs {
    /// Source file to scan
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Language override (csharp, c, cpp, java, javascript, visualbasic)
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<LanguageId>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Config file to use instead of ~/.config/blockscan/config.yaml
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep running and rescan whenever the file changes
    #[arg(short, long)]
    pub watch: bool,

    /// Include each block's tooltip context
    #[arg(long)]
    pub context: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl CliArgs {
    /// Language to scan the file as: explicit override, then configured
    /// extensions, then built-in detection
    pub fn resolve_language(&self, config: &ScanConfig) -> Result<LanguageId, String> {
        let language = self
            .language
            .unwrap_or_else(|| config.language_for_path(&self.file));
        if language == LanguageId::PlainText {
            return Err(format!(
                "cannot detect a block language for {} (use --language)",
                self.file.display()
            ));
        }
        Ok(language)
    }
}
