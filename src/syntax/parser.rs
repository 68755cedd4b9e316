//! Parser selection

use std::sync::Arc;

use super::brace::BraceParser;
use super::indent::IndentParser;
use super::languages::{LanguageId, Structure};
use crate::block::BlockTree;
use crate::buffer::TextSnapshot;
use crate::config::ScanConfig;

/// Builds the block tree of a snapshot.
///
/// `abort` is polled before every character; once it returns true the parse
/// stops and returns `None`, and no partial tree escapes.
pub trait BlockParser: Send + Sync {
    fn parse(&self, snapshot: &TextSnapshot, abort: &dyn Fn() -> bool) -> Option<BlockTree>;
}

/// Parser for `language`, with keyword tables and tab size taken from
/// `config`. Plain text has no parser.
pub fn parser_for(language: LanguageId, config: &ScanConfig) -> Option<Arc<dyn BlockParser>> {
    let mut profile = language.profile()?;
    if let Some(table) = config.keywords.get(&language) {
        tracing::debug!("Using configured keyword table for {}", language);
        profile.keywords = table.clone();
    }

    let parser: Arc<dyn BlockParser> = match profile.structure {
        Structure::Braces => Arc::new(BraceParser::new(profile.keywords, profile.filter)),
        Structure::Indentation => Arc::new(IndentParser::new(profile.keywords, config.tab_size)),
    };
    Some(parser)
}
