//! blockscan - incremental block structure scanning
//!
//! This crate recovers the nesting of classes, methods, loops and
//! conditionals from raw source text, in the background, for editor
//! structure visualizations.

pub mod block;
pub mod buffer;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod fs_watcher;
pub mod report;
pub mod scan;
pub mod syntax;
pub mod tagger;
pub mod tracing;
pub mod util;

// Re-export commonly used types
pub use block::{BlockId, BlockKind, BlockNode, BlockTree};
pub use buffer::{SnapshotSpan, Span, TextBuffer, TextSnapshot};
pub use config::ScanConfig;
pub use syntax::{parser_for, BlockParser, LanguageId};
pub use tagger::{BlockTag, BlockTagger, BlocksChanged, TaggerRegistry};
