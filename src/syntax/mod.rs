//! Block structure scanners
//!
//! Lightweight lexical scanning, no grammars:
//! - [`filter`] hides comments, directives and string contents
//! - [`statement`] finds statement boundaries in brace languages
//! - [`brace`] and [`indent`] build the block tree
//! - [`keywords`] classifies each block from its introducing statement
//!
//! ## Architecture
//!
//! ```text
//! TextSnapshot → QuoteFilter → StatementScanner → BraceParser ─┐
//!             → BasicFilter ─────────────────────→ IndentParser ┴→ BlockTree
//! ```

pub mod brace;
pub mod filter;
pub mod indent;
pub mod keywords;
mod languages;
mod parser;
pub mod statement;

pub use brace::BraceParser;
pub use filter::{BasicFilter, FilterOptions, QuoteFilter, Scanned};
pub use indent::IndentParser;
pub use keywords::{KeywordRule, KeywordTable, MatchPosition};
pub use languages::{LanguageId, LanguageProfile, Structure};
pub use parser::{parser_for, BlockParser};
pub use statement::{StatementAccumulator, StatementScanner};
