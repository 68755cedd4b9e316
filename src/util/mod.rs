//! Utility modules

pub mod file_validation;
pub mod text;

pub use file_validation::{read_source_file, SourceFileError, MAX_SOURCE_SIZE};
pub use text::{compress_whitespace, contains_word, starts_with_word, DEFAULT_TAB_SIZE};
