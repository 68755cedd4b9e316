//! Validation and loading of source files handed to the scanner
//!
//! Checks, in order:
//! - the path exists and is readable
//! - it is a file, not a directory
//! - it is under the size limit
//! - it does not look binary

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Maximum source size in bytes (50 MB)
pub const MAX_SOURCE_SIZE: u64 = 50 * 1024 * 1024;

/// Errors that can occur when loading a source file
#[derive(Debug, Clone)]
pub enum SourceFileError {
    /// File does not exist
    NotFound,
    /// Permission denied to read file
    PermissionDenied,
    /// Path is a directory, not a file
    IsDirectory,
    /// File appears to be binary (contains null bytes)
    BinaryFile,
    /// File exceeds size limit
    TooLarge { size_mb: f64 },
    /// Not valid UTF-8
    InvalidEncoding,
    /// Other I/O error
    IoError(String),
}

impl std::fmt::Display for SourceFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::IsDirectory => write!(f, "is a directory"),
            Self::BinaryFile => write!(f, "binary file"),
            Self::TooLarge { size_mb } => write!(
                f,
                "file too large ({:.1} MB, max {} MB)",
                size_mb,
                MAX_SOURCE_SIZE / (1024 * 1024)
            ),
            Self::InvalidEncoding => write!(f, "not valid UTF-8"),
            Self::IoError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SourceFileError {}

fn map_io_error(e: std::io::Error) -> SourceFileError {
    match e.kind() {
        std::io::ErrorKind::NotFound => SourceFileError::NotFound,
        std::io::ErrorKind::PermissionDenied => SourceFileError::PermissionDenied,
        std::io::ErrorKind::InvalidData => SourceFileError::InvalidEncoding,
        _ => SourceFileError::IoError(e.to_string()),
    }
}

/// Validate a path before reading it as source text
pub fn validate_source_file(path: &Path) -> Result<(), SourceFileError> {
    let metadata = fs::metadata(path).map_err(map_io_error)?;

    if metadata.is_dir() {
        return Err(SourceFileError::IsDirectory);
    }

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(SourceFileError::TooLarge {
            size_mb: metadata.len() as f64 / (1024.0 * 1024.0),
        });
    }

    if is_likely_binary(path) {
        return Err(SourceFileError::BinaryFile);
    }

    Ok(())
}

/// Check if a file is likely binary by scanning its first 8KB for null bytes.
///
/// Returns `false` on any read error (let the actual read fail with a better error).
pub fn is_likely_binary(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return false;
    };

    let mut buffer = [0u8; 8192];
    let Ok(bytes_read) = file.read(&mut buffer) else {
        return false;
    };

    buffer[..bytes_read].contains(&0)
}

/// Validate and read a source file
pub fn read_source_file(path: &Path) -> Result<String, SourceFileError> {
    validate_source_file(path)?;
    fs::read_to_string(path).map_err(map_io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_nonexistent_file() {
        let result = read_source_file(Path::new("/nonexistent/path/file.cs"));
        assert!(matches!(result, Err(SourceFileError::NotFound)));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_source_file(dir.path());
        assert!(matches!(result, Err(SourceFileError::IsDirectory)));
    }

    #[test]
    fn test_reads_text_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "class Foo {{ }}").unwrap();
        temp.flush().unwrap();

        let text = read_source_file(temp.path()).unwrap();
        assert_eq!(text, "class Foo { }\n");
    }

    #[test]
    fn test_binary_file_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"class\x00Foo").unwrap();
        temp.flush().unwrap();

        assert!(is_likely_binary(temp.path()));
        assert!(matches!(
            read_source_file(temp.path()),
            Err(SourceFileError::BinaryFile)
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"class \xff\xfe Foo").unwrap();
        temp.flush().unwrap();

        assert!(matches!(
            read_source_file(temp.path()),
            Err(SourceFileError::InvalidEncoding)
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(SourceFileError::NotFound.to_string(), "file not found");
        assert_eq!(
            SourceFileError::TooLarge { size_mb: 60.0 }.to_string(),
            "file too large (60.0 MB, max 50 MB)"
        );
    }
}
