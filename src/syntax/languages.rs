//! Language identification and detection
//!
//! Maps file extensions to language IDs and each language to the way its
//! block structure is recovered.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::filter::FilterOptions;
use super::keywords::KeywordTable;

/// Supported language identifiers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    #[default]
    PlainText,
    CSharp,
    C,
    Cpp,
    Java,
    JavaScript,
    VisualBasic,
}

/// How blocks are delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    Braces,
    Indentation,
}

/// Everything a parser needs to know about a language
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub language: LanguageId,
    pub structure: Structure,
    pub filter: FilterOptions,
    pub keywords: KeywordTable,
}

impl LanguageId {
    pub const ALL: [LanguageId; 7] = [
        LanguageId::PlainText,
        LanguageId::CSharp,
        LanguageId::C,
        LanguageId::Cpp,
        LanguageId::Java,
        LanguageId::JavaScript,
        LanguageId::VisualBasic,
    ];

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "cs" => LanguageId::CSharp,
            "c" | "h" => LanguageId::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" | "inl" => LanguageId::Cpp,
            "java" => LanguageId::Java,
            "js" | "mjs" | "cjs" => LanguageId::JavaScript,
            "vb" | "bas" | "vbs" => LanguageId::VisualBasic,
            _ => LanguageId::PlainText,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(LanguageId::PlainText)
    }

    /// Identifier used in configuration and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::PlainText => "plaintext",
            LanguageId::CSharp => "csharp",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
            LanguageId::Java => "java",
            LanguageId::JavaScript => "javascript",
            LanguageId::VisualBasic => "visualbasic",
        }
    }

    /// Get display name for the language
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageId::PlainText => "Plain Text",
            LanguageId::CSharp => "C#",
            LanguageId::C => "C",
            LanguageId::Cpp => "C++",
            LanguageId::Java => "Java",
            LanguageId::JavaScript => "JavaScript",
            LanguageId::VisualBasic => "Visual Basic",
        }
    }

    /// Built-in profile, None for plain text
    pub fn profile(&self) -> Option<LanguageProfile> {
        let c_options = FilterOptions {
            preprocessor: true,
            verbatim_strings: false,
        };
        let (structure, filter, keywords) = match self {
            LanguageId::PlainText => return None,
            LanguageId::CSharp => (
                Structure::Braces,
                FilterOptions {
                    preprocessor: true,
                    verbatim_strings: true,
                },
                KeywordTable::csharp(),
            ),
            LanguageId::C | LanguageId::Cpp => {
                (Structure::Braces, c_options, KeywordTable::c_family())
            }
            LanguageId::Java => (
                Structure::Braces,
                FilterOptions::default(),
                KeywordTable::java(),
            ),
            LanguageId::JavaScript => (
                Structure::Braces,
                FilterOptions::default(),
                KeywordTable::javascript(),
            ),
            LanguageId::VisualBasic => (
                Structure::Indentation,
                FilterOptions::default(),
                KeywordTable::visual_basic(),
            ),
        };
        Some(LanguageProfile {
            language: *self,
            structure,
            filter,
            keywords,
        })
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LanguageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "cs" | "c#" => return Ok(LanguageId::CSharp),
            "c++" => return Ok(LanguageId::Cpp),
            "js" => return Ok(LanguageId::JavaScript),
            "vb" => return Ok(LanguageId::VisualBasic),
            "text" | "txt" => return Ok(LanguageId::PlainText),
            _ => {}
        }
        LanguageId::ALL
            .into_iter()
            .find(|lang| lang.name() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = LanguageId::ALL.iter().map(|l| l.name()).collect();
                format!("unknown language '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
