//! Keyword-driven block classification
//!
//! Each language carries a [`KeywordTable`]: an ordered list of rules, the
//! parent kinds under which an otherwise unmatched block is a method, and a
//! fallback kind. Tables are plain data so the configuration file can replace
//! them.

use serde::{Deserialize, Serialize};

use crate::block::BlockKind;
use crate::util::{contains_word, starts_with_word};

/// Where a keyword has to appear in the statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPosition {
    /// Whole word anywhere
    #[default]
    Anywhere,
    /// Whole word at the very start
    Leading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub kind: BlockKind,
    #[serde(default)]
    pub position: MatchPosition,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(kind: BlockKind, position: MatchPosition, keywords: &[&str]) -> Self {
        Self {
            kind,
            position,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn matches(&self, statement: &str) -> bool {
        self.keywords.iter().any(|keyword| match self.position {
            MatchPosition::Anywhere => contains_word(statement, keyword),
            MatchPosition::Leading => starts_with_word(statement, keyword),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub rules: Vec<KeywordRule>,
    #[serde(default)]
    pub method_parents: Vec<BlockKind>,
    #[serde(default = "default_fallback")]
    pub fallback: BlockKind,
}

fn default_fallback() -> BlockKind {
    BlockKind::Unknown
}

impl KeywordTable {
    /// Kind of a block introduced by `statement` inside a `parent` block.
    /// First matching rule wins.
    pub fn classify(&self, parent: BlockKind, statement: &str) -> BlockKind {
        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(statement)) {
            return rule.kind;
        }
        if self.method_parents.contains(&parent) {
            BlockKind::Method
        } else {
            self.fallback
        }
    }

    pub fn csharp() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(BlockKind::Loop, MatchPosition::Anywhere, LOOPS),
                KeywordRule::new(BlockKind::Conditional, MatchPosition::Anywhere, CONDITIONALS),
                KeywordRule::new(
                    BlockKind::Class,
                    MatchPosition::Anywhere,
                    &["class", "struct", "interface"],
                ),
                KeywordRule::new(BlockKind::Namespace, MatchPosition::Anywhere, &["namespace"]),
            ],
            method_parents: vec![BlockKind::Class],
            fallback: BlockKind::Unknown,
        }
    }

    /// C and C++: free functions at file and namespace scope are methods too
    pub fn c_family() -> Self {
        Self {
            method_parents: vec![BlockKind::Class, BlockKind::Namespace, BlockKind::Root],
            ..Self::csharp()
        }
    }

    pub fn java() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(BlockKind::Loop, MatchPosition::Anywhere, LOOPS),
                KeywordRule::new(BlockKind::Conditional, MatchPosition::Anywhere, CONDITIONALS),
                KeywordRule::new(
                    BlockKind::Class,
                    MatchPosition::Anywhere,
                    &["class", "interface", "enum"],
                ),
            ],
            method_parents: vec![BlockKind::Class],
            fallback: BlockKind::Unknown,
        }
    }

    pub fn javascript() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(BlockKind::Loop, MatchPosition::Anywhere, LOOPS),
                KeywordRule::new(BlockKind::Conditional, MatchPosition::Anywhere, CONDITIONALS),
                KeywordRule::new(BlockKind::Class, MatchPosition::Anywhere, &["class", "interface"]),
            ],
            method_parents: vec![BlockKind::Class],
            fallback: BlockKind::Unknown,
        }
    }

    pub fn visual_basic() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(BlockKind::Loop, MatchPosition::Leading, &["For", "Do", "While"]),
                KeywordRule::new(
                    BlockKind::Conditional,
                    MatchPosition::Leading,
                    &["If", "Select", "ElseIf", "Else"],
                ),
                KeywordRule::new(
                    BlockKind::Class,
                    MatchPosition::Anywhere,
                    &["Module", "Class", "Interface", "Structure"],
                ),
                KeywordRule::new(BlockKind::Namespace, MatchPosition::Anywhere, &["Namespace"]),
                KeywordRule::new(
                    BlockKind::Method,
                    MatchPosition::Anywhere,
                    &["Sub", "Property", "Function"],
                ),
            ],
            method_parents: Vec::new(),
            fallback: BlockKind::Other,
        }
    }
}

const LOOPS: &[&str] = &["foreach", "for", "while", "do"];
const CONDITIONALS: &[&str] = &["if", "else", "switch"];
