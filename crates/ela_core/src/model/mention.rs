//! Entity mention value object.
//!
//! # Responsibility
//! - Parse one span annotation line into an immutable mention record.
//!
//! # Invariants
//! - Only extent annotations (identifier starting with `T`) are accepted.
//! - `start <= end` for every parsed mention.
//! - Mention text never holds a tab.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// `identifier<TAB>category start end<TAB>text`
static EXTENT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(T\S*)\t(\S+) (\d+) (\d+)\t([^\t]+)$").expect("valid extent line regex")
});

/// Reasons an annotation line does not yield a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionParseError {
    /// Relation, note or other non-span annotation.
    NotAnExtent(String),
    /// Line does not follow the extent layout (includes fragmented spans).
    Malformed(String),
    /// End offset precedes start offset.
    InvertedSpan { start: usize, end: usize },
}

impl Display for MentionParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnExtent(line) => write!(f, "not an extent annotation: `{line}`"),
            Self::Malformed(line) => write!(f, "malformed annotation line: `{line}`"),
            Self::InvertedSpan { start, end } => {
                write!(f, "annotation span ends before it starts: {start}..{end}")
            }
        }
    }
}

impl Error for MentionParseError {}

/// One annotated character span in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    /// Annotation identifier, e.g. `T12`.
    pub identifier: String,
    pub document_id: String,
    /// Surface text of the span.
    pub text: String,
    /// Category tag such as `PERSON` or `LOCATION`.
    pub category: String,
    /// Character offset where the span starts.
    pub start: usize,
    /// Character offset one past the end of the span.
    pub end: usize,
}

impl EntityMention {
    /// Parses one annotation line for `document_id`.
    ///
    /// Surrounding whitespace is ignored, so the entity text never carries
    /// leading or trailing blanks.
    pub fn parse(document_id: &str, line: &str) -> Result<Self, MentionParseError> {
        let line = line.trim();
        if !line.starts_with('T') {
            return Err(MentionParseError::NotAnExtent(line.to_string()));
        }

        let caps = EXTENT_LINE_RE
            .captures(line)
            .ok_or_else(|| MentionParseError::Malformed(line.to_string()))?;
        let start = parse_offset(&caps[3], line)?;
        let end = parse_offset(&caps[4], line)?;
        if end < start {
            return Err(MentionParseError::InvertedSpan { start, end });
        }

        Ok(Self {
            identifier: caps[1].to_string(),
            document_id: document_id.to_string(),
            text: caps[5].to_string(),
            category: caps[2].to_string(),
            start,
            end,
        })
    }
}

fn parse_offset(value: &str, line: &str) -> Result<usize, MentionParseError> {
    value
        .parse::<usize>()
        .map_err(|_| MentionParseError::Malformed(line.to_string()))
}
