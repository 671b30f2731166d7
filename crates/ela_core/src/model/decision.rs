//! Link decision record and its ledger line format.
//!
//! # Responsibility
//! - Define the immutable decision record appended to the ledger.
//! - Parse ledger lines strictly into a well-formed record or an explicit
//!   malformed verdict.
//!
//! # Invariants
//! - A ledger line has exactly [`LEDGER_FIELD_COUNT`] tab-separated fields.
//! - Identifiers are positive.
//! - Timestamps use [`TIMESTAMP_FORMAT`] with second precision.

use crate::model::entity_type::EntityKey;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ledger identifier of a decision.
pub type DecisionId = u64;

pub const LEDGER_FIELD_COUNT: usize = 7;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FIELD_SEPARATOR: char = '\t';

/// Parse verdict for a ledger line that cannot be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    /// 1-based line number in the ledger file.
    pub line: usize,
    pub reason: String,
}

impl Display for MalformedRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed ledger record at line {}: {}", self.line, self.reason)
    }
}

impl Error for MalformedRecord {}

/// One recorded choice of link for an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDecision {
    pub id: DecisionId,
    pub timestamp: NaiveDateTime,
    pub document_id: String,
    pub text: String,
    pub category: String,
    /// Number of mentions the entity type had when the decision was made.
    pub mention_count: usize,
    /// Absolute URL, empty string or skip marker.
    pub link: String,
}

impl LinkDecision {
    /// Key of the entity type this decision targets.
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.document_id.as_str(), self.text.as_str())
    }

    /// Parses one ledger line (without or with its trailing newline).
    ///
    /// `line_number` is 1-based and only used for the malformed verdict.
    pub fn parse_record(line: &str, line_number: usize) -> Result<Self, MalformedRecord> {
        let malformed = |reason: String| MalformedRecord {
            line: line_number,
            reason,
        };

        let line = line.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let [id, timestamp, document_id, text, category, mention_count, link] = fields.as_slice() else {
            return Err(malformed(format!(
                "expected {LEDGER_FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        };

        let id = id
            .trim()
            .parse::<DecisionId>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| malformed(format!("invalid identifier `{id}`")))?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|err| malformed(format!("invalid timestamp `{timestamp}`: {err}")))?;
        let mention_count = mention_count
            .trim()
            .parse::<usize>()
            .map_err(|_| malformed(format!("invalid mention count `{mention_count}`")))?;
        if document_id.is_empty() || text.is_empty() {
            return Err(malformed("empty document id or entity text".to_string()));
        }

        Ok(Self {
            id,
            timestamp,
            document_id: document_id.to_string(),
            text: text.to_string(),
            category: category.to_string(),
            mention_count,
            link: link.to_string(),
        })
    }

    /// Serializes the decision as one ledger line, without trailing newline.
    pub fn to_record(&self) -> String {
        [
            self.id.to_string(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.document_id.clone(),
            self.text.clone(),
            self.category.clone(),
            self.mention_count.to_string(),
            self.link.clone(),
        ]
        .join("\t")
    }

    /// First text field that holds a field or line separator, as
    /// `(name, value)`. Such a record would not read back as written.
    pub fn unsafe_field(&self) -> Option<(&'static str, &str)> {
        [
            ("document_id", self.document_id.as_str()),
            ("text", self.text.as_str()),
            ("category", self.category.as_str()),
            ("link", self.link.as_str()),
        ]
        .into_iter()
        .find(|(_, value)| value.contains([FIELD_SEPARATOR, '\n', '\r']))
    }

    /// Fixed-width line for listings.
    pub fn as_pretty_line(&self) -> String {
        let document = self
            .document_id
            .rsplit_once('.')
            .map_or(self.document_id.as_str(), |(stem, _)| stem);
        let location = format!("{document}:{}", self.mention_count);
        format!(
            "{:>4} {:<30} {:<17}  -  {:<33}  ==>  {}",
            self.id, location, self.category, self.text, self.link
        )
    }
}

impl Display for LinkDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<LinkDecision {} {} '{}' '{}'>",
            self.id, self.document_id, self.text, self.link
        )
    }
}
