//! Session configuration.
//!
//! # Responsibility
//! - Carry every run-time setting the core needs in one explicit value.
//!
//! # Invariants
//! - The configuration is passed into the session at construction; the core
//!   keeps no process-wide mutable settings.

use crate::corpus::DEFAULT_SOURCE_NAME_LEN;
use crate::model::link::DEFAULT_LINK_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONTEXT_WIDTH: usize = 40;
pub const DEFAULT_CONTEXT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Directory with primary text files.
    pub sources_dir: PathBuf,
    /// Directory with one entity annotation file per document.
    pub annotations_dir: PathBuf,
    /// Ledger file; backups are written next to it.
    pub ledger_path: PathBuf,
    /// Characters of context shown on each side of a mention.
    pub context_width: usize,
    /// Maximum number of mentions shown in context per entity type.
    pub context_limit: usize,
    /// Template used to qualify link names, `{}` marks the name.
    pub link_template: String,
    /// File name length, extension included, of primary text files.
    pub source_name_len: usize,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            sources_dir: PathBuf::from("data/sources"),
            annotations_dir: PathBuf::from("data/annotations"),
            ledger_path: PathBuf::from("data/annotations.tab"),
            context_width: DEFAULT_CONTEXT_WIDTH,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            link_template: DEFAULT_LINK_TEMPLATE.to_string(),
            source_name_len: DEFAULT_SOURCE_NAME_LEN,
        }
    }
}
