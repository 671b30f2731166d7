//! Corpus of annotated documents.
//!
//! # Responsibility
//! - Load primary sources and entity annotations from two directories.
//! - Select the next unlinked entity type deterministically.
//! - Aggregate completion statistics and look up entity types by key.
//!
//! # Invariants
//! - Traversal order is ascending document id, then first-mention order
//!   inside each document.
//! - Load-time IO failures are fatal; there is nothing to annotate without
//!   the corpus.

mod document;

pub use document::{Document, DocumentStatus, MentionContext, SourceDocument};

use crate::model::entity_type::{EntityKey, EntityType};
use document::percent;
use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Length of primary-text file names, extension included, that the loader
/// accepts (`cpb-aacip-507-0000000000-transcript.txt`).
pub const DEFAULT_SOURCE_NAME_LEN: usize = 39;

pub type CorpusResult<T> = Result<T, CorpusError>;

#[derive(Debug)]
pub enum CorpusError {
    Io { path: PathBuf, source: io::Error },
    NotFound(EntityKey),
}

impl Display for CorpusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read corpus path `{}`: {source}", path.display())
            }
            Self::NotFound(key) => write!(f, "entity not found: {key}"),
        }
    }
}

impl Error for CorpusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NotFound(_) => None,
        }
    }
}

/// Aggregate completion figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStatus {
    pub total_types: usize,
    pub total_mentions: usize,
    /// Canonical, type-weighted completion in percent.
    pub percent_done: f64,
    /// Secondary, mention-weighted completion in percent.
    pub percent_done_mentions: f64,
    pub documents: Vec<DocumentStatus>,
}

/// All documents keyed by document id.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: BTreeMap<String, Document>,
}

impl Corpus {
    /// Loads all sources from `sources_dir` and all annotation files from
    /// `annotations_dir`.
    ///
    /// Only source files whose name is exactly `source_name_len` characters
    /// long are read. An annotation file is paired with the source that has
    /// the same name once extensions are stripped. The annotation file name
    /// becomes the document id.
    ///
    /// # Errors
    /// - Returns `CorpusError::Io` when a directory or file cannot be read.
    pub fn load(
        sources_dir: impl AsRef<Path>,
        annotations_dir: impl AsRef<Path>,
        source_name_len: usize,
    ) -> CorpusResult<Self> {
        let sources = read_sources(sources_dir.as_ref(), source_name_len)?;
        let mut documents = Vec::new();

        for path in sorted_files(annotations_dir.as_ref())? {
            let Some(file_name) = path.file_name().map(|name| name.to_string_lossy().into_owned())
            else {
                continue;
            };
            let annotations = read_file(&path)?;
            let text = match sources.get(&file_stem(&file_name)) {
                Some(text) => text.clone(),
                None => {
                    warn!(
                        "event=source_missing module=corpus status=skip document={}",
                        file_name
                    );
                    String::new()
                }
            };
            documents.push(Document::from_annotations(file_name, text, &annotations));
        }

        let corpus = Self::from_documents(documents);
        info!(
            "event=corpus_load module=corpus status=ok documents={} sources={} types={}",
            corpus.documents.len(),
            sources.len(),
            corpus.type_count()
        );
        Ok(corpus)
    }

    /// Builds a corpus from already constructed documents.
    ///
    /// A later document with the same id replaces an earlier one.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let documents = documents
            .into_iter()
            .map(|document| (document.id().to_string(), document))
            .collect();
        Self { documents }
    }

    /// Documents in ascending id order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn document_ids(&self) -> Vec<&str> {
        self.documents.keys().map(String::as_str).collect()
    }

    pub fn document(&self, document_id: &str) -> Option<&Document> {
        self.documents.get(document_id)
    }

    pub fn type_count(&self) -> usize {
        self.documents
            .values()
            .map(|document| document.entity_types().len())
            .sum()
    }

    /// First entity type without a link, or `None` when everything is
    /// annotated.
    pub fn next(&self) -> Option<&EntityType> {
        self.documents
            .values()
            .flat_map(|document| document.entity_types())
            .find(|entity| !entity.is_linked())
    }

    /// Looks up the entity type for `text` in `document_id`.
    pub fn get_entity(&self, text: &str, document_id: &str) -> CorpusResult<&EntityType> {
        self.documents
            .get(document_id)
            .and_then(|document| document.entity_type(text))
            .ok_or_else(|| CorpusError::NotFound(EntityKey::new(document_id, text)))
    }

    /// Contexts for an entity type taken from its own document.
    pub fn contexts(
        &self,
        entity_type: &EntityType,
        width: usize,
        limit: usize,
    ) -> Vec<MentionContext> {
        self.documents
            .get(entity_type.document_id())
            .map(|document| document.contexts(entity_type, width, limit))
            .unwrap_or_default()
    }

    pub fn status(&self) -> CorpusStatus {
        let documents: Vec<DocumentStatus> =
            self.documents.values().map(Document::status).collect();
        let total_types = documents.iter().map(|status| status.types).sum();
        let total_mentions = documents.iter().map(|status| status.mentions).sum();
        let linked_types = documents.iter().map(|status| status.linked_types).sum();
        let linked_mentions = documents.iter().map(|status| status.linked_mentions).sum();

        CorpusStatus {
            total_types,
            total_mentions,
            percent_done: percent(linked_types, total_types),
            percent_done_mentions: percent(linked_mentions, total_mentions),
            documents,
        }
    }

    pub(crate) fn entity_type_mut(&mut self, key: &EntityKey) -> Option<&mut EntityType> {
        self.documents
            .get_mut(&key.document_id)?
            .entity_type_mut(&key.text)
    }

    /// Drops every materialized link so the ledger can be folded again.
    pub(crate) fn clear_links(&mut self) {
        for document in self.documents.values_mut() {
            for entity in document.entity_types_mut() {
                entity.set_link(None);
            }
        }
    }
}

fn read_sources(dir: &Path, source_name_len: usize) -> CorpusResult<HashMap<String, String>> {
    let mut sources = HashMap::new();
    for path in sorted_files(dir)? {
        let Some(file_name) = path.file_name().map(|name| name.to_string_lossy().into_owned())
        else {
            continue;
        };
        if file_name.chars().count() != source_name_len {
            continue;
        }
        sources.insert(file_stem(&file_name), read_file(&path)?);
    }
    Ok(sources)
}

fn sorted_files(dir: &Path) -> CorpusResult<Vec<PathBuf>> {
    let io_error = |source| CorpusError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_file(path: &Path) -> CorpusResult<String> {
    fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn file_stem(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
        .to_string()
}
