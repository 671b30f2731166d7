//! Document container: one source text plus its entity types.
//!
//! # Responsibility
//! - Group the mentions of one annotation file into entity types.
//! - Derive left/right context windows from mention offsets.
//! - Report per-document completion figures.
//!
//! # Invariants
//! - Entity types keep the order in which their first mention was read.
//! - Context windows clip to the document bounds and never fail.

use crate::model::entity_type::EntityType;
use crate::model::mention::{EntityMention, MentionParseError};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Primary text of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    id: String,
    text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One mention shown between its left and right context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionContext {
    pub left: String,
    pub text: String,
    pub right: String,
}

impl MentionContext {
    /// Left context padded with spaces so that columns align at `width`.
    pub fn left_padded(&self, width: usize) -> String {
        format!("{:>width$}", self.left)
    }
}

/// Completion figures for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStatus {
    pub document_id: String,
    pub types: usize,
    pub mentions: usize,
    pub linked_types: usize,
    pub linked_mentions: usize,
    /// Canonical, type-weighted completion in percent.
    pub percent_done: f64,
    /// Secondary, mention-weighted completion in percent.
    pub percent_done_mentions: f64,
}

/// Source text and entity types of one annotation file.
#[derive(Debug, Clone)]
pub struct Document {
    source: SourceDocument,
    entity_types: Vec<EntityType>,
    by_text: HashMap<String, usize>,
}

impl Document {
    /// Creates a document without entities.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: SourceDocument::new(id, text),
            entity_types: Vec::new(),
            by_text: HashMap::new(),
        }
    }

    /// Builds a document from the content of its annotation file.
    ///
    /// Lines that are not extent annotations, or that are malformed, are
    /// skipped with a log entry.
    pub fn from_annotations(
        id: impl Into<String>,
        text: impl Into<String>,
        annotations: &str,
    ) -> Self {
        let mut document = Self::new(id, text);
        for (index, line) in annotations.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match EntityMention::parse(document.id(), line) {
                Ok(mention) => document.add_mention(mention),
                Err(MentionParseError::NotAnExtent(_)) => debug!(
                    "event=annotation_skip module=corpus status=skip document={} line={} reason=not_extent",
                    document.id(),
                    index + 1
                ),
                Err(err) => warn!(
                    "event=annotation_skip module=corpus status=skip document={} line={} reason={}",
                    document.id(),
                    index + 1,
                    err
                ),
            }
        }
        document
    }

    /// Adds a mention to the entity type for its text, creating the type on
    /// first sight. Mentions whose category disagrees with the existing type
    /// are dropped with a warning.
    pub fn add_mention(&mut self, mention: EntityMention) {
        if let Some(&index) = self.by_text.get(&mention.text) {
            if let Err(mismatch) = self.entity_types[index].push(mention) {
                warn!(
                    "event=annotation_skip module=corpus status=skip document={} mention={} reason=category_mismatch expected={} found={}",
                    mismatch.expected.document_id,
                    mismatch.mention.identifier,
                    mismatch.expected_category,
                    mismatch.mention.category
                );
            }
            return;
        }
        self.by_text
            .insert(mention.text.clone(), self.entity_types.len());
        self.entity_types.push(EntityType::new(mention));
    }

    pub fn id(&self) -> &str {
        self.source.id()
    }

    pub fn source(&self) -> &SourceDocument {
        &self.source
    }

    /// Entity types in first-mention order.
    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    pub fn entity_type(&self, text: &str) -> Option<&EntityType> {
        self.by_text
            .get(text)
            .map(|&index| &self.entity_types[index])
    }

    pub(crate) fn entity_type_mut(&mut self, text: &str) -> Option<&mut EntityType> {
        let index = *self.by_text.get(text)?;
        self.entity_types.get_mut(index)
    }

    pub(crate) fn entity_types_mut(&mut self) -> impl Iterator<Item = &mut EntityType> {
        self.entity_types.iter_mut()
    }

    /// Left and right text around `mention`, `width` characters each, with
    /// newlines flattened to spaces.
    pub fn context(&self, mention: &EntityMention, width: usize) -> (String, String) {
        let text = self.source.text();
        let left = char_window(text, mention.start.saturating_sub(width), mention.start);
        let right = char_window(text, mention.end, mention.end.saturating_add(width));
        (flatten_newlines(&left), flatten_newlines(&right))
    }

    /// Contexts for the first `limit` mentions of `entity_type`.
    pub fn contexts(
        &self,
        entity_type: &EntityType,
        width: usize,
        limit: usize,
    ) -> Vec<MentionContext> {
        entity_type
            .mentions()
            .iter()
            .take(limit)
            .map(|mention| {
                let (left, right) = self.context(mention, width);
                MentionContext {
                    left,
                    text: entity_type.text().to_string(),
                    right,
                }
            })
            .collect()
    }

    pub fn status(&self) -> DocumentStatus {
        let types = self.entity_types.len();
        let mentions = self
            .entity_types
            .iter()
            .map(EntityType::mention_count)
            .sum();
        let linked = self.entity_types.iter().filter(|entity| entity.is_linked());
        let linked_types = linked.clone().count();
        let linked_mentions = linked.map(EntityType::mention_count).sum();

        DocumentStatus {
            document_id: self.id().to_string(),
            types,
            mentions,
            linked_types,
            linked_mentions,
            percent_done: percent(linked_types, types),
            percent_done_mentions: percent(linked_mentions, mentions),
        }
    }
}

/// Percentage of `done` in `total`; an empty set counts as complete.
pub(crate) fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    done as f64 * 100.0 / total as f64
}

fn char_window(text: &str, start: usize, end: usize) -> String {
    if end <= start {
        return String::new();
    }
    text.chars().skip(start).take(end - start).collect()
}

fn flatten_newlines(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}
