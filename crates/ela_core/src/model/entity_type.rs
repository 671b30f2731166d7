//! Entity type grouping.
//!
//! # Responsibility
//! - Group the mentions of one surface text inside one document.
//! - Carry the materialized `link` for that group.
//!
//! # Invariants
//! - Every mention shares the type's text, category and document.
//! - `link` is only written by ledger replay or append.

use crate::model::mention::EntityMention;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Lookup key of an entity type: `(document id, surface text)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub document_id: String,
    pub text: String,
}

impl EntityKey {
    pub fn new(document_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
        }
    }
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.document_id, self.text)
    }
}

/// Mention rejected by [`EntityType::push`] because it belongs elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionMismatch {
    pub expected: EntityKey,
    pub expected_category: String,
    pub mention: EntityMention,
}

/// All mentions sharing identical surface text within one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityType {
    key: EntityKey,
    category: String,
    mentions: Vec<EntityMention>,
    link: Option<String>,
}

impl EntityType {
    /// Starts a group from its first mention. The link starts unset.
    pub fn new(first: EntityMention) -> Self {
        Self {
            key: EntityKey::new(first.document_id.as_str(), first.text.as_str()),
            category: first.category.clone(),
            mentions: vec![first],
            link: None,
        }
    }

    /// Appends a mention with matching document, text and category.
    pub fn push(&mut self, mention: EntityMention) -> Result<(), MentionMismatch> {
        if mention.document_id != self.key.document_id
            || mention.text != self.key.text
            || mention.category != self.category
        {
            return Err(MentionMismatch {
                expected: self.key.clone(),
                expected_category: self.category.clone(),
                mention,
            });
        }
        self.mentions.push(mention);
        Ok(())
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn document_id(&self) -> &str {
        &self.key.document_id
    }

    pub fn text(&self) -> &str {
        &self.key.text
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Mentions in annotation file order.
    pub fn mentions(&self) -> &[EntityMention] {
        &self.mentions
    }

    pub fn mention_count(&self) -> usize {
        self.mentions.len()
    }

    /// Current link; `None` until a decision has been recorded.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Whether any decision (including skip or empty) has been recorded.
    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    pub(crate) fn set_link(&mut self, link: Option<String>) {
        self.link = link;
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<EntityType {} '{}' {} {}>",
            self.mention_count(),
            self.text(),
            self.category,
            self.link.as_deref().unwrap_or("None")
        )
    }
}
