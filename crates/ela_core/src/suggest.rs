//! Link suggestion by majority vote over earlier decisions.
//!
//! # Invariants
//! - Only entity types with a non-empty link take part in the vote.
//! - Ties go to the link that reaches the winning count first when
//!   documents are scanned in id order.

use crate::corpus::Corpus;
use std::collections::HashMap;

/// Proposes the most frequent link already given to `text` anywhere in the
/// corpus, or `None` when no linked occurrence exists.
pub fn suggest(corpus: &Corpus, text: &str) -> Option<String> {
    let votes: Vec<&str> = corpus
        .documents()
        .filter_map(|document| document.entity_type(text))
        .filter_map(|entity| entity.link())
        .filter(|link| !link.is_empty())
        .collect();

    let mut totals: HashMap<&str, usize> = HashMap::new();
    for link in &votes {
        *totals.entry(*link).or_default() += 1;
    }
    let winning_count = *totals.values().max()?;

    let mut running: HashMap<&str, usize> = HashMap::new();
    for link in votes {
        let count = running.entry(link).or_default();
        *count += 1;
        if *count == winning_count {
            return Some(link.to_string());
        }
    }
    None
}
