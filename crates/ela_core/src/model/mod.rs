//! Value objects for entity linking.
//!
//! # Responsibility
//! - Define the immutable records built at load time (mentions, keys).
//! - Define the link decision record and its ledger line format.
//! - Own the link input grammar (skip marker, comment delimiter, templates).
//!
//! # Invariants
//! - An `EntityType` groups mentions with identical text and category
//!   inside one document.
//! - A stored link is the skip marker, the empty string, or an absolute URL.

pub mod decision;
pub mod entity_type;
pub mod link;
pub mod mention;
