//! Core use-case services.
//!
//! # Responsibility
//! - Sequence corpus, ledger, suggestion and validation into the annotation
//!   workflow.
//! - Keep presentation layers decoupled from storage details.

pub mod session;
