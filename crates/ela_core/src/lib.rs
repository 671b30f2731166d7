//! Core domain logic for the entity link annotator.
//! This crate is the single source of truth for annotation invariants.

pub mod config;
pub mod corpus;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod service;
pub mod suggest;
pub mod validator;

pub use config::AnnotatorConfig;
pub use corpus::{
    Corpus, CorpusError, CorpusResult, CorpusStatus, Document, DocumentStatus, MentionContext,
    SourceDocument,
};
pub use ledger::{Ledger, LedgerError, LedgerResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::decision::{DecisionId, LinkDecision, MalformedRecord};
pub use model::entity_type::{EntityKey, EntityType};
pub use model::link::{
    normalize_link, parse_user_input, LinkChoice, UserInput, COMMENT_DELIMITER, SKIP_MARKER,
};
pub use model::mention::EntityMention;
pub use service::session::{
    AnnotationSession, CommitOutcome, Presentation, SessionError, SessionResult, SessionState,
};
pub use suggest::suggest;
pub use validator::{AcceptAllValidator, LinkValidator};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
