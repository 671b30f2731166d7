//! Turn-based annotation session.
//!
//! # Responsibility
//! - Present the next unlinked entity type with its contexts and a
//!   suggested link.
//! - Validate, commit and advance on operator input.
//! - Apply corrections to earlier decisions and create backups.
//!
//! # Invariants
//! - States move `Idle -> Presenting -> ... -> Complete`; only `advance`
//!   changes the state.
//! - A rejected link, unknown id or missing suggestion leaves corpus,
//!   ledger and state untouched.
//! - Every successful commit consumes exactly one ledger identifier.
//! - One action is processed at a time; `&mut self` serializes them.

use crate::config::AnnotatorConfig;
use crate::corpus::{Corpus, CorpusError, CorpusStatus, MentionContext};
use crate::ledger::{Ledger, LedgerError, LedgerResult};
use crate::model::decision::{DecisionId, LinkDecision};
use crate::model::entity_type::{EntityKey, EntityType};
use crate::model::link::{parse_user_input, LinkChoice};
use crate::suggest::suggest;
use crate::validator::LinkValidator;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    /// Corpus could not be loaded.
    Corpus(CorpusError),
    /// Ledger could not be read or written.
    Ledger(LedgerError),
    EntityNotFound(EntityKey),
    DecisionNotFound(DecisionId),
    /// The candidate link failed the existence check.
    Validation { link: String },
    /// Accept was requested while no suggestion is active.
    NoSuggestion,
    /// A commit was requested while no entity is presented.
    NotPresenting,
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound(_) | Self::DecisionNotFound(_))
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corpus(err) => write!(f, "{err}"),
            Self::Ledger(err) => write!(f, "{err}"),
            Self::EntityNotFound(key) => write!(f, "entity not found: {key}"),
            Self::DecisionNotFound(id) => write!(f, "link decision not found: {id}"),
            Self::Validation { link } => write!(f, "the URL {link} does not exist"),
            Self::NoSuggestion => write!(f, "there was no link suggestion"),
            Self::NotPresenting => write!(f, "no entity is selected"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Corpus(err) => Some(err),
            Self::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CorpusError> for SessionError {
    fn from(value: CorpusError) -> Self {
        match value {
            CorpusError::NotFound(key) => Self::EntityNotFound(key),
            other => Self::Corpus(other),
        }
    }
}

impl From<LedgerError> for SessionError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::NotFound(id) => Self::DecisionNotFound(id),
            other => Self::Ledger(other),
        }
    }
}

/// Everything shown to the operator for the current target.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub key: EntityKey,
    pub category: String,
    pub mention_count: usize,
    pub contexts: Vec<MentionContext>,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Presenting(Presentation),
    /// No unlinked entity types remain.
    Complete,
}

/// Result of a successful commit or correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub decision: LinkDecision,
    /// Free comment given after the delimiter; not persisted in the ledger.
    pub comment: Option<String>,
}

/// Annotation workflow over one corpus and one ledger.
pub struct AnnotationSession<V: LinkValidator> {
    config: AnnotatorConfig,
    corpus: Corpus,
    ledger: Ledger,
    validator: V,
    state: SessionState,
}

impl<V: LinkValidator> AnnotationSession<V> {
    /// Creates an idle session over already loaded state.
    pub fn new(config: AnnotatorConfig, corpus: Corpus, ledger: Ledger, validator: V) -> Self {
        Self {
            config,
            corpus,
            ledger,
            validator,
            state: SessionState::Idle,
        }
    }

    /// Loads corpus and ledger from the configured paths and presents the
    /// first unlinked entity type.
    ///
    /// # Errors
    /// - Returns `SessionError::Corpus` or `SessionError::Ledger` on IO
    ///   failures; both are fatal for the session.
    pub fn open(config: AnnotatorConfig, validator: V) -> SessionResult<Self> {
        let mut corpus = Corpus::load(
            &config.sources_dir,
            &config.annotations_dir,
            config.source_name_len,
        )?;
        let ledger = Ledger::load(&config.ledger_path, &mut corpus)?;
        let mut session = Self::new(config, corpus, ledger, validator);
        session.advance();
        Ok(session)
    }

    /// Selects the next unlinked entity type, or completes the session.
    pub fn advance(&mut self) -> &SessionState {
        self.state = match self.corpus.next() {
            None => SessionState::Complete,
            Some(entity) => SessionState::Presenting(self.present(entity)),
        };
        match &self.state {
            SessionState::Presenting(presentation) => info!(
                "event=session_advance module=session status=ok document={} text={} suggestion={}",
                presentation.key.document_id,
                presentation.key.text,
                presentation.suggestion.as_deref().unwrap_or("none")
            ),
            SessionState::Complete => {
                info!("event=session_advance module=session status=complete")
            }
            SessionState::Idle => {}
        }
        &self.state
    }

    /// Commits the active suggestion for the current target, then advances.
    ///
    /// # Errors
    /// - `NotPresenting` when no target is active.
    /// - `NoSuggestion` when the target has no suggestion.
    /// - `Validation` when the suggested link fails the existence check.
    pub fn accept_suggestion(&mut self) -> SessionResult<CommitOutcome> {
        let presentation = self.presentation()?;
        let suggestion = presentation
            .suggestion
            .clone()
            .ok_or(SessionError::NoSuggestion)?;
        let key = presentation.key.clone();
        self.commit(&key, LinkChoice::from_stored(&suggestion), None)
    }

    /// Parses operator input, validates and commits it for the current
    /// target, then advances.
    ///
    /// # Errors
    /// - `NotPresenting` when no target is active.
    /// - `Validation` naming the rejected link; the target stays presented.
    pub fn submit_link(&mut self, raw_input: &str) -> SessionResult<CommitOutcome> {
        let key = self.presentation()?.key.clone();
        let input = parse_user_input(raw_input, &self.config.link_template);
        self.commit(&key, input.choice, input.comment)
    }

    /// Records a correction of decision `id` as a new decision.
    ///
    /// Neither requires nor changes the current target; the presented
    /// suggestion is recomputed since the correction may shift the vote.
    ///
    /// # Errors
    /// - `DecisionNotFound` for an unknown id.
    /// - `Validation` when the new link fails the existence check.
    pub fn fix(&mut self, id: DecisionId, raw_input: &str) -> SessionResult<CommitOutcome> {
        let prior = self.ledger.get_by_id(id)?.clone();
        let input = parse_user_input(raw_input, &self.config.link_template);
        self.ensure_valid(&input.choice)?;

        let decision = self
            .ledger
            .create_from_decision(input.choice.as_str(), &prior)?;
        self.ledger.save(decision.clone(), &mut self.corpus)?;
        self.refresh_suggestion();
        info!(
            "event=decision_fix module=session status=ok id={} replaces={} text={} link={} comment={}",
            decision.id,
            prior.id,
            decision.text,
            decision.link,
            input.comment.as_deref().unwrap_or("")
        );
        Ok(CommitOutcome {
            decision,
            comment: input.comment,
        })
    }

    /// Copies the ledger to a timestamped file and returns its path.
    pub fn backup(&self) -> SessionResult<PathBuf> {
        Ok(self.ledger.backup()?)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current target, if one is presented.
    pub fn current(&self) -> Option<&Presentation> {
        match &self.state {
            SessionState::Presenting(presentation) => Some(presentation),
            _ => None,
        }
    }

    /// First unlinked entity type in traversal order.
    pub fn next(&self) -> Option<&EntityType> {
        self.corpus.next()
    }

    pub fn status(&self) -> CorpusStatus {
        self.corpus.status()
    }

    pub fn search(&self, term: &str) -> Vec<&LinkDecision> {
        self.ledger.search(term)
    }

    pub fn suggest(&self, text: &str) -> Option<String> {
        suggest(&self.corpus, text)
    }

    pub fn decision(&self, id: DecisionId) -> LedgerResult<&LinkDecision> {
        self.ledger.get_by_id(id)
    }

    /// Entity type and its contexts, for displaying earlier decisions.
    pub fn entity_contexts(
        &self,
        text: &str,
        document_id: &str,
    ) -> SessionResult<(&EntityType, Vec<MentionContext>)> {
        let entity = self.corpus.get_entity(text, document_id)?;
        let contexts =
            self.corpus
                .contexts(entity, self.config.context_width, self.config.context_limit);
        Ok((entity, contexts))
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn present(&self, entity: &EntityType) -> Presentation {
        Presentation {
            key: entity.key().clone(),
            category: entity.category().to_string(),
            mention_count: entity.mention_count(),
            contexts: self.corpus.contexts(
                entity,
                self.config.context_width,
                self.config.context_limit,
            ),
            suggestion: suggest(&self.corpus, entity.text()),
        }
    }

    fn refresh_suggestion(&mut self) {
        if let SessionState::Presenting(presentation) = &mut self.state {
            presentation.suggestion = suggest(&self.corpus, &presentation.key.text);
        }
    }

    fn presentation(&self) -> SessionResult<&Presentation> {
        self.current().ok_or(SessionError::NotPresenting)
    }

    fn commit(
        &mut self,
        key: &EntityKey,
        choice: LinkChoice,
        comment: Option<String>,
    ) -> SessionResult<CommitOutcome> {
        self.ensure_valid(&choice)?;

        let entity = self.corpus.get_entity(&key.text, &key.document_id)?;
        let decision = self.ledger.create_from_entity(choice.as_str(), entity)?;
        self.ledger.save(decision.clone(), &mut self.corpus)?;
        info!(
            "event=decision_commit module=session status=ok id={} document={} text={} link={} comment={}",
            decision.id,
            decision.document_id,
            decision.text,
            decision.link,
            comment.as_deref().unwrap_or("")
        );

        self.advance();
        Ok(CommitOutcome { decision, comment })
    }

    /// Skip and empty links pass without a check; anything else must be
    /// confirmed by the validator.
    fn ensure_valid(&self, choice: &LinkChoice) -> SessionResult<()> {
        let LinkChoice::Url(link) = choice else {
            return Ok(());
        };
        match self.validator.exists(link) {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    "event=link_reject module=session status=error link={} reason=missing",
                    link
                );
                Err(SessionError::Validation { link: link.clone() })
            }
            Err(err) => {
                warn!(
                    "event=link_reject module=session status=error link={} reason={}",
                    link, err
                );
                Err(SessionError::Validation { link: link.clone() })
            }
        }
    }
}
