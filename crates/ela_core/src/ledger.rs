//! Append-only ledger of link decisions.
//!
//! # Responsibility
//! - Persist every link decision as one line in a tab-separated file.
//! - Rebuild entity-type links by folding the log on load.
//! - Offer search, lookup by id, corrections as new entries and backups.
//!
//! # Invariants
//! - The ledger is the source of truth; entity-type links are a cache
//!   that folding the log in order (last write per key wins) reproduces.
//! - Records are never rewritten; a correction is a new decision with a
//!   fresh identifier.
//! - After every `save`, success or failure, the in-memory record count
//!   matches the records persisted by this ledger.
//! - A backup never overwrites an existing file and never touches the
//!   ledger file itself.
//! - Only records that read back as the same decision are written.

use crate::corpus::Corpus;
use crate::model::decision::{DecisionId, LinkDecision, MalformedRecord};
use crate::model::entity_type::EntityType;
use chrono::{Local, NaiveDateTime, Timelike};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const BACKUP_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug)]
pub enum LedgerError {
    Io { path: PathBuf, source: io::Error },
    NotFound(DecisionId),
    /// A field holds a tab or line break and would not survive a reload.
    UnsafeField { field: &'static str, value: String },
    /// `max_id` leaves no room for another identifier.
    IdsExhausted(DecisionId),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "ledger io failure at `{}`: {source}", path.display())
            }
            Self::NotFound(id) => write!(f, "link decision not found: {id}"),
            Self::UnsafeField { field, value } => {
                write!(f, "ledger field `{field}` cannot hold `{}`", value.escape_debug())
            }
            Self::IdsExhausted(max_id) => {
                write!(f, "no decision identifier left after {max_id}")
            }
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NotFound(_) | Self::UnsafeField { .. } | Self::IdsExhausted(_) => None,
        }
    }
}

/// Ordered decision log backed by one file.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    decisions: Vec<LinkDecision>,
    max_id: DecisionId,
    /// The file does not end with a newline and the next append must add one.
    needs_separator: bool,
}

impl Ledger {
    /// Opens the ledger at `path`, creating an empty file when absent, and
    /// replays every well-formed record into `corpus`.
    ///
    /// Malformed lines are skipped and logged; they never abort the load.
    pub fn load(path: impl AsRef<Path>, corpus: &mut Corpus) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| io_error(&path, source))?;
        let content = fs::read(&path).map_err(|source| io_error(&path, source))?;

        let mut ledger = Self {
            needs_separator: !content.is_empty() && !content.ends_with(b"\n"),
            path,
            decisions: Vec::new(),
            max_id: 0,
        };

        corpus.clear_links();
        let mut skipped = 0usize;
        for (index, line) in record_lines(&content).enumerate() {
            let parsed = match std::str::from_utf8(line) {
                Ok(line) => LinkDecision::parse_record(line, index + 1),
                Err(err) => Err(MalformedRecord {
                    line: index + 1,
                    reason: format!("invalid utf-8: {err}"),
                }),
            };
            match parsed {
                Ok(decision) => ledger.add_decision(decision, corpus),
                Err(record) => {
                    skipped += 1;
                    warn!(
                        "event=ledger_record_skip module=ledger status=skip line={} reason={}",
                        record.line, record.reason
                    );
                }
            }
        }

        info!(
            "event=ledger_load module=ledger status=ok path={} decisions={} skipped={} max_id={}",
            ledger.path.display(),
            ledger.decisions.len(),
            skipped,
            ledger.max_id
        );
        Ok(ledger)
    }

    /// Records `decision` in memory and applies its link to the target
    /// entity type. Earlier decisions for the same key stay in the log.
    ///
    /// Does not persist; see [`Ledger::save`].
    pub fn add_decision(&mut self, decision: LinkDecision, corpus: &mut Corpus) {
        self.max_id = self.max_id.max(decision.id);
        apply(&decision, corpus);
        self.decisions.push(decision);
    }

    /// Builds a fresh decision for `entity_type` with the next identifier.
    ///
    /// The identifier is only consumed once the decision is added.
    pub fn create_from_entity(
        &self,
        link: &str,
        entity_type: &EntityType,
    ) -> LedgerResult<LinkDecision> {
        Ok(LinkDecision {
            id: self.next_id()?,
            timestamp: now(),
            document_id: entity_type.document_id().to_string(),
            text: entity_type.text().to_string(),
            category: entity_type.category().to_string(),
            mention_count: entity_type.mention_count(),
            link: link.to_string(),
        })
    }

    /// Builds a correction of `prior`, copying its entity metadata.
    pub fn create_from_decision(
        &self,
        link: &str,
        prior: &LinkDecision,
    ) -> LedgerResult<LinkDecision> {
        Ok(LinkDecision {
            id: self.next_id()?,
            timestamp: now(),
            link: link.to_string(),
            ..prior.clone()
        })
    }

    /// Appends `decision` durably, then in memory.
    ///
    /// # Errors
    /// - Returns `LedgerError::UnsafeField` before touching the file when a
    ///   field holds a tab or line break.
    /// - Returns `LedgerError::Io` when the write or flush fails. The file is
    ///   truncated back to its previous length and nothing changes in
    ///   memory.
    pub fn save(&mut self, decision: LinkDecision, corpus: &mut Corpus) -> LedgerResult<()> {
        if let Some((field, value)) = decision.unsafe_field() {
            warn!(
                "event=decision_append module=ledger status=error id={} field={} reason=separator",
                decision.id, field
            );
            return Err(LedgerError::UnsafeField {
                field,
                value: value.to_string(),
            });
        }
        let mut record = decision.to_record();
        record.push('\n');
        if self.needs_separator {
            record.insert(0, '\n');
        }

        self.append_durably(record.as_bytes())?;
        self.needs_separator = false;
        debug!(
            "event=decision_append module=ledger status=ok id={} document={} link={}",
            decision.id, decision.document_id, decision.link
        );
        self.add_decision(decision, corpus);
        Ok(())
    }

    /// Decisions whose entity text contains `term`, case-insensitively, in
    /// log order.
    pub fn search(&self, term: &str) -> Vec<&LinkDecision> {
        let needle = term.to_lowercase();
        self.decisions
            .iter()
            .filter(|decision| decision.text.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn get_by_id(&self, id: DecisionId) -> LedgerResult<&LinkDecision> {
        self.decisions
            .iter()
            .find(|decision| decision.id == id)
            .ok_or(LedgerError::NotFound(id))
    }

    /// Copies the ledger file next to itself under a timestamped name and
    /// returns the new path.
    ///
    /// # Errors
    /// - Returns `LedgerError::Io` when the copy fails; a partial copy is
    ///   removed and the ledger file is left as it was.
    pub fn backup(&self) -> LedgerResult<PathBuf> {
        let stamp = Local::now().format(BACKUP_STAMP_FORMAT).to_string();
        let mut target = self.backup_path(&stamp);
        let mut attempt = 1;
        while target.exists() {
            target = self.backup_path(&format!("{stamp}-{attempt}"));
            attempt += 1;
        }

        if let Err(source) = fs::copy(&self.path, &target) {
            let _ = fs::remove_file(&target);
            warn!(
                "event=ledger_backup module=ledger status=error target={} error={}",
                target.display(),
                source
            );
            return Err(io_error(&target, source));
        }

        info!(
            "event=ledger_backup module=ledger status=ok target={} decisions={}",
            target.display(),
            self.decisions.len()
        );
        Ok(target)
    }

    /// Clears every link in `corpus` and folds the log into it again.
    pub fn replay_into(&self, corpus: &mut Corpus) {
        corpus.clear_links();
        for decision in &self.decisions {
            apply(decision, corpus);
        }
    }

    pub fn decisions(&self) -> &[LinkDecision] {
        &self.decisions
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn max_id(&self) -> DecisionId {
        self.max_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn next_id(&self) -> LedgerResult<DecisionId> {
        self.max_id
            .checked_add(1)
            .ok_or(LedgerError::IdsExhausted(self.max_id))
    }

    fn append_durably(&self, bytes: &[u8]) -> LedgerResult<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| io_error(&self.path, source))?;
        let length_before = file
            .metadata()
            .map_err(|source| io_error(&self.path, source))?
            .len();

        if let Err(source) = write_and_sync(&mut file, bytes) {
            if let Err(rollback) = file.set_len(length_before) {
                warn!(
                    "event=decision_append module=ledger status=error path={} rollback_error={}",
                    self.path.display(),
                    rollback
                );
            }
            return Err(io_error(&self.path, source));
        }
        Ok(())
    }

    fn backup_path(&self, stamp: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map_or_else(|| "ledger".into(), |stem| stem.to_string_lossy());
        let name = match self.path.extension() {
            Some(extension) => format!("{stem}-{stamp}.{}", extension.to_string_lossy()),
            None => format!("{stem}-{stamp}"),
        };
        self.path.with_file_name(name)
    }
}

fn apply(decision: &LinkDecision, corpus: &mut Corpus) {
    match corpus.entity_type_mut(&decision.key()) {
        Some(entity) => entity.set_link(Some(decision.link.clone())),
        None => warn!(
            "event=decision_orphan module=ledger status=skip id={} document={} text={}",
            decision.id, decision.document_id, decision.text
        ),
    }
}

/// Lines split on `\n` with an optional trailing `\r` removed; a final
/// empty segment is not a line.
fn record_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let content = content.strip_suffix(b"\n").unwrap_or(content);
    content
        .split(|byte| *byte == b'\n')
        .filter(move |_| !content.is_empty())
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn write_and_sync(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_data()
}

fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn io_error(path: &Path, source: io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.to_path_buf(),
        source,
    }
}
