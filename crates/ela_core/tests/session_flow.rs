use ela_core::{
    AnnotationSession, AnnotatorConfig, Corpus, Document, Ledger, LedgerError, LinkValidator,
    SessionError, SessionState, SKIP_MARKER,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Confirms only the links it was given and remembers every check.
#[derive(Default)]
struct ScriptedValidator {
    known: HashSet<String>,
    failing: HashSet<String>,
    checked: RefCell<Vec<String>>,
}

impl ScriptedValidator {
    fn knowing(links: &[&str]) -> Self {
        Self {
            known: links.iter().map(|link| link.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl LinkValidator for ScriptedValidator {
    fn exists(&self, candidate: &str) -> Result<bool, String> {
        self.checked.borrow_mut().push(candidate.to_string());
        if self.failing.contains(candidate) {
            return Err("connection reset".to_string());
        }
        Ok(self.known.contains(candidate))
    }
}

fn config(ledger_path: &Path) -> AnnotatorConfig {
    AnnotatorConfig {
        ledger_path: ledger_path.to_path_buf(),
        context_width: 10,
        ..AnnotatorConfig::default()
    }
}

fn single_document() -> Corpus {
    Corpus::from_documents([Document::from_annotations(
        "D.ann",
        "Acme sued Zeta over Acme patents.",
        "T1\tORG 0 4\tAcme\nT2\tORG 10 14\tZeta\nT3\tORG 20 24\tAcme\n",
    )])
}

fn session<'v>(
    dir: &Path,
    corpus: Corpus,
    validator: &'v ScriptedValidator,
) -> AnnotationSession<&'v ScriptedValidator> {
    let path = dir.join("annotations.tab");
    let mut corpus = corpus;
    let ledger = Ledger::load(&path, &mut corpus).unwrap();
    let mut session = AnnotationSession::new(config(&path), corpus, ledger, validator);
    session.advance();
    session
}

fn current_text<V: LinkValidator>(session: &AnnotationSession<V>) -> Option<String> {
    session.current().map(|p| p.key.text.clone())
}

#[test]
fn submit_commits_and_advances_to_next_entity() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&["https://ex/A"]);
    let mut session = session(dir.path(), single_document(), &validator);

    let presented = session.current().unwrap();
    assert_eq!(presented.key.text, "Acme");
    assert_eq!(presented.mention_count, 2);
    assert_eq!(presented.contexts.len(), 2);
    assert_eq!(presented.contexts[0].right, " sued Zeta");
    assert_eq!(presented.suggestion, None);

    let outcome = session.submit_link("https://ex/A").unwrap();
    assert_eq!(outcome.decision.id, 1);
    assert_eq!(outcome.decision.mention_count, 2);
    assert_eq!(current_text(&session).as_deref(), Some("Zeta"));
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(session.ledger().max_id(), 1);

    let persisted = fs::read_to_string(dir.path().join("annotations.tab")).unwrap();
    assert_eq!(persisted.lines().count(), 1);
    assert!(persisted.ends_with("\tD.ann\tAcme\tORG\t2\thttps://ex/A\n"));
}

#[test]
fn rejected_link_keeps_state_and_names_the_link() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&[]);
    let mut session = session(dir.path(), single_document(), &validator);
    let before = session.state().clone();

    let err = session.submit_link("No Such Page").unwrap_err();
    match err {
        SessionError::Validation { link } => {
            assert_eq!(link, "https://en.wikipedia.org/wiki/No_Such_Page")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.state(), &before);
    assert!(session.ledger().is_empty());
    assert_eq!(
        fs::read_to_string(dir.path().join("annotations.tab")).unwrap(),
        ""
    );
}

#[test]
fn validator_errors_count_as_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let mut validator = ScriptedValidator::knowing(&[]);
    validator.failing.insert("https://ex/flaky".to_string());
    let mut session = session(dir.path(), single_document(), &validator);

    let err = session.submit_link("https://ex/flaky").unwrap_err();
    assert!(matches!(err, SessionError::Validation { .. }));
    assert_eq!(current_text(&session).as_deref(), Some("Acme"));
}

#[test]
fn skip_and_empty_links_bypass_the_validator() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&[]);
    let mut session = session(dir.path(), single_document(), &validator);

    let skipped = session.submit_link("-").unwrap();
    assert_eq!(skipped.decision.link, SKIP_MARKER);
    let empty = session.submit_link("*** not in any encyclopedia").unwrap();
    assert_eq!(empty.decision.link, "");
    assert_eq!(empty.comment.as_deref(), Some("not in any encyclopedia"));

    assert!(validator.checked.borrow().is_empty());
    assert_eq!(session.state(), &SessionState::Complete);
    assert!(session.next().is_none());
}

#[test]
fn accept_suggestion_uses_majority_link() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = Corpus::from_documents(
        ["D1.ann", "D2.ann", "D3.ann", "D4.ann"]
            .into_iter()
            .map(|id| Document::from_annotations(id, "Acme", "T1\tORG 0 4\tAcme\n")),
    );
    fs::write(
        dir.path().join("annotations.tab"),
        "1\t2022-06-14 10:00:00\tD1.ann\tAcme\tORG\t1\thttps://ex/L1\n\
         2\t2022-06-14 10:00:01\tD2.ann\tAcme\tORG\t1\thttps://ex/L1\n\
         3\t2022-06-14 10:00:02\tD3.ann\tAcme\tORG\t1\thttps://ex/L2\n",
    )
    .unwrap();
    let validator = ScriptedValidator::knowing(&["https://ex/L1"]);
    let mut session = session(dir.path(), corpus, &validator);

    assert_eq!(session.suggest("Acme").as_deref(), Some("https://ex/L1"));
    let presented = session.current().unwrap();
    assert_eq!(presented.key.document_id, "D4.ann");
    assert_eq!(presented.suggestion.as_deref(), Some("https://ex/L1"));

    let outcome = session.accept_suggestion().unwrap();
    assert_eq!(outcome.decision.id, 4);
    assert_eq!(outcome.decision.link, "https://ex/L1");
    assert_eq!(session.state(), &SessionState::Complete);
}

#[test]
fn accept_without_suggestion_reports_error_and_stays() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&[]);
    let mut session = session(dir.path(), single_document(), &validator);

    assert!(matches!(
        session.accept_suggestion(),
        Err(SessionError::NoSuggestion)
    ));
    assert_eq!(current_text(&session).as_deref(), Some("Acme"));
}

#[test]
fn commits_outside_presenting_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&[]);
    let path = dir.path().join("annotations.tab");
    let mut corpus = single_document();
    let ledger = Ledger::load(&path, &mut corpus).unwrap();
    let mut session = AnnotationSession::new(config(&path), corpus, ledger, &validator);

    assert_eq!(session.state(), &SessionState::Idle);
    assert!(matches!(
        session.submit_link("-"),
        Err(SessionError::NotPresenting)
    ));
    assert!(session.ledger().is_empty());
}

#[test]
fn fix_appends_correction_without_moving_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&["https://ex/A", "https://ex/Z"]);
    let mut session = session(dir.path(), single_document(), &validator);
    session.submit_link("https://ex/A").unwrap();
    session.submit_link("-").unwrap();
    assert_eq!(session.state(), &SessionState::Complete);

    let original = session.decision(1).unwrap().clone();
    let outcome = session.fix(1, "https://ex/Z *** better match").unwrap();

    assert_eq!(outcome.decision.id, 3);
    assert_eq!(outcome.decision.text, "Acme");
    assert_eq!(outcome.comment.as_deref(), Some("better match"));
    assert_eq!(session.decision(1).unwrap(), &original);
    assert_eq!(
        session.corpus().get_entity("Acme", "D.ann").unwrap().link(),
        Some("https://ex/Z")
    );
    assert_eq!(session.state(), &SessionState::Complete);
}

#[test]
fn fix_with_skip_marker_creates_new_decision() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&["https://ex/A", "https://ex/Z"]);
    let mut session = session(dir.path(), single_document(), &validator);
    session.submit_link("https://ex/A").unwrap();
    session.submit_link("https://ex/Z").unwrap();
    session.fix(2, "https://ex/A").unwrap();

    let third = session.decision(3).unwrap().clone();
    let outcome = session.fix(3, "-").unwrap();

    assert_eq!(outcome.decision.id, 4);
    assert_eq!(outcome.decision.link, SKIP_MARKER);
    assert_eq!(session.decision(3).unwrap(), &third);
    assert_eq!(session.ledger().len(), 4);
}

#[test]
fn fix_failures_leave_everything_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&["https://ex/A"]);
    let mut session = session(dir.path(), single_document(), &validator);
    session.submit_link("https://ex/A").unwrap();

    let missing = session.fix(99, "-").unwrap_err();
    assert!(missing.is_not_found());
    let invalid = session.fix(1, "https://ex/unknown").unwrap_err();
    assert!(matches!(invalid, SessionError::Validation { .. }));

    assert_eq!(session.ledger().max_id(), 1);
    assert_eq!(current_text(&session).as_deref(), Some("Zeta"));
}

#[test]
fn identifiers_grow_by_one_per_successful_action() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = Corpus::from_documents(["A.ann", "B.ann"].into_iter().map(|id| {
        Document::from_annotations(id, "Acme Acme", "T1\tORG 0 4\tAcme\nT2\tORG 5 9\tAcme\n")
    }));
    let validator = ScriptedValidator::knowing(&["https://ex/A"]);
    let mut session = session(dir.path(), corpus, &validator);
    let start = session.ledger().max_id();

    session.submit_link("https://ex/A").unwrap();
    session.submit_link("https://ex/missing").unwrap_err();
    session.accept_suggestion().unwrap();
    session.fix(1, "-").unwrap();
    session.fix(2, "https://ex/A").unwrap();

    assert_eq!(session.ledger().max_id(), start + 4);
}

#[test]
fn search_and_backup_are_available_from_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ScriptedValidator::knowing(&["https://ex/A"]);
    let mut session = session(dir.path(), single_document(), &validator);
    session.submit_link("https://ex/A").unwrap();

    assert_eq!(session.search("acme").len(), 1);
    let backup = session.backup().unwrap();
    assert_eq!(
        fs::read(&backup).unwrap(),
        fs::read(dir.path().join("annotations.tab")).unwrap()
    );
    assert_eq!(current_text(&session).as_deref(), Some("Zeta"));

    let status = session.status();
    assert_eq!(status.total_types, 2);
    assert_eq!(status.percent_done, 50.0);
}

#[test]
fn open_loads_configured_paths_and_presents_first_entity() {
    let dir = tempfile::tempdir().unwrap();
    let sources = dir.path().join("sources");
    let annotations = dir.path().join("annotations");
    fs::create_dir_all(&sources).unwrap();
    fs::create_dir_all(&annotations).unwrap();
    fs::write(
        sources.join("cpb-aacip-507-0000000001-transcript.txt"),
        "Acme sued Zeta over Acme patents.",
    )
    .unwrap();
    fs::write(
        annotations.join("cpb-aacip-507-0000000001-transcript.ann"),
        "T1\tORG 0 4\tAcme\nT2\tORG 10 14\tZeta\n",
    )
    .unwrap();

    let config = AnnotatorConfig {
        sources_dir: sources,
        annotations_dir: annotations,
        ledger_path: dir.path().join("annotations.tab"),
        ..AnnotatorConfig::default()
    };
    let validator = ScriptedValidator::knowing(&[]);
    let session = AnnotationSession::open(config, &validator).unwrap();

    assert_eq!(current_text(&session).as_deref(), Some("Acme"));
    assert_eq!(
        session.current().unwrap().contexts[0].right,
        " sued Zeta over Acme patents."
    );
}

#[test]
fn open_fails_on_unreadable_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let config = AnnotatorConfig {
        sources_dir: dir.path().join("missing"),
        annotations_dir: dir.path().join("missing"),
        ledger_path: dir.path().join("annotations.tab"),
        ..AnnotatorConfig::default()
    };
    let validator = ScriptedValidator::knowing(&[]);

    let err = AnnotationSession::open(config, &validator).err().unwrap();
    assert!(matches!(err, SessionError::Corpus(_)));
}

#[test]
fn fix_refreshes_the_presented_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = Corpus::from_documents(
        ["D1.ann", "D2.ann", "D3.ann", "D4.ann"]
            .into_iter()
            .map(|id| Document::from_annotations(id, "Acme", "T1\tORG 0 4\tAcme\n")),
    );
    fs::write(
        dir.path().join("annotations.tab"),
        "1\t2022-06-14 10:00:00\tD1.ann\tAcme\tORG\t1\thttps://ex/L1\n\
         2\t2022-06-14 10:00:01\tD2.ann\tAcme\tORG\t1\thttps://ex/L1\n\
         3\t2022-06-14 10:00:02\tD3.ann\tAcme\tORG\t1\thttps://ex/L2\n",
    )
    .unwrap();
    let validator = ScriptedValidator::knowing(&["https://ex/L1", "https://ex/L2"]);
    let mut session = session(dir.path(), corpus, &validator);
    assert_eq!(
        session.current().unwrap().suggestion.as_deref(),
        Some("https://ex/L1")
    );

    session.fix(1, "https://ex/L2").unwrap();

    let presented = session.current().unwrap();
    assert_eq!(presented.key.document_id, "D4.ann");
    assert_eq!(presented.suggestion, session.suggest("Acme"));
    assert_eq!(presented.suggestion.as_deref(), Some("https://ex/L2"));
    let outcome = session.accept_suggestion().unwrap();
    assert_eq!(outcome.decision.link, "https://ex/L2");
}

#[test]
fn exhausted_identifiers_fail_the_commit_and_keep_the_target() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("annotations.tab"),
        format!("{}\t2022-06-14 10:00:00\tD.ann\tAcme\tORG\t2\t-\n", u64::MAX),
    )
    .unwrap();
    let validator = ScriptedValidator::knowing(&[]);
    let mut session = session(dir.path(), single_document(), &validator);
    assert_eq!(current_text(&session).as_deref(), Some("Zeta"));

    let err = session.submit_link("-").unwrap_err();

    assert!(matches!(
        err,
        SessionError::Ledger(LedgerError::IdsExhausted(u64::MAX))
    ));
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(current_text(&session).as_deref(), Some("Zeta"));
}
