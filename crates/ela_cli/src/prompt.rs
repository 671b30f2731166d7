//! Interactive prompt over an annotation session.
//!
//! # Responsibility
//! - Read one command per line and dispatch it to the session.
//! - Render the current entity, decisions and progress as plain text.
//!
//! # Invariants
//! - Input that is not a command is treated as link input for the current
//!   entity.
//! - Session errors are printed and never end the loop.

use ela_core::{
    AnnotationSession, CommitOutcome, LinkDecision, LinkValidator, MentionContext, SessionState,
};
use std::io::{self, BufRead, Write};

const PROMPT: &str = "ela> ";
const BOLD: &str = "\u{1b}[1m";
const BLUE: &str = "\u{1b}[34m";
const END: &str = "\u{1b}[0m";

const HELP: &str = "\
Available commands:

  h | ? | help          this help message
  q | quit | exit       quit the tool
  s | status            show annotation progress
  n | <return>          show the current entity
  a [term]              list decisions, optionally those matching <term>
  d <id>                show the entity of decision <id> in context
  y | accept            accept the suggested link
  fix <id> <input>      correct decision <id>
  b | backup            write a timestamped copy of the ledger

Anything else is taken as the link for the current entity. A name such as
`Jim Lehrer` expands to a full link, `-` skips the entity, and text after
` ***` is kept as a comment.";

enum Command<'a> {
    Quit,
    Help,
    Status,
    Show,
    List(Option<&'a str>),
    Display(&'a str),
    Accept,
    Fix(&'a str),
    Backup,
    Link(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    match line {
        "q" | "quit" | "exit" => return Command::Quit,
        "h" | "?" | "help" => return Command::Help,
        "s" | "status" => return Command::Status,
        "" | "n" => return Command::Show,
        "a" => return Command::List(None),
        "y" | "accept" => return Command::Accept,
        "b" | "backup" => return Command::Backup,
        _ => {}
    }
    if let Some(term) = line.strip_prefix("a ") {
        return Command::List(Some(term.trim()));
    }
    if let Some(id) = line.strip_prefix("d ") {
        return Command::Display(id.trim());
    }
    if let Some(rest) = line.strip_prefix("fix ") {
        return Command::Fix(rest.trim());
    }
    Command::Link(line)
}

/// Runs the prompt until `quit` or end of input.
pub fn run<V, R, W>(session: &mut AnnotationSession<V>, input: R, mut out: W) -> io::Result<()>
where
    V: LinkValidator,
    R: BufRead,
    W: Write,
{
    print_status(session, &mut out)?;
    print_current(session, &mut out)?;
    write!(out, "\n{PROMPT}")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Command::Quit => break,
            Command::Help => writeln!(out, "\n{HELP}")?,
            Command::Status => print_status(session, &mut out)?,
            Command::Show => print_current(session, &mut out)?,
            Command::List(term) => print_decisions(session, term, &mut out)?,
            Command::Display(id) => print_decision_context(session, id, &mut out)?,
            Command::Accept => {
                let result = session.accept_suggestion();
                report_commit(session, result, &mut out)?;
            }
            Command::Fix(rest) => fix(session, rest, &mut out)?,
            Command::Backup => match session.backup() {
                Ok(path) => writeln!(out, "Backup created in {}", path.display())?,
                Err(err) => writeln!(out, "ERROR: backup failed: {err}")?,
            },
            Command::Link(raw) => {
                let result = session.submit_link(raw);
                report_commit(session, result, &mut out)?;
            }
        }
        write!(out, "\n{PROMPT}")?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}

fn report_commit<V: LinkValidator, W: Write>(
    session: &AnnotationSession<V>,
    result: ela_core::SessionResult<CommitOutcome>,
    out: &mut W,
) -> io::Result<()> {
    match result {
        Ok(outcome) => {
            print_outcome(&outcome, out)?;
            print_current(session, out)
        }
        Err(err) => writeln!(out, "ERROR: {err}"),
    }
}

fn fix<V: LinkValidator, W: Write>(
    session: &mut AnnotationSession<V>,
    rest: &str,
    out: &mut W,
) -> io::Result<()> {
    let (id, raw) = rest.split_once(' ').unwrap_or((rest, ""));
    let Ok(id) = id.parse::<u64>() else {
        return writeln!(out, "ERROR: `{id}` is not a decision id");
    };
    match session.fix(id, raw) {
        Ok(outcome) => print_outcome(&outcome, out),
        Err(err) => writeln!(out, "ERROR: {err}"),
    }
}

fn print_outcome<W: Write>(outcome: &CommitOutcome, out: &mut W) -> io::Result<()> {
    let decision = &outcome.decision;
    match &outcome.comment {
        Some(comment) => writeln!(
            out,
            "Linked [{}] to {} ({comment})",
            decision.text, decision.link
        ),
        None => writeln!(out, "Linked [{}] to {}", decision.text, decision.link),
    }
}

fn print_status<V: LinkValidator, W: Write>(
    session: &AnnotationSession<V>,
    out: &mut W,
) -> io::Result<()> {
    let status = session.status();
    writeln!(
        out,
        "\nDone {:.0}% of {} types ({:.0}% of {} mentions)\n",
        status.percent_done.floor(),
        status.total_types,
        status.percent_done_mentions.floor(),
        status.total_mentions
    )?;
    for document in &status.documents {
        writeln!(
            out,
            "    {:<45} {:>5} {:>4.0}%",
            document.document_id, document.types, document.percent_done
        )?;
    }
    Ok(())
}

fn print_current<V: LinkValidator, W: Write>(
    session: &AnnotationSession<V>,
    out: &mut W,
) -> io::Result<()> {
    let presentation = match session.state() {
        SessionState::Presenting(presentation) => presentation,
        SessionState::Complete => return writeln!(out, "\nAll entities are linked."),
        SessionState::Idle => return writeln!(out, "\nNo entity selected."),
    };

    writeln!(
        out,
        "\n{BOLD}[{}]{END} ({}) in {}\n",
        presentation.key.text, presentation.category, presentation.key.document_id
    )?;
    print_contexts(&presentation.contexts, session.config().context_width, out)?;
    if let Some(suggestion) = &presentation.suggestion {
        writeln!(out, "\nSuggested link: {suggestion}  (type `y` to accept)")?;
    }
    Ok(())
}

fn print_contexts<W: Write>(
    contexts: &[MentionContext],
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    for context in contexts {
        writeln!(
            out,
            "    {}  [{BLUE}{}{END}]  {}",
            context.left_padded(width),
            context.text,
            context.right
        )?;
    }
    Ok(())
}

fn print_decisions<V: LinkValidator, W: Write>(
    session: &AnnotationSession<V>,
    term: Option<&str>,
    out: &mut W,
) -> io::Result<()> {
    let decisions: Vec<&LinkDecision> = match term {
        Some(term) => {
            writeln!(out, "\nDecisions matching '{term}':\n")?;
            session.search(term)
        }
        None => {
            writeln!(out, "\nAll decisions:\n")?;
            session.ledger().decisions().iter().collect()
        }
    };
    for decision in decisions {
        writeln!(out, "{}", decision.as_pretty_line())?;
    }
    Ok(())
}

fn print_decision_context<V: LinkValidator, W: Write>(
    session: &AnnotationSession<V>,
    id: &str,
    out: &mut W,
) -> io::Result<()> {
    let Ok(id) = id.parse::<u64>() else {
        return writeln!(out, "ERROR: `{id}` is not a decision id");
    };
    let decision = match session.decision(id) {
        Ok(decision) => decision,
        Err(err) => return writeln!(out, "ERROR: {err}"),
    };
    match session.entity_contexts(&decision.text, &decision.document_id) {
        Ok((entity, contexts)) => {
            writeln!(
                out,
                "\n{BOLD}[{}]{END} ({}) --> {}\n",
                entity.text(),
                entity.category(),
                decision.link
            )?;
            print_contexts(&contexts, session.config().context_width, out)
        }
        Err(err) => writeln!(out, "ERROR: {err}"),
    }
}
