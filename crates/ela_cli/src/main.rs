//! Terminal front end for the entity link annotator.
//!
//! # Responsibility
//! - Parse flags, merge them over the JSON configuration and start logging.
//! - Open the annotation session and hand it to the prompt loop.

mod config;
mod http;
mod prompt;

use clap::Parser;
use ela_core::{AcceptAllValidator, AnnotationSession, LinkValidator};
use http::HttpLinkValidator;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "ela",
    version,
    about = "Link named-entity annotations to reference pages"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory with primary text files
    #[arg(long)]
    sources: Option<PathBuf>,
    /// Directory with entity annotation files
    #[arg(long)]
    annotations: Option<PathBuf>,
    /// Ledger file with link decisions
    #[arg(long)]
    ledger: Option<PathBuf>,
    /// Characters of context on each side of a mention
    #[arg(long)]
    context_width: Option<usize>,
    /// Log level (trace|debug|info|warn|error); needs --log-dir
    #[arg(long, requires = "log_dir")]
    log_level: Option<String>,
    /// Absolute directory for log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Accept every link without checking that it exists
    #[arg(long)]
    offline: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("ela: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or_else(|| ela_core::default_log_level());
        ela_core::init_logging(level, &log_dir.to_string_lossy())?;
    }

    let mut annotator_config = match &cli.config {
        Some(path) => config::load(path).map_err(|err| err.to_string())?,
        None => Default::default(),
    };
    config::apply_overrides(
        &mut annotator_config,
        config::Overrides {
            sources: cli.sources,
            annotations: cli.annotations,
            ledger: cli.ledger,
            context_width: cli.context_width,
        },
    );

    let validator: Box<dyn LinkValidator> = if cli.offline {
        Box::new(AcceptAllValidator)
    } else {
        Box::new(HttpLinkValidator::new().map_err(|err| err.to_string())?)
    };

    let mut session =
        AnnotationSession::open(annotator_config, validator).map_err(|err| err.to_string())?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    prompt::run(&mut session, stdin.lock(), stdout.lock()).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn log_level_requires_log_dir() {
        let err = Cli::try_parse_from(["ela", "--log-level", "debug"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli =
            Cli::try_parse_from(["ela", "--log-level", "debug", "--log-dir", "/tmp/ela-logs"])
                .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
