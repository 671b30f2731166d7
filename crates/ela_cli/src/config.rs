//! Configuration file loading and flag overrides.

use ela_core::AnnotatorConfig;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Default)]
pub struct Overrides {
    pub sources: Option<PathBuf>,
    pub annotations: Option<PathBuf>,
    pub ledger: Option<PathBuf>,
    pub context_width: Option<usize>,
}

/// Reads a JSON configuration; missing keys take their defaults.
pub fn load(path: &Path) -> Result<AnnotatorConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn apply_overrides(config: &mut AnnotatorConfig, overrides: Overrides) {
    if let Some(sources) = overrides.sources {
        config.sources_dir = sources;
    }
    if let Some(annotations) = overrides.annotations {
        config.annotations_dir = annotations;
    }
    if let Some(ledger) = overrides.ledger {
        config.ledger_path = ledger;
    }
    if let Some(width) = overrides.context_width {
        config.context_width = width;
    }
}
