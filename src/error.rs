use std::path::PathBuf;

/// Errors surfaced by the report-to-rules pipeline.
#[derive(Debug)]
pub enum PromdropError {
    /// Input report could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Input report is not JSON of the expected shape.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// An output file could not be created or written.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Invalid settings (max regex length, output paths, config file).
    Config { detail: String },
}

impl PromdropError {
    pub fn config(detail: impl Into<String>) -> Self {
        PromdropError::Config {
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for PromdropError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromdropError::Read { path, source } => {
                write!(f, "error reading JSON file {}: {source}", path.display())
            }
            PromdropError::Parse { path, source } => {
                write!(f, "error parsing JSON file {}: {source}", path.display())
            }
            PromdropError::Write { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            PromdropError::Config { detail } => write!(f, "invalid configuration: {detail}"),
        }
    }
}

impl std::error::Error for PromdropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromdropError::Read { source, .. } => Some(source),
            PromdropError::Parse { source, .. } => Some(source),
            PromdropError::Write { source, .. } => Some(source),
            PromdropError::Config { .. } => None,
        }
    }
}
