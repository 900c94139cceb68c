use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IntegrateError {
    #[error("join key is not a recognized field: {0}")]
    #[diagnostic(help(
        "use one of InChIKey, Name, HMDB, LMID, Kegg, CHEBI, PC_compound"
    ))]
    MissingKey(String),

    #[error("malformed row at {path}:{line}: {message}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("table has no header line: {0}")]
    MissingHeader(PathBuf),

    #[error("input does not exist: {0}")]
    MissingInput(PathBuf),

    #[error("missing config file metab-int.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
