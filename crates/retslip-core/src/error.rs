use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RetslipError {
    #[error("table source failed: {0}")]
    TableSource(String),

    #[error("unsupported input '{0}'. Expected a .json table dump or an .xlsx workbook")]
    UnsupportedInput(String),

    #[error("no raw tables found in input")]
    NoTables,

    #[error("failed to load profile from {path}: {reason}")]
    ProfileLoad { path: PathBuf, reason: String },

    #[error("invalid profile: {0}")]
    ProfileInvalid(String),

    #[error("invalid detector pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
