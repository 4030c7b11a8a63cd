use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HazidError {
    #[error("no readable source among {tried} candidate path(s) for '{what}'")]
    SourceNotFound { what: String, tried: usize },

    #[error("sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("failed to open workbook {path}: {reason}")]
    Workbook { path: PathBuf, reason: String },

    #[error("document assembly failed: {0}")]
    Document(String),

    #[error("export failed (document: {document}; text fallback: {text})")]
    Export { document: String, text: String },

    #[error("draft {path}: {reason}")]
    Draft { path: PathBuf, reason: String },

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid reference tables: {0}")]
    ReferenceInvalid(String),

    #[error("unknown form field '{0}'")]
    UnknownField(String),

    #[error("upload of {path} failed: {reason}")]
    Upload { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
