//! VD-002: Error types.
//!
//! Only the tag precondition violations are fatal. Everything the pipeline
//! can absorb (bad recipe JSON, missing tags, unresolved variants) is logged
//! instead of being returned as an error.

/// Errors that can stop a datagen run.
#[derive(Debug, thiserror::Error)]
pub enum DatagenError {
    /// A tag declaration asks for replace semantics, which are unsupported.
    #[error("tag {path} in {archive} declares \"replace\": \"true\"; only appending tags are supported")]
    ReplaceUnsupported { archive: String, path: String },

    /// A tag reaches itself through its own references.
    #[error("tag reference cycle: {chain}")]
    TagCycle { chain: String },

    /// Filesystem access failed.
    #[error("I/O error at {path}: {detail}")]
    Io { path: String, detail: String },

    /// An archive could not be opened or one of its entries read.
    #[error("archive {archive}: {detail}")]
    Archive { archive: String, detail: String },

    /// A document that must be valid JSON was not.
    #[error("invalid JSON in {path}: {detail}")]
    Json { path: String, detail: String },

    /// The configuration file is unreadable or invalid.
    #[error("config {path}: {detail}")]
    Config { path: String, detail: String },
}

impl DatagenError {
    /// Violations of the tag preconditions that must abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ReplaceUnsupported { .. } | Self::TagCycle { .. })
    }

    pub(crate) fn io(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_string(),
            detail: err.to_string(),
        }
    }
}
