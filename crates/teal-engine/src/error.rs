//! Engine-level errors.

/// Errors surfaced by an engine or its extension machinery.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Failed to open the engine instance (bad path, bad flags).
    #[error("engine open failed: {0}")]
    Open(String),

    /// SQL parse or execution failure, message verbatim from the engine.
    #[error("{message}")]
    Sql {
        /// Engine diagnostic text.
        message: String,
        /// Native (extended) result code, when the engine reports one.
        code: Option<i32>,
    },

    /// Extension module could not be resolved.
    #[error("extension module '{0}' not found")]
    ModuleNotFound(String),

    /// Extension module resolved but failed to load or register.
    #[error("extension load failed: {0}")]
    ModuleLoad(String),

    /// A value the engine cannot represent or bind.
    #[error("unsupported value: {0}")]
    Unsupported(String),

    /// Session-level fault (engine handle unusable).
    #[error("engine session failed: {0}")]
    Session(String),
}

impl EngineError {
    /// Native result code, if the underlying engine reported one.
    #[must_use]
    pub fn native_code(&self) -> Option<i32> {
        match self {
            EngineError::Sql { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        let code = match &e {
            rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
            _ => None,
        };
        EngineError::Sql {
            message: e.to_string(),
            code,
        }
    }
}
