//! Client-facing error taxonomy with numeric codes.

use teal_engine::EngineError;

/// Numeric error codes, range-partitioned by concern.
///
/// Ranges:
/// - 100-199: configuration
/// - 200-299: lifecycle
/// - 300-399: extensions
/// - 400-499: SQL execution
/// - 500-599: marshaling
/// - 900-999: internal
pub mod codes {
    /// Bad open options or engine path.
    pub const CONFIGURATION: i32 = 100;
    /// Operation on a closed connection.
    pub const CONNECTION_CLOSED: i32 = 200;
    /// Operation against a closed engine binding.
    pub const ENGINE_CLOSED: i32 = 201;
    /// Unsigned extension rejected by policy.
    pub const UNTRUSTED_EXTENSION: i32 = 300;
    /// Native extension load failure.
    pub const EXTENSION_LOAD: i32 = 301;
    /// SQL parse or execution failure.
    pub const SQL: i32 = 400;
    /// Native type with no caller-facing representation.
    pub const UNSUPPORTED_TYPE: i32 = 500;
    /// Worker fault at the dispatch boundary.
    pub const INTERNAL: i32 = 900;
}

/// Error kind, the stable discriminant callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad open options or engine path.
    Configuration,
    /// Operation on a closed connection.
    ConnectionClosed,
    /// Operation against a closed engine binding.
    EngineClosed,
    /// Unsigned extension rejected by policy.
    UntrustedExtension,
    /// Native extension load failure.
    ExtensionLoad,
    /// SQL parse or execution failure.
    Sql,
    /// Native type with no caller-facing representation.
    UnsupportedType,
    /// Worker fault at the dispatch boundary.
    Internal,
}

impl ErrorKind {
    /// Stable string name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::ConnectionClosed => "ConnectionClosed",
            ErrorKind::EngineClosed => "EngineClosed",
            ErrorKind::UntrustedExtension => "UntrustedExtension",
            ErrorKind::ExtensionLoad => "ExtensionLoadError",
            ErrorKind::Sql => "SqlError",
            ErrorKind::UnsupportedType => "UnsupportedType",
            ErrorKind::Internal => "InternalError",
        }
    }

    /// Numeric code for this kind.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::Configuration => codes::CONFIGURATION,
            ErrorKind::ConnectionClosed => codes::CONNECTION_CLOSED,
            ErrorKind::EngineClosed => codes::ENGINE_CLOSED,
            ErrorKind::UntrustedExtension => codes::UNTRUSTED_EXTENSION,
            ErrorKind::ExtensionLoad => codes::EXTENSION_LOAD,
            ErrorKind::Sql => codes::SQL,
            ErrorKind::UnsupportedType => codes::UNSUPPORTED_TYPE,
            ErrorKind::Internal => codes::INTERNAL,
        }
    }
}

/// A failed command or handle operation.
///
/// Every failure carries a kind, a human-readable message, and optionally
/// the native engine result code that caused it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TealError {
    /// Bad open options or engine path.
    #[error("configuration error: {message}")]
    Configuration {
        /// What was wrong.
        message: String,
    },

    /// The connection was closed before or while the operation ran.
    #[error("connection is closed")]
    ConnectionClosed,

    /// The engine binding was closed.
    #[error("engine binding is closed")]
    EngineClosed,

    /// Unsigned extension rejected by the trust policy.
    #[error("extension '{module}' is unsigned and unsigned extensions are not allowed")]
    UntrustedExtension {
        /// The module that was rejected.
        module: String,
    },

    /// The extension resolved but failed to load.
    #[error("extension load error: {message}")]
    ExtensionLoad {
        /// Native diagnostic text.
        message: String,
        /// Native result code, when reported.
        native_code: Option<i32>,
    },

    /// SQL parse or execution failure, message verbatim from the engine.
    #[error("{message}")]
    Sql {
        /// Engine diagnostic text.
        message: String,
        /// Native result code, when reported.
        native_code: Option<i32>,
    },

    /// A native value with no caller-facing representation.
    #[error("unsupported type: {what}")]
    UnsupportedType {
        /// What could not be represented.
        what: String,
    },

    /// Worker fault caught at the dispatch boundary.
    #[error("internal error: {message}")]
    Internal {
        /// Fault description.
        message: String,
    },
}

impl TealError {
    /// The error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            TealError::Configuration { .. } => ErrorKind::Configuration,
            TealError::ConnectionClosed => ErrorKind::ConnectionClosed,
            TealError::EngineClosed => ErrorKind::EngineClosed,
            TealError::UntrustedExtension { .. } => ErrorKind::UntrustedExtension,
            TealError::ExtensionLoad { .. } => ErrorKind::ExtensionLoad,
            TealError::Sql { .. } => ErrorKind::Sql,
            TealError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            TealError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Numeric code for this error's kind.
    #[must_use]
    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// The native engine result code, when one was reported.
    #[must_use]
    pub fn native_code(&self) -> Option<i32> {
        match self {
            TealError::ExtensionLoad { native_code, .. } | TealError::Sql { native_code, .. } => {
                *native_code
            }
            _ => None,
        }
    }
}

impl From<EngineError> for TealError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Open(message) => TealError::Configuration { message },
            EngineError::Sql { message, code } => TealError::Sql {
                message,
                native_code: code,
            },
            EngineError::ModuleNotFound(path) => TealError::ExtensionLoad {
                message: format!("extension module '{path}' not found"),
                native_code: None,
            },
            EngineError::ModuleLoad(message) => TealError::ExtensionLoad {
                message,
                native_code: None,
            },
            EngineError::Unsupported(what) => TealError::UnsupportedType { what },
            EngineError::Session(message) => TealError::Internal { message },
        }
    }
}
