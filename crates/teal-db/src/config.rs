//! Open options for an engine binding.

use crate::error::TealError;

/// Number of dispatcher workers when not configured.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Configuration for an [`crate::EngineBinding`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Whether unsigned extension modules may be loaded. Defaults to false:
    /// untrusted loads are rejected unless explicitly enabled.
    pub allow_unsigned_extensions: bool,
    /// Dispatcher worker pool size (bounds cross-connection parallelism).
    pub worker_threads: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            allow_unsigned_extensions: false,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl EngineOptions {
    /// Build options from string key/value pairs, the form host clients pass
    /// (e.g. `{"allow_unsigned_extensions": "true"}`).
    ///
    /// # Errors
    ///
    /// Returns [`TealError::Configuration`] for unrecognized keys or
    /// malformed values.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, TealError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.apply(key.as_ref(), value.as_ref())?;
        }
        Ok(options)
    }

    /// Apply one string option.
    ///
    /// # Errors
    ///
    /// Returns [`TealError::Configuration`] for unrecognized keys or
    /// malformed values.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), TealError> {
        match key {
            "allow_unsigned_extensions" => {
                self.allow_unsigned_extensions = parse_bool(key, value)?;
            }
            "worker_threads" => {
                let n: usize = value.parse().map_err(|_| TealError::Configuration {
                    message: format!("option '{key}': expected a positive integer, got '{value}'"),
                })?;
                if n == 0 {
                    return Err(TealError::Configuration {
                        message: format!("option '{key}' must be at least 1"),
                    });
                }
                self.worker_threads = n;
            }
            _ => {
                return Err(TealError::Configuration {
                    message: format!("unrecognized option '{key}'"),
                });
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, TealError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(TealError::Configuration {
            message: format!("option '{key}': expected a boolean, got '{value}'"),
        }),
    }
}
