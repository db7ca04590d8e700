//! Fluent builder for [`EngineBinding`] construction.

use std::sync::Arc;

use teal_engine::{AnalyticalEngine, ModuleManifest, ModuleResolver, SqliteEngine, StaticResolver};

use crate::binding::EngineBinding;
use crate::config::EngineOptions;
use crate::error::TealError;

/// Builder for an [`EngineBinding`].
///
/// # Example
///
/// ```rust,ignore
/// let binding = EngineBinding::builder()
///     .path(":memory:")
///     .option("allow_unsigned_extensions", "true")?
///     .module(teal_engine::modules::greet())
///     .build()?;
/// ```
pub struct EngineBindingBuilder {
    path: String,
    options: EngineOptions,
    modules: Vec<ModuleManifest>,
    resolver: Option<Arc<dyn ModuleResolver>>,
    engine: Option<Arc<dyn AnalyticalEngine>>,
}

impl EngineBindingBuilder {
    /// New builder targeting an in-memory engine with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: ":memory:".to_string(),
            options: EngineOptions::default(),
            modules: Vec::new(),
            resolver: None,
            engine: None,
        }
    }

    /// Engine path (`:memory:` or a filesystem path).
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Replace the options wholesale.
    #[must_use]
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply one string option pair, the form host clients pass.
    ///
    /// # Errors
    ///
    /// Returns [`TealError::Configuration`] for unrecognized keys or
    /// malformed values.
    pub fn option(mut self, key: &str, value: &str) -> Result<Self, TealError> {
        self.options.apply(key, value)?;
        Ok(self)
    }

    /// Allow or reject unsigned extension loads.
    #[must_use]
    pub fn allow_unsigned_extensions(mut self, allow: bool) -> Self {
        self.options.allow_unsigned_extensions = allow;
        self
    }

    /// Dispatcher worker pool size.
    #[must_use]
    pub fn worker_threads(mut self, workers: usize) -> Self {
        self.options.worker_threads = workers.max(1);
        self
    }

    /// Make an extension module resolvable by name for `LOAD`.
    #[must_use]
    pub fn module(mut self, manifest: ModuleManifest) -> Self {
        self.modules.push(manifest);
        self
    }

    /// Install a custom module resolver. Mutually exclusive with
    /// [`EngineBindingBuilder::module`].
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Install a custom engine instead of the SQLite reference engine.
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn AnalyticalEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the binding.
    ///
    /// # Errors
    ///
    /// Returns [`TealError::Configuration`] for an invalid engine path or
    /// conflicting resolver configuration.
    pub fn build(self) -> Result<EngineBinding, TealError> {
        let resolver: Arc<dyn ModuleResolver> = match self.resolver {
            Some(resolver) => {
                if !self.modules.is_empty() {
                    return Err(TealError::Configuration {
                        message: "both a custom resolver and registered modules were given"
                            .into(),
                    });
                }
                resolver
            }
            None => {
                let mut resolver = StaticResolver::new();
                for manifest in self.modules {
                    resolver.insert(manifest);
                }
                Arc::new(resolver)
            }
        };

        let engine: Arc<dyn AnalyticalEngine> = match self.engine {
            Some(engine) => engine,
            None => Arc::new(SqliteEngine::open(&self.path).map_err(TealError::from)?),
        };

        Ok(EngineBinding::from_parts(engine, resolver, self.options))
    }
}

impl std::fmt::Debug for EngineBindingBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBindingBuilder")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

impl Default for EngineBindingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
