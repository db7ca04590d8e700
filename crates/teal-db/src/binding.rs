//! The engine binding: the process-wide handle one application owns.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use fxhash::FxHashSet;
use parking_lot::Mutex;
use teal_engine::{AnalyticalEngine, EngineSession, ModuleResolver};
use tracing::debug;

use crate::builder::EngineBindingBuilder;
use crate::command::Command;
use crate::config::EngineOptions;
use crate::dispatch::{CommandExecutor, Dispatcher};
use crate::error::TealError;
use crate::extension::{self, TrustMode};
use crate::marshal::{self, ResultSet};
use crate::sql;

const STATE_OPEN: u8 = 0;
const STATE_CLOSED: u8 = 1;

/// Everything command execution needs: the engine, the module resolver, the
/// open options, and the loaded-module set. Shared between the binding and
/// the dispatcher workers.
pub(crate) struct EngineCore {
    pub(crate) engine: Arc<dyn AnalyticalEngine>,
    pub(crate) resolver: Arc<dyn ModuleResolver>,
    pub(crate) options: EngineOptions,
    pub(crate) loaded: Mutex<FxHashSet<String>>,
}

impl CommandExecutor for EngineCore {
    fn execute(
        &self,
        session: &mut dyn EngineSession,
        command: &Command,
    ) -> Result<ResultSet, TealError> {
        match command {
            Command::Execute { sql, params } | Command::Query { sql, params } => {
                // LOAD through the SQL surface is the privileged loader, not
                // a statement the engine sees.
                if let Some(path) = sql::parse_load(sql) {
                    extension::load_module(self, &path, TrustMode::Inherit)?;
                    return Ok(ResultSet::empty());
                }
                let native_params = marshal::unmarshal_params(params);
                let frame = session
                    .execute(sql, &native_params)
                    .map_err(TealError::from)?;
                marshal::marshal_frame(frame)
            }
            Command::LoadExtension { path, trust } => {
                extension::load_module(self, path, *trust)?;
                Ok(ResultSet::empty())
            }
        }
    }
}

pub(crate) struct BindingInner {
    pub(crate) core: Arc<EngineCore>,
    pub(crate) dispatcher: Dispatcher,
    state: AtomicU8,
}

impl BindingInner {
    pub(crate) fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_CLOSED
    }

    fn close(&self) {
        if self
            .state
            .compare_exchange(
                STATE_OPEN,
                STATE_CLOSED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }
        self.dispatcher.shutdown();
        debug!("engine binding closed");
    }
}

/// Handle to one embedded engine instance.
///
/// All connections opened from a binding share its engine, its loaded
/// extensions, and its dispatcher worker pool. The binding is owned by the
/// application that opened it; once closed, every dependent connection fails
/// further operations with `EngineClosed`.
///
/// # Example
///
/// ```rust,ignore
/// use teal_db::{EngineBinding, EngineOptions};
///
/// let binding = EngineBinding::open(":memory:", &EngineOptions::default())?;
/// let conn = Connection::open(&binding)?;
/// conn.exec("CREATE TABLE t (v INTEGER)").await?;
/// binding.close();
/// ```
pub struct EngineBinding {
    inner: Arc<BindingInner>,
}

impl EngineBinding {
    /// Open a binding for the engine at `path` with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`TealError::Configuration`] for an invalid path or
    /// malformed options.
    pub fn open(path: &str, options: &EngineOptions) -> Result<Self, TealError> {
        Self::builder().path(path).options(options.clone()).build()
    }

    /// Fluent construction: options, extension modules, custom engine.
    #[must_use]
    pub fn builder() -> EngineBindingBuilder {
        EngineBindingBuilder::new()
    }

    pub(crate) fn from_parts(
        engine: Arc<dyn AnalyticalEngine>,
        resolver: Arc<dyn ModuleResolver>,
        options: EngineOptions,
    ) -> Self {
        let core = Arc::new(EngineCore {
            engine,
            resolver,
            options: options.clone(),
            loaded: Mutex::new(FxHashSet::default()),
        });
        let dispatcher = Dispatcher::start(
            options.worker_threads,
            Arc::clone(&core) as Arc<dyn CommandExecutor>,
        );
        debug!(workers = options.worker_threads, "engine binding opened");
        Self {
            inner: Arc::new(BindingInner {
                core,
                dispatcher,
                state: AtomicU8::new(STATE_OPEN),
            }),
        }
    }

    /// The options this binding was opened with.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.inner.core.options
    }

    /// Names of the extension modules loaded so far, sorted.
    #[must_use]
    pub fn loaded_extensions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.core.loaded.lock().iter().cloned().collect();
        names.sort();
        names
    }

    /// Whether the binding has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Close the binding. Idempotent. In-flight commands finish and deliver;
    /// queued but undispatched commands fail with `EngineClosed`; every
    /// subsequent operation on a dependent connection fails with
    /// `EngineClosed`. Blocks until the worker pool has drained.
    pub fn close(&self) {
        self.inner.close();
    }

    pub(crate) fn inner(&self) -> Arc<BindingInner> {
        Arc::clone(&self.inner)
    }
}

impl std::fmt::Debug for EngineBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBinding")
            .field("closed", &self.is_closed())
            .field("options", &self.inner.core.options)
            .finish_non_exhaustive()
    }
}

impl Drop for EngineBinding {
    fn drop(&mut self) {
        self.inner.close();
    }
}
