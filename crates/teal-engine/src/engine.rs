//! The engine traits: the seam between the client layer and a query engine.

use crate::error::EngineError;
use crate::frame::NativeFrame;
use crate::module::ModuleManifest;
use crate::value::NativeValue;

/// An embedded analytical engine instance.
///
/// The instance owns everything global: loaded extension modules and any
/// shared storage. Sessions created from it share that global state; a
/// module loaded through [`AnalyticalEngine::load_module`] becomes callable
/// from every session, including sessions that already existed at load time.
pub trait AnalyticalEngine: Send + Sync {
    /// Open a new session against this instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot allocate a session.
    fn connect(&self) -> Result<Box<dyn EngineSession>, EngineError>;

    /// Register an extension module's functions globally.
    ///
    /// Registration is atomic with respect to sessions: a statement either
    /// sees none of the module's functions or all of them.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails at the native level.
    fn load_module(&self, manifest: &ModuleManifest) -> Result<(), EngineError>;
}

/// One synchronous engine session.
///
/// A session is not reentrant and not safe for concurrent use; the caller
/// must hold it exclusively for the duration of each call. The dispatcher in
/// `teal-db` enforces this by keeping at most one command in flight per
/// logical connection.
pub trait EngineSession: Send {
    /// Execute one SQL statement with positional bind parameters and return
    /// the raw result frame. Statements that produce no rows return an
    /// empty frame.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Sql`] for parse/execution failures and
    /// [`EngineError::Unsupported`] for parameters the engine cannot bind.
    fn execute(&mut self, sql: &str, params: &[NativeValue]) -> Result<NativeFrame, EngineError>;
}
