//! Logical connections: strictly ordered sessions against a binding.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::binding::{BindingInner, EngineBinding};
use crate::command::{Command, CommandHandle};
use crate::dispatch::{ConnectionId, QueuedCommand};
use crate::error::TealError;
use crate::marshal::{ResultSet, Value};

/// A logical session against an [`EngineBinding`].
///
/// Commands submitted on one connection complete in exactly the order they
/// were submitted; commands on different connections may interleave freely.
/// At most one command from a connection executes against the engine at any
/// instant.
///
/// # Example
///
/// ```rust,ignore
/// let conn = Connection::open(&binding)?;
/// conn.exec("CREATE TABLE t (v INTEGER)").await?;
/// let rows = conn.query("SELECT v FROM t").await?;
/// ```
pub struct Connection {
    binding: Arc<BindingInner>,
    id: ConnectionId,
    seq: AtomicU64,
    closed: AtomicBool,
    last_error: Mutex<Option<TealError>>,
}

impl Connection {
    /// Open a connection against a binding.
    ///
    /// # Errors
    ///
    /// Returns [`TealError::EngineClosed`] if the binding has closed, or the
    /// engine's error if a session cannot be opened.
    pub fn open(binding: &EngineBinding) -> Result<Self, TealError> {
        let inner = binding.inner();
        if inner.is_closed() {
            return Err(TealError::EngineClosed);
        }
        let session = inner.core.engine.connect().map_err(TealError::from)?;
        let id = inner.dispatcher.register(session)?;
        debug!(conn = id, "connection opened");
        Ok(Self {
            binding: inner,
            id,
            seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            last_error: Mutex::new(None),
        })
    }

    /// Submit a command for asynchronous execution.
    ///
    /// The returned handle resolves to the command's result; submission
    /// itself never blocks on engine work.
    ///
    /// # Errors
    ///
    /// Returns [`TealError::ConnectionClosed`] or [`TealError::EngineClosed`]
    /// without enqueueing when this connection or its binding is closed.
    pub fn submit(&self, command: Command) -> Result<CommandHandle, TealError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(self.record(TealError::ConnectionClosed));
        }
        if self.binding.is_closed() {
            return Err(self.record(TealError::EngineClosed));
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.binding
            .dispatcher
            .submit(
                self.id,
                QueuedCommand {
                    seq,
                    command,
                    sink: tx,
                },
            )
            .map_err(|e| self.record(e))?;
        Ok(CommandHandle::new(seq, rx))
    }

    /// Execute SQL for its effect, discarding any rows.
    ///
    /// A lone `LOAD '<path>'` statement is routed to the extension loader.
    ///
    /// # Errors
    ///
    /// Returns the command's failure.
    pub async fn exec(&self, sql: &str) -> Result<(), TealError> {
        self.exec_with(sql, &[]).await
    }

    /// Execute SQL with bind parameters, discarding any rows.
    ///
    /// # Errors
    ///
    /// Returns the command's failure.
    pub async fn exec_with(&self, sql: &str, params: &[Value]) -> Result<(), TealError> {
        let handle = self.submit(Command::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        })?;
        match handle.wait().await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.record(e)),
        }
    }

    /// Execute SQL and return all rows.
    ///
    /// # Errors
    ///
    /// Returns the command's failure.
    pub async fn query(&self, sql: &str) -> Result<ResultSet, TealError> {
        self.query_with(sql, &[]).await
    }

    /// Execute SQL with bind parameters and return all rows.
    ///
    /// # Errors
    ///
    /// Returns the command's failure.
    pub async fn query_with(&self, sql: &str, params: &[Value]) -> Result<ResultSet, TealError> {
        let handle = self.submit(Command::Query {
            sql: sql.to_string(),
            params: params.to_vec(),
        })?;
        match handle.wait().await {
            Ok(rows) => Ok(rows),
            Err(e) => Err(self.record(e)),
        }
    }

    /// The most recent failure observed on this connection.
    #[must_use]
    pub fn last_error(&self) -> Option<TealError> {
        self.last_error.lock().clone()
    }

    /// Close the connection: the in-flight command (if any) finishes and
    /// delivers, queued but undispatched commands fail with
    /// `ConnectionClosed`, and further submissions are rejected. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.binding.dispatcher.close_connection(self.id);
        debug!(conn = self.id, "connection closed");
    }

    /// Whether this connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn record(&self, error: TealError) -> TealError {
        *self.last_error.lock() = Some(error.clone());
        error
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
