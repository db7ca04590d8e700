//! Commands and their completion handles.

use tokio::sync::oneshot;

use crate::error::TealError;
use crate::extension::TrustMode;
use crate::marshal::{ResultSet, Value};

/// One queued unit of work on a connection.
#[derive(Debug, Clone)]
pub enum Command {
    /// Execute SQL for its effect; any produced rows are discarded by the
    /// caller-facing `exec` wrapper.
    Execute {
        /// Statement text.
        sql: String,
        /// Positional bind parameters.
        params: Vec<Value>,
    },
    /// Execute SQL and return all rows.
    Query {
        /// Statement text.
        sql: String,
        /// Positional bind parameters.
        params: Vec<Value>,
    },
    /// Load an extension module (privileged).
    LoadExtension {
        /// Module path or name, resolved by the binding's resolver.
        path: String,
        /// Trust policy for this load.
        trust: TrustMode,
    },
}

pub(crate) type CompletionSink = oneshot::Sender<Result<ResultSet, TealError>>;

/// Awaitable completion of a submitted command.
///
/// The dispatcher delivers exactly one result per command; per-connection
/// completion order equals submission order.
#[derive(Debug)]
pub struct CommandHandle {
    seq: u64,
    rx: oneshot::Receiver<Result<ResultSet, TealError>>,
}

impl CommandHandle {
    pub(crate) fn new(seq: u64, rx: oneshot::Receiver<Result<ResultSet, TealError>>) -> Self {
        Self { seq, rx }
    }

    /// Sequence number of the command within its connection.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    /// Await the command's completion.
    ///
    /// # Errors
    ///
    /// Returns the command's failure, or [`TealError::Internal`] if the
    /// completion sink was lost (dispatcher torn down mid-delivery).
    pub async fn wait(self) -> Result<ResultSet, TealError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(TealError::Internal {
                message: "command completion sink dropped".into(),
            }),
        }
    }

    /// Block the current thread on the command's completion. For callers
    /// outside an async runtime.
    ///
    /// # Errors
    ///
    /// Same contract as [`CommandHandle::wait`].
    pub fn wait_blocking(self) -> Result<ResultSet, TealError> {
        match self.rx.blocking_recv() {
            Ok(result) => result,
            Err(_) => Err(TealError::Internal {
                message: "command completion sink dropped".into(),
            }),
        }
    }
}
