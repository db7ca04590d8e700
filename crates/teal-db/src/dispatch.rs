//! The command dispatcher: per-connection FIFO queues executed by a bounded
//! worker pool.
//!
//! Every logical connection owns a strictly ordered queue with at most one
//! command in flight. Workers pull the head command of any connection that
//! has ready work, execute it synchronously against that connection's engine
//! session, deliver the completion, and only then make the connection ready
//! again. Ready connections rotate through a FIFO ring, so scheduling across
//! connections is round-robin fair.
//!
//! A panic inside execution is caught at the dispatch boundary and delivered
//! as an `Internal` failure to that command's sink; the connection queue and
//! sibling workers are unaffected.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use fxhash::FxHashMap;
use parking_lot::{Condvar, Mutex};
use teal_engine::EngineSession;
use tracing::{debug, trace, warn};

use crate::command::{Command, CompletionSink};
use crate::error::TealError;
use crate::marshal::ResultSet;

/// Identifies one registered connection queue.
pub(crate) type ConnectionId = u64;

/// A command queued on a connection, with its completion sink.
pub(crate) struct QueuedCommand {
    pub seq: u64,
    pub command: Command,
    pub sink: CompletionSink,
}

/// Executes one command against an exclusively held engine session.
///
/// Implemented by the binding core; the dispatcher itself knows nothing
/// about SQL or extensions.
pub(crate) trait CommandExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        session: &mut dyn EngineSession,
        command: &Command,
    ) -> Result<ResultSet, TealError>;
}

struct ConnQueue {
    pending: VecDeque<QueuedCommand>,
    /// The engine session, present exactly when no command is in flight.
    session: Option<Box<dyn EngineSession>>,
    running: bool,
    closed: bool,
}

struct DispatchState {
    queues: FxHashMap<ConnectionId, ConnQueue>,
    /// Connections with ready work, in scheduling order. May contain stale
    /// ids; workers skip entries that are no longer runnable.
    ready: VecDeque<ConnectionId>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<DispatchState>,
    work_ready: Condvar,
    executor: Arc<dyn CommandExecutor>,
}

pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
    next_id: AtomicU64,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Start a dispatcher with `workers` OS threads.
    pub(crate) fn start(workers: usize, executor: Arc<dyn CommandExecutor>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(DispatchState {
                queues: FxHashMap::default(),
                ready: VecDeque::new(),
                shutdown: false,
            }),
            work_ready: Condvar::new(),
            executor,
        });
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("teal-worker-{i}"))
                .spawn(move || worker_loop(&shared))
                .expect("failed to spawn dispatcher worker");
            handles.push(handle);
        }
        debug!(workers, "dispatcher started");
        Self {
            shared,
            next_id: AtomicU64::new(1),
            workers: Mutex::new(handles),
        }
    }

    /// Register a connection queue around an engine session.
    pub(crate) fn register(
        &self,
        session: Box<dyn EngineSession>,
    ) -> Result<ConnectionId, TealError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut st = self.shared.state.lock();
        if st.shutdown {
            return Err(TealError::EngineClosed);
        }
        st.queues.insert(
            id,
            ConnQueue {
                pending: VecDeque::new(),
                session: Some(session),
                running: false,
                closed: false,
            },
        );
        trace!(conn = id, "connection registered");
        Ok(id)
    }

    /// Enqueue a command on a connection's queue.
    pub(crate) fn submit(&self, id: ConnectionId, cmd: QueuedCommand) -> Result<(), TealError> {
        let mut st = self.shared.state.lock();
        if st.shutdown {
            return Err(TealError::EngineClosed);
        }
        let Some(queue) = st.queues.get_mut(&id) else {
            return Err(TealError::ConnectionClosed);
        };
        if queue.closed {
            return Err(TealError::ConnectionClosed);
        }
        trace!(conn = id, seq = cmd.seq, "command queued");
        queue.pending.push_back(cmd);
        if !queue.running && queue.pending.len() == 1 {
            st.ready.push_back(id);
            self.shared.work_ready.notify_one();
        }
        Ok(())
    }

    /// Close one connection: reject further submissions, fail queued but
    /// undispatched commands with `ConnectionClosed`, and let the in-flight
    /// command (if any) finish.
    pub(crate) fn close_connection(&self, id: ConnectionId) {
        let mut st = self.shared.state.lock();
        let Some(queue) = st.queues.get_mut(&id) else {
            return;
        };
        queue.closed = true;
        let drained: Vec<QueuedCommand> = queue.pending.drain(..).collect();
        let remove = !queue.running;
        if remove {
            st.queues.remove(&id);
        }
        drop(st);
        for cmd in drained {
            let _ = cmd.sink.send(Err(TealError::ConnectionClosed));
        }
        trace!(conn = id, "connection closed");
    }

    /// Stop the dispatcher: fail all undispatched commands with
    /// `EngineClosed`, let in-flight commands finish and deliver, then join
    /// the workers.
    pub(crate) fn shutdown(&self) {
        let drained: Vec<QueuedCommand> = {
            let mut st = self.shared.state.lock();
            if st.shutdown {
                return;
            }
            st.shutdown = true;
            let mut drained = Vec::new();
            for queue in st.queues.values_mut() {
                queue.closed = true;
                drained.extend(queue.pending.drain(..));
            }
            st.queues.retain(|_, q| q.running);
            st.ready.clear();
            drained
        };
        for cmd in drained {
            let _ = cmd.sink.send(Err(TealError::EngineClosed));
        }
        self.shared.work_ready.notify_all();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if handle.join().is_err() {
                // Worker panics are caught per-command; this is a bug guard.
                warn!("dispatcher worker terminated abnormally");
            }
        }
        debug!("dispatcher stopped");
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Pop the next runnable (connection, command, session) triple, or `None`
/// if nothing is ready.
fn next_job(
    st: &mut DispatchState,
) -> Option<(ConnectionId, QueuedCommand, Box<dyn EngineSession>)> {
    while let Some(id) = st.ready.pop_front() {
        let Some(queue) = st.queues.get_mut(&id) else {
            continue;
        };
        if queue.running || queue.closed || queue.pending.is_empty() {
            continue;
        }
        let Some(session) = queue.session.take() else {
            continue;
        };
        let cmd = queue
            .pending
            .pop_front()
            .expect("ready queue head has pending work");
        queue.running = true;
        return Some((id, cmd, session));
    }
    None
}

fn worker_loop(shared: &Shared) {
    loop {
        let (id, cmd, mut session) = {
            let mut st = shared.state.lock();
            loop {
                if let Some(job) = next_job(&mut st) {
                    break job;
                }
                if st.shutdown {
                    return;
                }
                shared.work_ready.wait(&mut st);
            }
        };

        trace!(conn = id, seq = cmd.seq, "command dispatched");
        let result = run_one(shared.executor.as_ref(), session.as_mut(), &cmd.command);
        // Deliver before re-readying the queue so per-connection completion
        // order matches submission order.
        let _ = cmd.sink.send(result);

        let mut st = shared.state.lock();
        if let Some(queue) = st.queues.get_mut(&id) {
            queue.running = false;
            queue.session = Some(session);
            if queue.closed {
                if queue.pending.is_empty() {
                    st.queues.remove(&id);
                }
            } else if !queue.pending.is_empty() {
                st.ready.push_back(id);
                shared.work_ready.notify_one();
            }
        }
        if st.shutdown && st.ready.is_empty() {
            return;
        }
    }
}

fn run_one(
    executor: &dyn CommandExecutor,
    session: &mut dyn EngineSession,
    command: &Command,
) -> Result<ResultSet, TealError> {
    let outcome =
        std::panic::catch_unwind(AssertUnwindSafe(|| executor.execute(session, command)));
    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(panic = message, "command execution panicked");
            Err(TealError::Internal {
                message: format!("command execution panicked: {message}"),
            })
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
