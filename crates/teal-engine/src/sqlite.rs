//! SQLite-backed reference engine.
//!
//! `:memory:` (or an empty path) opens one shared in-process database; all
//! sessions multiplex onto a single native connection behind a mutex, since
//! a plain SQLite memory database is private to its connection. File paths
//! get one native connection per session, in WAL mode with a busy timeout,
//! so distinct sessions can genuinely run in parallel.
//!
//! Extension modules live in a shared [`FunctionRegistry`]. Each native
//! connection tracks the registry epoch it last synced; before executing a
//! statement the session re-registers any modules loaded since. The epoch is
//! bumped only after a module is fully inserted, so a statement sees either
//! none of a module's functions or all of them.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use tracing::debug;

use crate::engine::{AnalyticalEngine, EngineSession};
use crate::error::EngineError;
use crate::frame::{NativeColumn, NativeFrame};
use crate::module::{ModuleManifest, ScalarFunction};
use crate::value::{NativeType, NativeValue};

/// Version string of the linked SQLite library, e.g. `3.45.0`.
#[must_use]
pub fn linked_version() -> &'static str {
    rusqlite::version()
}

/// Shared registry of loaded modules plus a monotonically increasing epoch.
#[derive(Default)]
struct FunctionRegistry {
    modules: RwLock<Vec<ModuleManifest>>,
    epoch: AtomicU64,
}

impl FunctionRegistry {
    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn push(&self, manifest: ModuleManifest) {
        let mut modules = self.modules.write();
        modules.push(manifest);
        // Bump only once the module is fully visible in the snapshot.
        self.epoch.fetch_add(1, Ordering::Release);
    }

    fn snapshot(&self) -> (u64, Vec<ModuleManifest>) {
        let modules = self.modules.read();
        (self.epoch.load(Ordering::Acquire), modules.clone())
    }
}

/// A native connection plus the registry epoch it has synced to.
struct NativeConn {
    conn: rusqlite::Connection,
    synced_epoch: u64,
}

impl NativeConn {
    fn sync_functions(&mut self, registry: &FunctionRegistry) -> Result<(), EngineError> {
        if self.synced_epoch == registry.epoch() {
            return Ok(());
        }
        let (epoch, modules) = registry.snapshot();
        for module in &modules {
            for func in module.functions() {
                register_function(&self.conn, func)?;
            }
        }
        self.synced_epoch = epoch;
        Ok(())
    }

    fn execute(
        &mut self,
        registry: &FunctionRegistry,
        sql: &str,
        params: &[NativeValue],
    ) -> Result<NativeFrame, EngineError> {
        self.sync_functions(registry)?;
        run_statement(&self.conn, sql, params)
    }
}

enum Backend {
    Memory(Arc<Mutex<NativeConn>>),
    File(PathBuf),
}

/// The SQLite reference engine.
pub struct SqliteEngine {
    backend: Backend,
    registry: Arc<FunctionRegistry>,
}

impl SqliteEngine {
    /// Open an engine instance. `:memory:` or an empty path opens a shared
    /// in-process database; anything else is treated as a filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Open`] when the path cannot be opened.
    pub fn open(path: &str) -> Result<Self, EngineError> {
        let backend = if path.is_empty() || path == ":memory:" {
            let conn = rusqlite::Connection::open_in_memory()
                .map_err(|e| EngineError::Open(e.to_string()))?;
            Backend::Memory(Arc::new(Mutex::new(NativeConn {
                conn,
                synced_epoch: 0,
            })))
        } else {
            // Probe eagerly so a bad path fails at open, not at first use.
            let probe =
                open_file_conn(path).map_err(|e| EngineError::Open(e.to_string()))?;
            drop(probe);
            Backend::File(PathBuf::from(path))
        };
        debug!(path, "sqlite engine opened");
        Ok(Self {
            backend,
            registry: Arc::new(FunctionRegistry::default()),
        })
    }
}

impl std::fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("SqliteEngine");
        match &self.backend {
            Backend::Memory(_) => s.field("path", &":memory:"),
            Backend::File(path) => s.field("path", path),
        };
        s.finish_non_exhaustive()
    }
}

impl AnalyticalEngine for SqliteEngine {
    fn connect(&self) -> Result<Box<dyn EngineSession>, EngineError> {
        match &self.backend {
            Backend::Memory(shared) => Ok(Box::new(SqliteSession::Shared {
                conn: Arc::clone(shared),
                registry: Arc::clone(&self.registry),
            })),
            Backend::File(path) => {
                let conn = open_file_conn(path.to_string_lossy().as_ref())?;
                Ok(Box::new(SqliteSession::Owned {
                    conn: NativeConn {
                        conn,
                        synced_epoch: 0,
                    },
                    registry: Arc::clone(&self.registry),
                }))
            }
        }
    }

    fn load_module(&self, manifest: &ModuleManifest) -> Result<(), EngineError> {
        // Validate registration eagerly against one live connection so a
        // broken module surfaces at load time, not at first call.
        match &self.backend {
            Backend::Memory(shared) => {
                let guard = shared.lock();
                for func in manifest.functions() {
                    register_function(&guard.conn, func)?;
                }
            }
            Backend::File(path) => {
                let conn = open_file_conn(path.to_string_lossy().as_ref())?;
                for func in manifest.functions() {
                    register_function(&conn, func)?;
                }
            }
        }
        self.registry.push(manifest.clone());
        debug!(module = manifest.name(), "module registered");
        Ok(())
    }
}

enum SqliteSession {
    Shared {
        conn: Arc<Mutex<NativeConn>>,
        registry: Arc<FunctionRegistry>,
    },
    Owned {
        conn: NativeConn,
        registry: Arc<FunctionRegistry>,
    },
}

impl EngineSession for SqliteSession {
    fn execute(&mut self, sql: &str, params: &[NativeValue]) -> Result<NativeFrame, EngineError> {
        match self {
            SqliteSession::Shared { conn, registry } => {
                let mut guard = conn.lock();
                guard.execute(registry, sql, params)
            }
            SqliteSession::Owned { conn, registry } => conn.execute(registry, sql, params),
        }
    }
}

fn open_file_conn(path: &str) -> Result<rusqlite::Connection, EngineError> {
    let conn = rusqlite::Connection::open(path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    // journal_mode returns a row, so it cannot go through execute().
    conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
    Ok(conn)
}

fn register_function(
    conn: &rusqlite::Connection,
    func: &ScalarFunction,
) -> Result<(), EngineError> {
    let n_arg = i32::try_from(func.arity())
        .map_err(|_| EngineError::ModuleLoad(format!("function '{}': bad arity", func.name())))?;
    let body = Arc::clone(func.body());
    conn.create_scalar_function(
        func.name(),
        n_arg,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let mut args = Vec::with_capacity(ctx.len());
            for i in 0..ctx.len() {
                args.push(value_ref_to_native(ctx.get_raw(i)));
            }
            let out = body(&args)
                .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
            native_to_sql(&out).map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))
        },
    )
    .map_err(|e| EngineError::ModuleLoad(e.to_string()))
}

fn value_ref_to_native(value: ValueRef<'_>) -> NativeValue {
    match value {
        ValueRef::Null => NativeValue::Null,
        ValueRef::Integer(v) => NativeValue::Integer(v),
        ValueRef::Real(v) => NativeValue::Float(v),
        ValueRef::Text(t) => NativeValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => NativeValue::Blob(b.to_vec()),
    }
}

fn native_to_sql(value: &NativeValue) -> Result<rusqlite::types::Value, EngineError> {
    match value {
        NativeValue::Null => Ok(rusqlite::types::Value::Null),
        NativeValue::Integer(v) => Ok(rusqlite::types::Value::Integer(*v)),
        NativeValue::Float(v) => Ok(rusqlite::types::Value::Real(*v)),
        NativeValue::Text(v) => Ok(rusqlite::types::Value::Text(v.clone())),
        NativeValue::Boolean(v) => Ok(rusqlite::types::Value::Integer(i64::from(*v))),
        NativeValue::Blob(v) => Ok(rusqlite::types::Value::Blob(v.clone())),
        NativeValue::List(_) | NativeValue::Struct(_) => Err(EngineError::Unsupported(
            format!("cannot bind {} value", value.type_tag().name()),
        )),
    }
}

fn decl_to_native(decl: &str) -> NativeType {
    let upper = decl.to_ascii_uppercase();
    if upper.contains("BOOL") {
        NativeType::Boolean
    } else if upper.contains("INT") {
        NativeType::Integer
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        NativeType::Text
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        NativeType::Float
    } else if upper.contains("BLOB") {
        NativeType::Blob
    } else {
        NativeType::Any
    }
}

fn run_statement(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[NativeValue],
) -> Result<NativeFrame, EngineError> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let mut types: Vec<NativeType> = stmt
        .columns()
        .iter()
        .map(|c| c.decl_type().map_or(NativeType::Any, decl_to_native))
        .collect();

    let mut bound = Vec::with_capacity(params.len());
    for p in params {
        bound.push(native_to_sql(p)?);
    }

    let mut raw_rows: Vec<Vec<NativeValue>> = Vec::new();
    let mut rows = stmt.query(rusqlite::params_from_iter(bound))?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(names.len());
        for (i, ty) in types.iter().enumerate() {
            let mut value = value_ref_to_native(row.get_ref(i)?);
            if *ty == NativeType::Boolean {
                if let NativeValue::Integer(v) = value {
                    value = NativeValue::Boolean(v != 0);
                }
            }
            values.push(value);
        }
        raw_rows.push(values);
    }

    // Untyped expression columns: infer the tag from the first non-null value.
    for (i, ty) in types.iter_mut().enumerate() {
        if *ty == NativeType::Any {
            if let Some(v) = raw_rows.iter().map(|r| &r[i]).find(|v| !v.is_null()) {
                *ty = v.type_tag();
            }
        }
    }

    let columns = names
        .into_iter()
        .zip(types)
        .map(|(name, ty)| NativeColumn::new(name, ty))
        .collect();
    let mut frame = NativeFrame::new(columns);
    for row in raw_rows {
        frame.push_row(row);
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_engine() -> SqliteEngine {
        SqliteEngine::open(":memory:").unwrap()
    }

    #[test]
    fn open_bad_path_fails() {
        let err = SqliteEngine::open("/nonexistent-dir/teal/db.sqlite").unwrap_err();
        assert!(matches!(err, EngineError::Open(_)));
    }

    #[test]
    fn engine_debug_names_the_backend() {
        let engine = memory_engine();
        assert!(format!("{engine:?}").contains(":memory:"));
    }

    #[test]
    fn execute_and_read_back() {
        let engine = memory_engine();
        let mut session = engine.connect().unwrap();
        session
            .execute("CREATE TABLE t (id INTEGER, name TEXT, flag BOOLEAN)", &[])
            .unwrap();
        session
            .execute(
                "INSERT INTO t VALUES (?1, ?2, ?3)",
                &[
                    NativeValue::Integer(7),
                    NativeValue::Text("sam".into()),
                    NativeValue::Boolean(true),
                ],
            )
            .unwrap();
        let frame = session.execute("SELECT id, name, flag FROM t", &[]).unwrap();
        assert_eq!(frame.num_rows(), 1);
        assert_eq!(frame.columns()[0].ty, NativeType::Integer);
        assert_eq!(frame.columns()[2].ty, NativeType::Boolean);
        assert_eq!(
            frame.rows()[0],
            vec![
                NativeValue::Integer(7),
                NativeValue::Text("sam".into()),
                NativeValue::Boolean(true),
            ]
        );
    }

    #[test]
    fn sql_error_is_verbatim() {
        let engine = memory_engine();
        let mut session = engine.connect().unwrap();
        let err = session.execute("SELECT * FROM missing", &[]).unwrap_err();
        match err {
            EngineError::Sql { message, .. } => assert!(message.contains("missing")),
            other => panic!("expected Sql error, got {other:?}"),
        }
    }

    #[test]
    fn sessions_share_memory_database() {
        let engine = memory_engine();
        let mut a = engine.connect().unwrap();
        let mut b = engine.connect().unwrap();
        a.execute("CREATE TABLE shared (v INTEGER)", &[]).unwrap();
        a.execute("INSERT INTO shared VALUES (1)", &[]).unwrap();
        let frame = b.execute("SELECT v FROM shared", &[]).unwrap();
        assert_eq!(frame.num_rows(), 1);
    }

    #[test]
    fn module_functions_visible_to_existing_sessions() {
        let engine = memory_engine();
        let mut session = engine.connect().unwrap();
        let module = ModuleManifest::new("shout").scalar("shout", 1, |args| {
            match args.first() {
                Some(NativeValue::Text(s)) => Ok(NativeValue::Text(s.to_uppercase())),
                _ => Err(EngineError::Unsupported("shout: expected text".into())),
            }
        });
        engine.load_module(&module).unwrap();
        let frame = session.execute("SELECT shout('hi') AS v", &[]).unwrap();
        assert_eq!(frame.rows()[0][0], NativeValue::Text("HI".into()));
    }

    #[test]
    fn function_error_surfaces_as_sql_error() {
        let engine = memory_engine();
        let module = ModuleManifest::new("boom")
            .scalar("boom", 0, |_| Err(EngineError::Unsupported("boom".into())));
        engine.load_module(&module).unwrap();
        let mut session = engine.connect().unwrap();
        let err = session.execute("SELECT boom()", &[]).unwrap_err();
        assert!(matches!(err, EngineError::Sql { .. }));
    }

    #[test]
    fn file_backend_sessions_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let engine = SqliteEngine::open(path.to_str().unwrap()).unwrap();
        let mut a = engine.connect().unwrap();
        let mut b = engine.connect().unwrap();
        a.execute("CREATE TABLE t (v INTEGER)", &[]).unwrap();
        a.execute("INSERT INTO t VALUES (42)", &[]).unwrap();
        let frame = b.execute("SELECT v FROM t", &[]).unwrap();
        assert_eq!(frame.rows()[0][0], NativeValue::Integer(42));
    }

    #[test]
    fn nested_params_are_rejected() {
        let engine = memory_engine();
        let mut session = engine.connect().unwrap();
        let err = session
            .execute("SELECT ?1", &[NativeValue::List(vec![])])
            .unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
    }
}
