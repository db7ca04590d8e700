//! Built-in extension modules.
//!
//! These mirror what a real out-of-process extension would register and are
//! used by examples and tests. They ship unsigned; callers that want them
//! treated as trusted mark the manifest with [`ModuleManifest::signed`].

use crate::error::EngineError;
use crate::module::ModuleManifest;
use crate::sqlite::linked_version;
use crate::value::NativeValue;

fn text_arg(args: &[NativeValue], idx: usize, func: &str) -> Result<String, EngineError> {
    match args.get(idx) {
        Some(NativeValue::Text(s)) => Ok(s.clone()),
        other => Err(EngineError::Unsupported(format!(
            "{func}: expected text argument, got {}",
            other.map_or("nothing", |v| v.type_tag().name())
        ))),
    }
}

/// The `greet` module: `greet(name)` returns `Hello <name>`, and
/// `greet_version(name)` returns a greeting that reports the linked SQLite
/// version, always starting with
/// `Hello <name>, my linked SQLite version is 3.`.
#[must_use]
pub fn greet() -> ModuleManifest {
    ModuleManifest::new("greet")
        .with_version(linked_version())
        .scalar("greet", 1, |args| {
            let name = text_arg(args, 0, "greet")?;
            Ok(NativeValue::Text(format!("Hello {name}")))
        })
        .scalar("greet_version", 1, |args| {
            let name = text_arg(args, 0, "greet_version")?;
            Ok(NativeValue::Text(format!(
                "Hello {name}, my linked SQLite version is {}",
                linked_version()
            )))
        })
}
