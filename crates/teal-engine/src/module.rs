//! Extension module model: manifests of scalar functions plus resolution
//! from a load path to a manifest.

use std::panic::RefUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use fxhash::FxHashMap;

use crate::error::EngineError;
use crate::value::NativeValue;

/// A scalar function body. Must be unwind-safe because engines may invoke it
/// from within native callback frames.
pub type ScalarFn =
    Arc<dyn Fn(&[NativeValue]) -> Result<NativeValue, EngineError> + Send + Sync + RefUnwindSafe>;

/// One scalar function an extension module registers.
#[derive(Clone)]
pub struct ScalarFunction {
    name: String,
    arity: usize,
    func: ScalarFn,
}

impl ScalarFunction {
    /// Create a scalar function with a fixed argument count.
    pub fn new<F>(name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&[NativeValue]) -> Result<NativeValue, EngineError>
            + Send
            + Sync
            + RefUnwindSafe
            + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    /// SQL-visible function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed argument count.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// The function body.
    #[must_use]
    pub fn body(&self) -> &ScalarFn {
        &self.func
    }
}

impl std::fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Everything an extension module declares: its name, a version string, a
/// signed flag, and the scalar functions it registers.
#[derive(Debug, Clone)]
pub struct ModuleManifest {
    name: String,
    version: String,
    signed: bool,
    functions: Vec<ScalarFunction>,
}

impl ModuleManifest {
    /// Create an unsigned manifest with no functions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            signed: false,
            functions: Vec::new(),
        }
    }

    /// Set the module version string.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Mark the module as signed (trusted regardless of the unsigned-load
    /// policy).
    #[must_use]
    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Add a scalar function.
    #[must_use]
    pub fn scalar<F>(mut self, name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&[NativeValue]) -> Result<NativeValue, EngineError>
            + Send
            + Sync
            + RefUnwindSafe
            + 'static,
    {
        self.functions.push(ScalarFunction::new(name, arity, func));
        self
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the module is signed.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// The functions this module registers.
    #[must_use]
    pub fn functions(&self) -> &[ScalarFunction] {
        &self.functions
    }
}

/// Resolves a `LOAD` path to a module manifest.
pub trait ModuleResolver: Send + Sync {
    /// Resolve `path` to a manifest.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ModuleNotFound`] when nothing matches.
    fn resolve(&self, path: &str) -> Result<ModuleManifest, EngineError>;
}

/// Resolver over a fixed set of registered manifests.
///
/// Lookup tries the path verbatim first, then its file stem, so both
/// `LOAD 'greet'` and `LOAD '/opt/modules/greet.mod'` find a module
/// registered as `greet`.
#[derive(Debug, Default)]
pub struct StaticResolver {
    modules: FxHashMap<String, ModuleManifest>,
}

impl StaticResolver {
    /// Empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manifest under its module name, replacing any previous
    /// registration of the same name.
    pub fn insert(&mut self, manifest: ModuleManifest) {
        self.modules.insert(manifest.name().to_string(), manifest);
    }
}

impl ModuleResolver for StaticResolver {
    fn resolve(&self, path: &str) -> Result<ModuleManifest, EngineError> {
        if let Some(m) = self.modules.get(path) {
            return Ok(m.clone());
        }
        if let Some(stem) = Path::new(path).file_stem().and_then(|s| s.to_str()) {
            if let Some(m) = self.modules.get(stem) {
                return Ok(m.clone());
            }
        }
        Err(EngineError::ModuleNotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str) -> ModuleManifest {
        ModuleManifest::new(name).scalar("f", 0, |_| Ok(NativeValue::Null))
    }

    #[test]
    fn resolve_exact_name() {
        let mut r = StaticResolver::new();
        r.insert(manifest("greet"));
        assert_eq!(r.resolve("greet").unwrap().name(), "greet");
    }

    #[test]
    fn resolve_by_file_stem() {
        let mut r = StaticResolver::new();
        r.insert(manifest("greet"));
        let m = r.resolve("/opt/modules/greet.mod").unwrap();
        assert_eq!(m.name(), "greet");
    }

    #[test]
    fn unresolved_path_is_not_found() {
        let r = StaticResolver::new();
        assert!(matches!(
            r.resolve("missing"),
            Err(EngineError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn manifest_defaults_unsigned() {
        let m = ModuleManifest::new("m");
        assert!(!m.is_signed());
        assert!(m.signed(true).is_signed());
    }
}
