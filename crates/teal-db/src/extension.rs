//! The extension loader: trust policy in front of the engine's module
//! registration.
//!
//! Loading runs as a dispatched command like any other work, so registry
//! mutation is never performed out-of-band. The loaded-name set is held
//! locked across resolve, policy check, and engine registration; concurrent
//! loads from different connections serialize here and the second load of a
//! module is an observable no-op.

use tracing::debug;

use crate::binding::EngineCore;
use crate::error::TealError;

/// Policy governing whether an unsigned module may be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustMode {
    /// Follow the binding's `allow_unsigned_extensions` option.
    #[default]
    Inherit,
    /// Reject unsigned modules regardless of binding options.
    RequireSigned,
    /// Accept unsigned modules regardless of binding options.
    AllowUnsigned,
}

pub(crate) fn load_module(
    core: &EngineCore,
    path: &str,
    trust: TrustMode,
) -> Result<(), TealError> {
    let mut loaded = core.loaded.lock();

    let manifest = core.resolver.resolve(path).map_err(TealError::from)?;

    if loaded.contains(manifest.name()) {
        debug!(module = manifest.name(), "module already loaded");
        return Ok(());
    }

    let allow_unsigned = match trust {
        TrustMode::AllowUnsigned => true,
        TrustMode::RequireSigned => false,
        TrustMode::Inherit => core.options.allow_unsigned_extensions,
    };
    if !manifest.is_signed() && !allow_unsigned {
        // Rejected before the engine is involved: nothing gets registered.
        return Err(TealError::UntrustedExtension {
            module: manifest.name().to_string(),
        });
    }

    core.engine.load_module(&manifest).map_err(TealError::from)?;
    loaded.insert(manifest.name().to_string());
    debug!(
        module = manifest.name(),
        version = manifest.version(),
        "extension loaded"
    );
    Ok(())
}
