//! Synchronous engine seam for `teal`.
//!
//! The client layer in `teal-db` never talks to a query engine directly; it
//! goes through the traits defined here. An [`AnalyticalEngine`] hands out
//! [`EngineSession`]s, each of which executes SQL synchronously and returns a
//! raw [`NativeFrame`]. Engine calls are not reentrant and not safe for
//! concurrent use on the same session, so a session is only ever driven by
//! one caller at a time.
//!
//! A reference engine backed by SQLite ([`SqliteEngine`]) is included, along
//! with the extension-module model ([`ModuleManifest`], [`ModuleResolver`])
//! that lets modules register scalar functions into the engine's SQL
//! namespace.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod engine;
mod error;
mod frame;
mod module;
pub mod modules;
mod sqlite;
mod value;

pub use engine::{AnalyticalEngine, EngineSession};
pub use error::EngineError;
pub use frame::{NativeColumn, NativeFrame};
pub use module::{ModuleManifest, ModuleResolver, ScalarFn, ScalarFunction, StaticResolver};
pub use sqlite::{linked_version, SqliteEngine};
pub use value::{NativeType, NativeValue};
