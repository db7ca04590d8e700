//! Asynchronous client layer for an embedded analytical engine.
//!
//! `teal-db` sits between an application and a synchronous, in-process query
//! engine. Applications open an [`EngineBinding`], open any number of
//! [`Connection`]s against it, and submit SQL without blocking: each
//! connection owns a strictly ordered command queue, a bounded worker pool
//! executes the queue heads concurrently across connections, and results are
//! delivered through awaitable handles.
//!
//! Extension modules are loaded through the privileged `LOAD '<path>'`
//! statement (or [`Command::LoadExtension`]), gated by a signed/unsigned
//! trust policy, and register functions visible to every connection of the
//! binding.
//!
//! # Example
//!
//! ```rust,ignore
//! use teal_db::{Connection, EngineBinding};
//!
//! let binding = EngineBinding::builder()
//!     .path(":memory:")
//!     .allow_unsigned_extensions(true)
//!     .module(teal_engine::modules::greet())
//!     .build()?;
//!
//! let conn = Connection::open(&binding)?;
//! conn.exec("LOAD 'greet'").await?;
//! let rows = conn.query("SELECT greet('Sam') AS value").await?;
//! assert_eq!(rows.row(0).unwrap().get("value").unwrap().as_str(), Some("Hello Sam"));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod binding;
mod builder;
mod command;
mod config;
mod connection;
mod dispatch;
mod error;
mod extension;
mod marshal;
mod sql;

pub use binding::EngineBinding;
pub use builder::EngineBindingBuilder;
pub use command::{Command, CommandHandle};
pub use config::{EngineOptions, DEFAULT_WORKER_THREADS};
pub use connection::Connection;
pub use error::{codes, ErrorKind, TealError};
pub use extension::TrustMode;
pub use marshal::{marshal_frame, unmarshal_params, Column, ResultSet, Row, Value, ValueType};

// The engine seam, re-exported for custom engines and modules.
pub use teal_engine as engine;
