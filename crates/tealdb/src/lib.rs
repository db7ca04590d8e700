//! # teal
//!
//! An asynchronous client layer for embedded analytical engines.
//!
//! Applications open an [`EngineBinding`], open logical [`Connection`]s
//! against it, and submit SQL without ever blocking their own control flow:
//! per-connection command queues guarantee strict submission-order
//! completion, while a bounded worker pool runs distinct connections
//! concurrently. Extension modules loaded with `LOAD '<path>'` register
//! functions visible to every connection of the binding.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tealdb::{Connection, EngineBinding};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let binding = EngineBinding::builder()
//!         .path(":memory:")
//!         .allow_unsigned_extensions(true)
//!         .module(tealdb::engine::modules::greet())
//!         .build()?;
//!
//!     let conn = Connection::open(&binding)?;
//!     conn.exec("LOAD 'greet'").await?;
//!     let rows = conn.query("SELECT greet('Sam') AS value").await?;
//!     println!("{:?}", rows.row(0).unwrap().get("value"));
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export the client layer
pub use teal_db::*;
