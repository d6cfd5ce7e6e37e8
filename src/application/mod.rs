// Application layer - use cases and orchestration.
// WasteLedgerService is the entry point for every client (CLI, import/export).

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
