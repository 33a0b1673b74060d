//! Fetch, normalize, and persist regulatory updates from government APIs.
//!
//! One adapter per jurisdiction level (federal, state, local), a shared
//! normalized record shape, and a sequential orchestrator that turns a
//! [`regwatch_core::Config`] plus an open store into a run summary.

mod error;
mod federal;
mod http;
mod json;
mod local;
mod orchestrator;
mod source;
mod state;
mod window;

pub use error::{SyncError, UnmappableRecord};
pub use federal::FederalSource;
pub use local::LocalSource;
pub use orchestrator::{RunSummary, SourceReport, SourceStatus, run};
pub use source::Source;
pub use state::StateSource;
pub use window::FetchWindow;
