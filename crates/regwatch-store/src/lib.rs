//! Storage layer: the `regulations` table behind a single SQLite handle.

mod error;
pub use error::StoreError;

mod sqlite;
pub use sqlite::{BatchOutcome, RegulationFilter, RegulationStore, StoredRegulation, WriteFailure};
