//! Review latency extraction, ingestion and statistics

pub mod absences;
pub mod calendar;
pub mod events;
pub mod ingest;
pub mod intervals;
pub mod memory;
pub mod stats;
pub mod store;
pub mod sync;

#[cfg(test)]
mod calendar_test;
#[cfg(test)]
mod intervals_test;

pub use absences::{AbsenceRefresher, AbsenceSource, GapApiClient};
pub use calendar::Calendar;
pub use ingest::{IngestError, Ingestor, TickReport};
pub use memory::MemoryStore;
pub use stats::InsufficientData;
pub use store::{AbsenceStore, LatencyStore, PgStore, ReviewSource, Store};
pub use sync::{SyncConfig, SyncService};
