//! Business logic services
//!
//! Services own the per-session state and coordinate between the remote
//! store, the analysis service and the shared domain logic.

pub mod chat;
pub mod ingest;
pub mod session;
pub mod store;

pub use chat::ChatService;
pub use ingest::IngestService;
pub use session::{SessionEvent, SessionManager, SessionRegistry, SessionState};
pub use store::{LoadOutcome, PersistOutcome, ReportStore, StoreError};
