//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod dedup;
pub mod history;
pub mod import;
pub mod logging;
pub mod migration;
pub mod session;
mod status;

pub use dedup::{DetectorConfig, DuplicateDetector, DuplicateMatch, MatchStrength};
pub use history::{file_checksum, ImportHistoryService, ImportRecord};
pub use import::{ImportPreview, ImportService};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use session::{CommitFailure, CommitReport, ImportSession, SessionState};
pub use status::{DateRange, StatusService, StatusSummary};
