pub mod access;
pub mod cache;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod ledger;
pub mod payments;
pub mod serialization;
pub mod storage;
pub mod types;

// re-export key types
pub use access::{AccessController, ShareGrant};
pub use cache::ScheduleCache;
pub use config::LedgerConfig;
pub use decimal::{Money, Rate};
pub use errors::{Entity, ErrorKind, LoanError, Result};
pub use events::{Event, EventStore};
pub use interest::RateConverter;
pub use ledger::LoanLedger;
pub use payments::{
    AmortizationEngine, LoanSummary, Schedule, ScheduleEntry, ScheduleIndexer,
};
pub use storage::{InMemoryStore, LoanStore};
pub use types::{
    Loan, LoanAccess, LoanId, LoanTerms, ResharePolicy, Share, User, UserId, VisibleLoan,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
