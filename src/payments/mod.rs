pub mod amortization;
pub mod indexer;

pub use amortization::{validate_terms, AmortizationEngine, Schedule, ScheduleEntry};
pub use indexer::{LoanSummary, ScheduleIndexer};
