use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::errors::Result;
use crate::payments::Schedule;
use crate::types::{LoanId, LoanTerms};

/// memoized schedules keyed by loan id
///
/// Loans are immutable, so a cached schedule never goes stale; the only
/// invalidation is explicit eviction.
#[derive(Debug, Default)]
pub struct ScheduleCache {
    schedules: RwLock<HashMap<LoanId, Arc<Schedule>>>,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, loan_id: LoanId) -> Option<Arc<Schedule>> {
        self.schedules.read().get(&loan_id).cloned()
    }

    pub fn insert(&self, loan_id: LoanId, schedule: Arc<Schedule>) {
        self.schedules.write().insert(loan_id, schedule);
    }

    /// cached schedule, or generate and remember it
    pub fn get_or_generate(&self, loan_id: LoanId, terms: LoanTerms) -> Result<Arc<Schedule>> {
        if let Some(schedule) = self.get(loan_id) {
            debug!(loan_id = %loan_id, "schedule cache hit");
            return Ok(schedule);
        }

        let schedule = Arc::new(Schedule::generate(terms)?);
        // keep whichever schedule landed first
        let mut schedules = self.schedules.write();
        let entry = schedules.entry(loan_id).or_insert(schedule);
        Ok(Arc::clone(entry))
    }

    pub fn evict(&self, loan_id: LoanId) -> Option<Arc<Schedule>> {
        self.schedules.write().remove(&loan_id)
    }

    pub fn len(&self) -> usize {
        self.schedules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.read().is_empty()
    }
}
