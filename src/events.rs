use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, UserId};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    UserRegistered {
        user_id: UserId,
        name: String,
        timestamp: DateTime<Utc>,
    },
    LoanCreated {
        loan_id: LoanId,
        owner_id: UserId,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
        level_payment: Money,
        timestamp: DateTime<Utc>,
    },
    LoanShared {
        loan_id: LoanId,
        owner_id: UserId,
        grantee_id: UserId,
        timestamp: DateTime<Utc>,
    },
    ShareRevoked {
        loan_id: LoanId,
        owner_id: UserId,
        grantee_id: UserId,
        timestamp: DateTime<Utc>,
    },
    AccessDenied {
        loan_id: LoanId,
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> Option<LoanId> {
        match self {
            Event::UserRegistered { .. } => None,
            Event::LoanCreated { loan_id, .. }
            | Event::LoanShared { loan_id, .. }
            | Event::ShareRevoked { loan_id, .. }
            | Event::AccessDenied { loan_id, .. } => Some(*loan_id),
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
