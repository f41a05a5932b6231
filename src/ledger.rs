use std::collections::HashSet;
use std::sync::Arc;

use hourglass_rs::{SafeTimeProvider, TimeSource};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access::{AccessController, ShareGrant};
use crate::cache::ScheduleCache;
use crate::config::LedgerConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::payments::{AmortizationEngine, LoanSummary, Schedule, ScheduleEntry, ScheduleIndexer};
use crate::storage::LoanStore;
use crate::types::{Loan, LoanId, LoanTerms, Share, User, UserId, VisibleLoan};

/// loan service: every client-facing operation, access-checked
pub struct LoanLedger<S: LoanStore> {
    store: S,
    config: LedgerConfig,
    access: AccessController,
    engine: AmortizationEngine,
    cache: ScheduleCache,
    time: SafeTimeProvider,
    events: Mutex<EventStore>,
}

impl<S: LoanStore> LoanLedger<S> {
    /// create a ledger over a store
    pub fn new(store: S, config: LedgerConfig, time: SafeTimeProvider) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            access: AccessController::new(config.reshare_policy),
            config,
            engine: AmortizationEngine::new(),
            cache: ScheduleCache::new(),
            time,
            events: Mutex::new(EventStore::new()),
        })
    }

    /// create a ledger stamped with system time
    pub fn with_system_time(store: S, config: LedgerConfig) -> Result<Self> {
        Self::new(store, config, SafeTimeProvider::new(TimeSource::System))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// register a user under a fresh id
    pub fn register_user(&self, name: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoanError::InvalidUser {
                message: "name must not be empty".to_string(),
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: self.time.now(),
        };
        self.store.insert_user(user.clone())?;

        info!(user_id = %user.id, name = %user.name, "user registered");
        self.emit(Event::UserRegistered {
            user_id: user.id,
            name: user.name.clone(),
            timestamp: user.created_at,
        });

        Ok(user)
    }

    pub fn get_user(&self, user_id: UserId) -> Result<User> {
        self.store.get_user(user_id)
    }

    /// create a loan after checking its terms produce a valid schedule
    pub fn create_loan(
        &self,
        owner_id: UserId,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
    ) -> Result<Loan> {
        self.store.get_user(owner_id)?;

        if term_months > self.config.max_term_months {
            return Err(LoanError::InvalidLoanTerms {
                message: format!(
                    "term of {} months exceeds maximum of {}",
                    term_months, self.config.max_term_months
                ),
            });
        }

        let terms = LoanTerms::new(principal, annual_rate, term_months);
        let schedule = self.engine.compute(terms)?;

        let loan = Loan {
            id: Uuid::new_v4(),
            owner_id,
            principal,
            annual_rate,
            term_months,
            created_at: self.time.now(),
        };
        self.store.insert_loan(loan.clone())?;

        info!(
            loan_id = %loan.id,
            owner_id = %owner_id,
            principal = %principal,
            annual_rate = %annual_rate,
            term_months,
            "loan created"
        );
        self.emit(Event::LoanCreated {
            loan_id: loan.id,
            owner_id,
            principal,
            annual_rate,
            term_months,
            level_payment: schedule.level_payment,
            timestamp: loan.created_at,
        });

        if self.config.cache_schedules {
            self.cache.insert(loan.id, Arc::new(schedule));
        }

        Ok(loan)
    }

    /// fetch a loan the requester may view
    pub fn get_loan(&self, loan_id: LoanId, requester: UserId) -> Result<Loan> {
        self.authorize_read(loan_id, requester)
    }

    /// full schedule of a loan the requester may view
    pub fn get_schedule(&self, loan_id: LoanId, requester: UserId) -> Result<Arc<Schedule>> {
        let loan = self.authorize_read(loan_id, requester)?;
        self.schedule_for(&loan)
    }

    /// single month's entry of a loan the requester may view
    pub fn get_month_summary(
        &self,
        loan_id: LoanId,
        month: u32,
        requester: UserId,
    ) -> Result<ScheduleEntry> {
        let schedule = self.get_schedule(loan_id, requester)?;
        ScheduleIndexer::entry_for_month(&schedule, month).cloned()
    }

    /// balance and running totals as of a month
    pub fn get_loan_summary(
        &self,
        loan_id: LoanId,
        month: u32,
        requester: UserId,
    ) -> Result<LoanSummary> {
        let schedule = self.get_schedule(loan_id, requester)?;
        ScheduleIndexer::summary_for_month(&schedule, month)
    }

    /// loans the user owns or has been shared on
    pub fn list_loans_for(&self, user_id: UserId) -> Result<Vec<VisibleLoan>> {
        self.store.get_user(user_id)?;
        let owned = self.store.list_loans_owned_by(user_id)?;
        let shared = self.store.list_loans_shared_with(user_id)?;
        Ok(self.access.visible_loans(user_id, owned, shared))
    }

    /// grant another user view access to a loan
    pub fn share_loan(&self, owner_id: UserId, loan_id: LoanId, grantee_id: UserId) -> Result<Share> {
        let loan = self.store.get_loan(loan_id)?;
        self.access.ensure_owner(owner_id, &loan)?;
        self.store.get_user(grantee_id)?;
        let existing = self.store.list_shares(loan_id)?;

        let grant = self
            .access
            .share_loan(owner_id, &loan, grantee_id, &existing, self.time.now())?;

        let share = match grant {
            ShareGrant::Created(share) => share,
            ShareGrant::Unchanged(share) => {
                debug!(loan_id = %loan_id, grantee_id = %grantee_id, "loan already shared");
                return Ok(share);
            }
        };

        // a concurrent share of the same pair may have landed since the check
        if let Some(held) = self.store.insert_share(share.clone())? {
            let held = self.access.reshare(held)?.into_share();
            debug!(loan_id = %loan_id, grantee_id = %grantee_id, "loan already shared");
            return Ok(held);
        }

        info!(loan_id = %loan_id, grantee_id = %grantee_id, "loan shared");
        self.emit(Event::LoanShared {
            loan_id,
            owner_id,
            grantee_id,
            timestamp: share.granted_at,
        });
        Ok(share)
    }

    /// withdraw a grantee's view access
    pub fn revoke_share(&self, owner_id: UserId, loan_id: LoanId, grantee_id: UserId) -> Result<()> {
        let loan = self.store.get_loan(loan_id)?;
        let existing = self.store.list_shares(loan_id)?;
        self.access.revoke_share(owner_id, &loan, grantee_id, &existing)?;
        self.store.remove_share(loan_id, grantee_id)?;

        info!(loan_id = %loan_id, grantee_id = %grantee_id, "share revoked");
        self.emit(Event::ShareRevoked {
            loan_id,
            owner_id,
            grantee_id,
            timestamp: self.time.now(),
        });
        Ok(())
    }

    /// current shares of a loan, visible to its owner only
    pub fn list_shares(&self, loan_id: LoanId, requester: UserId) -> Result<Vec<Share>> {
        let loan = self.store.get_loan(loan_id)?;
        if !loan.is_owned_by(requester) {
            return Err(LoanError::NotOwner {
                user_id: requester,
                loan_id,
            });
        }
        self.store.list_shares(loan_id)
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    fn authorize_read(&self, loan_id: LoanId, requester: UserId) -> Result<Loan> {
        let loan = self.store.get_loan(loan_id)?;
        let grantees: HashSet<UserId> = self
            .store
            .list_shares(loan_id)?
            .into_iter()
            .map(|s| s.grantee_id)
            .collect();

        if let Err(err) = self.access.ensure_can_view(requester, &loan, &grantees) {
            warn!(loan_id = %loan_id, user_id = %requester, "loan access denied");
            self.emit(Event::AccessDenied {
                loan_id,
                user_id: requester,
                timestamp: self.time.now(),
            });
            return Err(err);
        }

        Ok(loan)
    }

    fn schedule_for(&self, loan: &Loan) -> Result<Arc<Schedule>> {
        if self.config.cache_schedules {
            self.cache.get_or_generate(loan.id, loan.terms())
        } else {
            Ok(Arc::new(self.engine.compute(loan.terms())?))
        }
    }

    fn emit(&self, event: Event) {
        self.events.lock().emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::storage::InMemoryStore;
    use crate::types::{LoanAccess, ResharePolicy};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn ledger_with(config: LedgerConfig) -> (LoanLedger<InMemoryStore>, SafeTimeProvider) {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let ledger = LoanLedger::new(InMemoryStore::new(), config, time.clone()).unwrap();
        (ledger, time)
    }

    fn ledger() -> LoanLedger<InMemoryStore> {
        ledger_with(LedgerConfig::default()).0
    }

    fn personal_loan(ledger: &LoanLedger<InMemoryStore>, owner: UserId) -> Loan {
        ledger
            .create_loan(owner, Money::from_major(1_200), Rate::from_percentage(12), 12)
            .unwrap()
    }

    #[test]
    fn test_register_user() {
        let ledger = ledger();
        let user = ledger.register_user("  ana ").unwrap();
        assert_eq!(user.name, "ana");
        assert_eq!(ledger.get_user(user.id).unwrap(), user);
        assert_eq!(ledger.store().user_count(), 1);

        let err = ledger.register_user("   ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUser);
    }

    #[test]
    fn test_create_loan_stamps_time_and_caches() {
        let (ledger, time) = ledger_with(LedgerConfig::default());
        let control = time.test_control().unwrap();
        let owner = ledger.register_user("owner").unwrap();

        control.advance(Duration::days(3));
        let loan = personal_loan(&ledger, owner.id);

        assert_eq!(loan.created_at, Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap());
        assert_eq!(ledger.get_loan(loan.id, owner.id).unwrap(), loan);
        assert_eq!(ledger.cache.len(), 1);
    }

    #[test]
    fn test_create_loan_validates_before_persisting() {
        let ledger = ledger();
        let owner = ledger.register_user("owner").unwrap();

        let err = ledger
            .create_loan(owner.id, Money::ZERO, Rate::from_percentage(5), 12)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanTerms);

        let err = ledger
            .create_loan(owner.id, Money::from_major(100), Rate::from_percent(dec!(-0.5)), 12)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanTerms);

        let err = ledger
            .create_loan(owner.id, Money::from_major(100), Rate::from_percentage(5), 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanTerms);

        assert_eq!(ledger.store().loan_count(), 0);
    }

    #[test]
    fn test_create_loan_enforces_term_ceiling() {
        let (ledger, _) = ledger_with(LedgerConfig::default().with_max_term_months(24));
        let owner = ledger.register_user("owner").unwrap();

        let err = ledger
            .create_loan(owner.id, Money::from_major(100), Rate::from_percentage(5), 25)
            .unwrap_err();
        assert!(err.to_string().contains("exceeds maximum of 24"));
        assert!(ledger
            .create_loan(owner.id, Money::from_major(100), Rate::from_percentage(5), 24)
            .is_ok());
    }

    #[test]
    fn test_create_loan_requires_owner() {
        let ledger = ledger();
        let err = ledger
            .create_loan(Uuid::new_v4(), Money::from_major(100), Rate::from_percentage(5), 12)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_uncached_schedule_matches_cached() {
        let (cached, _) = ledger_with(LedgerConfig::default());
        let (uncached, _) = ledger_with(LedgerConfig::default().with_schedule_cache(false));

        let a = cached.register_user("a").unwrap();
        let b = uncached.register_user("b").unwrap();
        let la = personal_loan(&cached, a.id);
        let lb = personal_loan(&uncached, b.id);

        let sa = cached.get_schedule(la.id, a.id).unwrap();
        let sb = uncached.get_schedule(lb.id, b.id).unwrap();
        assert_eq!(*sa, *sb);
        assert_eq!(uncached.cache.len(), 0);
    }

    #[test]
    fn test_month_summary_and_loan_summary() {
        let ledger = ledger();
        let owner = ledger.register_user("owner").unwrap();
        let loan = personal_loan(&ledger, owner.id);

        let entry = ledger.get_month_summary(loan.id, 1, owner.id).unwrap();
        assert_eq!(entry.period_index, 1);
        assert_eq!(entry.interest_portion, Money::from_major(12));

        let summary = ledger.get_loan_summary(loan.id, 12, owner.id).unwrap();
        assert_eq!(summary.current_principal_balance, Money::ZERO);
        assert_eq!(summary.aggregate_principal_paid, Money::from_major(1_200));

        let err = ledger.get_month_summary(loan.id, 13, owner.id).unwrap_err();
        assert_eq!(err, LoanError::MonthOutOfRange { month: 13, term_months: 12 });
    }

    #[test]
    fn test_share_flow_and_events() {
        let ledger = ledger();
        let a = ledger.register_user("a").unwrap();
        let b = ledger.register_user("b").unwrap();
        let c = ledger.register_user("c").unwrap();
        let loan = personal_loan(&ledger, a.id);
        ledger.take_events();

        assert_eq!(
            ledger.get_schedule(loan.id, b.id).unwrap_err().kind(),
            ErrorKind::Forbidden
        );

        let share = ledger.share_loan(a.id, loan.id, b.id).unwrap();
        assert_eq!(share.key(), (loan.id, b.id));
        assert_eq!(ledger.get_schedule(loan.id, b.id).unwrap(), ledger.get_schedule(loan.id, a.id).unwrap());
        assert_eq!(ledger.list_shares(loan.id, a.id).unwrap(), vec![share]);

        assert_eq!(
            ledger.share_loan(a.id, loan.id, b.id).unwrap_err().kind(),
            ErrorKind::AlreadyShared
        );
        assert_eq!(
            ledger.share_loan(b.id, loan.id, c.id).unwrap_err().kind(),
            ErrorKind::NotOwner
        );
        assert_eq!(
            ledger.list_shares(loan.id, b.id).unwrap_err().kind(),
            ErrorKind::NotOwner
        );

        ledger.revoke_share(a.id, loan.id, b.id).unwrap();
        assert_eq!(
            ledger.get_loan(loan.id, b.id).unwrap_err().kind(),
            ErrorKind::Forbidden
        );

        let events = ledger.take_events();
        assert!(matches!(events[0], Event::AccessDenied { .. }));
        assert!(matches!(events[1], Event::LoanShared { .. }));
        assert!(events.iter().any(|e| matches!(e, Event::ShareRevoked { .. })));
    }

    #[test]
    fn test_share_requires_existing_grantee() {
        let ledger = ledger();
        let a = ledger.register_user("a").unwrap();
        let loan = personal_loan(&ledger, a.id);

        let err = ledger.share_loan(a.id, loan.id, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_lenient_reshare_is_noop() {
        let (ledger, time) = ledger_with(LedgerConfig::lenient());
        let a = ledger.register_user("a").unwrap();
        let b = ledger.register_user("b").unwrap();
        let loan = personal_loan(&ledger, a.id);

        let first = ledger.share_loan(a.id, loan.id, b.id).unwrap();
        time.test_control().unwrap().advance(Duration::hours(1));
        let again = ledger.share_loan(a.id, loan.id, b.id).unwrap();

        assert_eq!(first, again);
        assert_eq!(ledger.list_shares(loan.id, a.id).unwrap().len(), 1);
        assert_eq!(ledger.config().reshare_policy, ResharePolicy::Ignore);
    }

    #[test]
    fn test_list_loans_for_union() {
        let ledger = ledger();
        let a = ledger.register_user("a").unwrap();
        let b = ledger.register_user("b").unwrap();

        let own = personal_loan(&ledger, a.id);
        let theirs = personal_loan(&ledger, b.id);
        let unshared = personal_loan(&ledger, b.id);
        ledger.share_loan(b.id, theirs.id, a.id).unwrap();

        let visible = ledger.list_loans_for(a.id).unwrap();
        let ids: HashSet<_> = visible.iter().map(|v| v.loan.id).collect();
        assert_eq!(visible.len(), 2);
        assert!(ids.contains(&own.id));
        assert!(ids.contains(&theirs.id));
        assert!(!ids.contains(&unshared.id));

        let access_of = |id| visible.iter().find(|v| v.loan.id == id).unwrap().access;
        assert_eq!(access_of(own.id), LoanAccess::Owner);
        assert_eq!(access_of(theirs.id), LoanAccess::Grantee);

        let err = ledger.list_loans_for(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_zero_rate_loan_splits_evenly() {
        let ledger = ledger();
        let owner = ledger.register_user("owner").unwrap();
        let loan = ledger
            .create_loan(owner.id, Money::from_major(1_000), Rate::ZERO, 4)
            .unwrap();

        let schedule = ledger.get_schedule(loan.id, owner.id).unwrap();
        assert!(schedule.entries.iter().all(|e| e.interest_portion == Money::ZERO));
        assert!(schedule
            .entries
            .iter()
            .all(|e| e.principal_portion == Money::from_major(250)));
        assert_eq!(schedule.total_interest, Money::ZERO);
    }

    #[test]
    fn test_concurrent_readers_share_one_schedule() {
        let ledger = Arc::new(ledger());
        let owner = ledger.register_user("owner").unwrap();
        let loan = ledger
            .create_loan(owner.id, Money::from_major(10_000), Rate::from_percentage(5), 120)
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || ledger.get_schedule(loan.id, owner.id).unwrap())
            })
            .collect();

        let first = ledger.get_schedule(loan.id, owner.id).unwrap();
        for handle in handles {
            assert!(Arc::ptr_eq(&first, &handle.join().unwrap()));
        }
    }

    #[test]
    fn test_share_by_non_owner_checks_ownership_first() {
        let ledger = ledger();
        let a = ledger.register_user("a").unwrap();
        let b = ledger.register_user("b").unwrap();
        let loan = personal_loan(&ledger, a.id);

        let err = ledger.share_loan(b.id, loan.id, Uuid::new_v4()).unwrap_err();
        assert_eq!(err, LoanError::NotOwner { user_id: b.id, loan_id: loan.id });
    }

    #[test]
    fn test_concurrent_shares_of_one_pair_create_once() {
        let ledger = Arc::new(ledger());
        let a = ledger.register_user("a").unwrap();
        let b = ledger.register_user("b").unwrap();
        let loan = personal_loan(&ledger, a.id);
        ledger.take_events();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || ledger.share_loan(a.id, loan.id, b.id))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::AlreadyShared));

        let shared_events = ledger
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, Event::LoanShared { .. }))
            .count();
        assert_eq!(shared_events, 1);
        assert_eq!(ledger.list_shares(loan.id, a.id).unwrap().len(), 1);
    }

    #[test]
    fn test_create_loan_with_oversized_principal_fails_cleanly() {
        let ledger = ledger();
        let owner = ledger.register_user("owner").unwrap();

        let err = ledger
            .create_loan(
                owner.id,
                Money::from_decimal(dec!(50000000000000000000000000000)),
                Rate::from_percent(dec!(1.2)),
                1_200,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanTerms);
        assert_eq!(ledger.store().loan_count(), 0);
    }

    #[test]
    fn test_unknown_loan_is_not_found() {
        let ledger = ledger();
        let a = ledger.register_user("a").unwrap();
        assert_eq!(
            ledger.get_schedule(Uuid::new_v4(), a.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
