use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::errors::{Entity, LoanError, Result};
use crate::types::{Loan, LoanId, Share, User, UserId};

/// persistence collaborator for users, loans and shares
///
/// Implementations must be safe to share across threads; the ledger only
/// ever holds `&self`.
pub trait LoanStore: Send + Sync {
    fn insert_user(&self, user: User) -> Result<()>;

    fn get_user(&self, id: UserId) -> Result<User>;

    fn insert_loan(&self, loan: Loan) -> Result<()>;

    fn get_loan(&self, id: LoanId) -> Result<Loan>;

    fn list_loans_owned_by(&self, user_id: UserId) -> Result<Vec<Loan>>;

    fn list_loans_shared_with(&self, user_id: UserId) -> Result<Vec<Loan>>;

    fn list_shares(&self, loan_id: LoanId) -> Result<Vec<Share>>;

    /// store a share unless the (loan, grantee) pair already has one
    ///
    /// Returns the share already held for the pair, leaving it untouched.
    fn insert_share(&self, share: Share) -> Result<Option<Share>>;

    fn remove_share(&self, loan_id: LoanId, grantee_id: UserId) -> Result<Share>;
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    loans: HashMap<LoanId, Loan>,
    shares: BTreeMap<(LoanId, UserId), Share>,
}

/// in-process store for tests, demos and embedding
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }

    pub fn loan_count(&self) -> usize {
        self.tables.read().loans.len()
    }
}

impl LoanStore for InMemoryStore {
    fn insert_user(&self, user: User) -> Result<()> {
        self.tables.write().users.insert(user.id, user);
        Ok(())
    }

    fn get_user(&self, id: UserId) -> Result<User> {
        self.tables
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| LoanError::not_found(Entity::User, id))
    }

    fn insert_loan(&self, loan: Loan) -> Result<()> {
        self.tables.write().loans.insert(loan.id, loan);
        Ok(())
    }

    fn get_loan(&self, id: LoanId) -> Result<Loan> {
        self.tables
            .read()
            .loans
            .get(&id)
            .cloned()
            .ok_or_else(|| LoanError::not_found(Entity::Loan, id))
    }

    fn list_loans_owned_by(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let tables = self.tables.read();
        Ok(tables
            .loans
            .values()
            .filter(|l| l.owner_id == user_id)
            .cloned()
            .collect())
    }

    fn list_loans_shared_with(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let tables = self.tables.read();
        Ok(tables
            .shares
            .values()
            .filter(|s| s.grantee_id == user_id)
            .filter_map(|s| tables.loans.get(&s.loan_id))
            .cloned()
            .collect())
    }

    fn list_shares(&self, loan_id: LoanId) -> Result<Vec<Share>> {
        let tables = self.tables.read();
        Ok(tables
            .shares
            .range((loan_id, UserId::nil())..=(loan_id, UserId::from_u128(u128::MAX)))
            .map(|(_, s)| s.clone())
            .collect())
    }

    fn insert_share(&self, share: Share) -> Result<Option<Share>> {
        let mut tables = self.tables.write();
        match tables.shares.entry(share.key()) {
            Entry::Occupied(held) => Ok(Some(held.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(share);
                Ok(None)
            }
        }
    }

    fn remove_share(&self, loan_id: LoanId, grantee_id: UserId) -> Result<Share> {
        self.tables
            .write()
            .shares
            .remove(&(loan_id, grantee_id))
            .ok_or_else(|| LoanError::not_found(Entity::Share, grantee_id))
    }
}
