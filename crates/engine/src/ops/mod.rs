use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::ResultEngine;

mod categories;
mod companies;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    tree_locks: TreeLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// One async mutex per company.
///
/// Structural writes (create, update, delete, reorder) of a company run one at
/// a time, so the check-then-write sequences of this process never interleave.
/// Writers in other processes are only held back by the unique index on
/// sibling names.
///
/// Entries nobody holds are dropped on the next lookup, so the map only grows
/// with the number of companies writing at the same time.
#[derive(Debug, Default)]
struct TreeLocks {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl TreeLocks {
    fn for_company(&self, company_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|id, lock| *id == company_id || Arc::strong_count(lock) > 1);
        locks.entry(company_id).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            tree_locks: TreeLocks::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_locks_are_shared_per_company() {
        let locks = TreeLocks::default();
        let company = Uuid::new_v4();

        let first = locks.for_company(company);
        let second = locks.for_company(company);
        let other = locks.for_company(Uuid::new_v4());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn idle_tree_locks_are_dropped() {
        let locks = TreeLocks::default();
        let busy = Uuid::new_v4();

        let held = locks.for_company(busy);
        for _ in 0..10 {
            drop(locks.for_company(Uuid::new_v4()));
        }
        assert_eq!(locks.len(), 2);

        let again = locks.for_company(busy);
        assert!(Arc::ptr_eq(&held, &again));

        drop(held);
        drop(again);
        locks.for_company(Uuid::new_v4());
        assert_eq!(locks.len(), 1);
    }
}
