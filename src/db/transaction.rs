/*!
 * Explicit begin / commit units of work.
 *
 * Every multi-step write opens a `UnitOfWork`, runs its statements against
 * `conn()` and hands the outcome to `finish`, which commits on success and
 * rolls back on any error before the error reaches the caller.
 */

use crate::errors::ServiceError;
use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::time::Instant;
use tracing::{debug, warn};

pub struct UnitOfWork {
    txn: DatabaseTransaction,
    operation: &'static str,
    started: Instant,
}

impl UnitOfWork {
    pub async fn begin(
        db: &DatabaseConnection,
        operation: &'static str,
    ) -> Result<Self, ServiceError> {
        let txn = db.begin().await?;
        debug!(operation, "Transaction started");
        counter!("storefront_db.transaction.started", 1, "operation" => operation);
        Ok(Self {
            txn,
            operation,
            started: Instant::now(),
        })
    }

    /// Connection every statement of this unit must run on.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits when `result` is `Ok`, rolls back otherwise.
    ///
    /// A failed commit surfaces as `TransactionAborted`. Errors raised inside
    /// the unit are re-labelled with [`ServiceError::into_aborted`].
    pub async fn finish<T>(self, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
        let Self {
            txn,
            operation,
            started,
        } = self;

        let outcome = match result {
            Ok(value) => match txn.commit().await {
                Ok(()) => {
                    counter!("storefront_db.transaction.committed", 1, "operation" => operation);
                    debug!(operation, "Transaction committed in {:?}", started.elapsed());
                    Ok(value)
                }
                Err(err) => {
                    counter!("storefront_db.transaction.rolled_back", 1, "operation" => operation);
                    warn!(operation, error = %err, "Commit failed");
                    Err(ServiceError::TransactionAborted {
                        operation: operation.to_string(),
                        reason: err.to_string(),
                    })
                }
            },
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(operation, error = %rollback_err, "Rollback failed");
                }
                counter!("storefront_db.transaction.rolled_back", 1, "operation" => operation);
                warn!(operation, error = %err, "Transaction rolled back after {:?}", started.elapsed());
                Err(err.into_aborted(operation))
            }
        };

        histogram!(
            "storefront_db.transaction.duration",
            started.elapsed(),
            "operation" => operation
        );
        outcome
    }
}
