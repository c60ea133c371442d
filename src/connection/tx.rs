use std::num::NonZeroU32;

use super::{TransactionalConnection, TxState};
use crate::error::SqlTxnError;

fn nest(depth: NonZeroU32) -> Result<NonZeroU32, SqlTxnError> {
    depth
        .checked_add(1)
        .ok_or_else(|| SqlTxnError::TransactionStateError("transaction nesting overflow".into()))
}

impl TransactionalConnection {
    /// Open a transaction scope.
    ///
    /// Only the outermost scope starts a driver transaction; nested scopes just
    /// increase the depth.
    ///
    /// # Errors
    /// Returns the driver's error if the outermost `BEGIN` fails; the state stays idle.
    pub fn begin(&mut self) -> Result<(), SqlTxnError> {
        self.state = match self.state {
            TxState::Idle => {
                self.raw_mut()?.begin()?;
                TxState::Active {
                    depth: NonZeroU32::MIN,
                }
            }
            TxState::Active { depth } => TxState::Active { depth: nest(depth)? },
            TxState::RollbackPending { depth } => TxState::RollbackPending { depth: nest(depth)? },
        };
        tracing::debug!(depth = self.depth(), "begin");
        Ok(())
    }

    /// Close the innermost scope, committing if it was the outermost.
    ///
    /// Returns `false` when no transaction was open. Closing a nested scope
    /// returns `true` without touching the driver. Closing the outermost scope
    /// returns whether the transaction was rolled back because a nested scope
    /// had called [`rollback`](Self::rollback).
    ///
    /// # Errors
    /// Returns the driver's error if the final `COMMIT` or `ROLLBACK` fails. The
    /// state is idle afterwards either way; a failed `COMMIT` is followed by a
    /// best-effort `ROLLBACK`.
    pub fn commit(&mut self) -> Result<bool, SqlTxnError> {
        let (depth, rollback_pending) = match self.state {
            TxState::Idle => return Ok(false),
            TxState::Active { depth } => (depth, false),
            TxState::RollbackPending { depth } => (depth, true),
        };

        if let Some(outer) = NonZeroU32::new(depth.get() - 1) {
            self.state = if rollback_pending {
                TxState::RollbackPending { depth: outer }
            } else {
                TxState::Active { depth: outer }
            };
            tracing::debug!(depth = outer.get(), "nested commit");
            return Ok(true);
        }

        self.state = TxState::Idle;
        let raw = self.raw_mut()?;
        if rollback_pending {
            tracing::debug!("commit requested after nested rollback; rolling back");
            raw.rollback()?;
        } else if let Err(err) = raw.commit() {
            if let Err(rollback_err) = raw.rollback() {
                tracing::warn!(error = %rollback_err, "rollback after failed commit failed");
            }
            return Err(err);
        } else {
            tracing::debug!("commit");
        }
        Ok(rollback_pending)
    }

    /// Close the innermost scope, rolling back.
    ///
    /// Returns `false` when no transaction was open. In a nested scope the
    /// driver is not called; the enclosing transaction is marked so that its
    /// eventual outermost commit rolls back.
    ///
    /// # Errors
    /// Returns the driver's error if the outermost `ROLLBACK` fails; the state is idle afterwards.
    pub fn rollback(&mut self) -> Result<bool, SqlTxnError> {
        let depth = match self.state {
            TxState::Idle => return Ok(false),
            TxState::Active { depth } | TxState::RollbackPending { depth } => depth,
        };

        match NonZeroU32::new(depth.get() - 1) {
            Some(outer) => {
                self.state = TxState::RollbackPending { depth: outer };
                tracing::debug!(depth = outer.get(), "nested rollback");
            }
            None => {
                self.state = TxState::Idle;
                self.raw_mut()?.rollback()?;
                tracing::debug!("rollback");
            }
        }
        Ok(true)
    }

    /// Run `body` inside a transaction scope on this connection.
    ///
    /// Commits when `body` returns `Ok`. When it returns `Err` the scope is
    /// rolled back and that error is returned; a failure of the rollback itself
    /// is logged, not returned. The connection stays open; see
    /// [`transaction`](Self::transaction) for the variant that also closes it.
    ///
    /// # Errors
    /// Returns the error from `body`, or the error from `BEGIN`/`COMMIT`.
    pub fn run_in_transaction<T, E, F>(&mut self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        self.begin()?;
        match body(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback() {
                    tracing::warn!(error = %rollback_err, "rollback after failed transaction body failed");
                }
                Err(err)
            }
        }
    }

    /// Run `body` in a transaction, then close the connection whatever the outcome.
    ///
    /// # Errors
    /// Returns the error from `body` if it failed. Otherwise returns the error
    /// from `BEGIN`, `COMMIT`, or closing the connection.
    pub fn transaction<T, E, F>(mut self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        let outcome = self.run_in_transaction(body);
        let closed = self.close();
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(error = %close_err, "close after failed transaction failed");
                Err(err)
            }
        }
    }
}
