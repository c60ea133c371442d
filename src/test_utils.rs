//! A scripted driver that records every call it receives.
//!
//! Enabled with the `test-utils` feature. Used to assert exactly which
//! `BEGIN`/`COMMIT`/`ROLLBACK` calls reach the driver.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::datasource::DataSource;
use crate::driver::RawConnection;
use crate::error::SqlTxnError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// One call observed by a [`RecordingConnection`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Begin,
    Commit,
    Rollback,
    Execute(String, Vec<RowValues>),
    Batch(String),
    Query(String, Vec<RowValues>),
    Close,
}

#[derive(Debug, Default)]
struct Script {
    calls: Vec<DriverCall>,
    results: VecDeque<ResultSet>,
    failures: Vec<String>,
    failing_calls: Vec<DriverCall>,
}

/// Handle shared between a test and the connections it hands out.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inner: Arc<Mutex<Script>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Every call recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls excluding statements, i.e. transaction and lifecycle calls.
    #[must_use]
    pub fn control_calls(&self) -> Vec<DriverCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    DriverCall::Begin | DriverCall::Commit | DriverCall::Rollback | DriverCall::Close
                )
            })
            .collect()
    }

    #[must_use]
    pub fn count(&self, call: &DriverCall) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    /// Queue a result set for the next `query` call; unqueued queries return no rows.
    pub fn push_result(&self, result_set: ResultSet) {
        self.lock().results.push_back(result_set);
    }

    /// Make any statement whose SQL contains `needle` fail with an execution error.
    pub fn fail_on(&self, needle: impl Into<String>) {
        self.lock().failures.push(needle.into());
    }

    /// Make every occurrence of `call` fail with an execution error.
    ///
    /// Meant for the calls `fail_on` cannot reach: `Begin`, `Commit`,
    /// `Rollback` and `Close`. The failed call is still recorded.
    pub fn fail_call(&self, call: DriverCall) {
        self.lock().failing_calls.push(call);
    }

    /// A fresh connection writing to this log.
    #[must_use]
    pub fn connection(&self) -> RecordingConnection {
        RecordingConnection { log: self.clone() }
    }

    /// A data source whose connections all write to this log.
    #[must_use]
    pub fn source(&self) -> DataSource {
        let log = self.clone();
        DataSource::factory(move || -> Result<Box<dyn RawConnection>, SqlTxnError> {
            Ok(Box::new(log.connection()))
        })
    }

    fn record(&self, call: DriverCall) -> Result<(), SqlTxnError> {
        let mut script = self.lock();
        let sql = match &call {
            DriverCall::Execute(sql, _) | DriverCall::Batch(sql) | DriverCall::Query(sql, _) => {
                Some(sql.clone())
            }
            _ => None,
        };
        let call_fails = script.failing_calls.contains(&call);
        script.calls.push(call);
        if call_fails {
            let failed = script.calls.last().cloned();
            return Err(SqlTxnError::ExecutionError(format!(
                "scripted failure on {failed:?}"
            )));
        }
        if let Some(sql) = sql
            && let Some(needle) = script.failures.iter().find(|n| sql.contains(n.as_str()))
        {
            return Err(SqlTxnError::ExecutionError(format!(
                "scripted failure on {needle:?}"
            )));
        }
        Ok(())
    }
}

/// [`RawConnection`] that records calls into a [`CallLog`].
#[derive(Debug)]
pub struct RecordingConnection {
    log: CallLog,
}

impl RawConnection for RecordingConnection {
    fn begin(&mut self) -> Result<(), SqlTxnError> {
        self.log.record(DriverCall::Begin)
    }

    fn commit(&mut self) -> Result<(), SqlTxnError> {
        self.log.record(DriverCall::Commit)
    }

    fn rollback(&mut self) -> Result<(), SqlTxnError> {
        self.log.record(DriverCall::Rollback)
    }

    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, SqlTxnError> {
        self.log
            .record(DriverCall::Execute(sql.to_owned(), params.to_vec()))?;
        Ok(1)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), SqlTxnError> {
        self.log.record(DriverCall::Batch(sql.to_owned()))
    }

    fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlTxnError> {
        self.log
            .record(DriverCall::Query(sql.to_owned(), params.to_vec()))?;
        Ok(self.log.lock().results.pop_front().unwrap_or_default())
    }

    fn close(self: Box<Self>) -> Result<(), SqlTxnError> {
        self.log.record(DriverCall::Close)
    }
}

/// Build a `ResultSet` from column names and rows.
#[must_use]
pub fn result_set(columns: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
    let mut rs = ResultSet::with_capacity(
        columns.iter().map(|c| (*c).to_owned()).collect(),
        rows.len(),
    );
    for row in rows {
        rs.add_row_values(row);
    }
    rs
}
