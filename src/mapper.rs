//! Turning materialized rows into caller-chosen shapes.
//!
//! Transforms are fallible so a row that cannot be converted aborts the whole
//! mapping; a partially mapped sequence is never returned.

use crate::error::SqlTxnError;
use crate::results::{ResultSet, Row};
use crate::types::RowValues;

/// Apply `transform` to every row, in order.
///
/// # Errors
/// Returns the first error produced by `transform`.
pub fn map_rows<T, F>(result_set: &ResultSet, mut transform: F) -> Result<Vec<T>, SqlTxnError>
where
    F: FnMut(&Row) -> Result<T, SqlTxnError>,
{
    let mut mapped = Vec::with_capacity(result_set.len());
    for row in result_set {
        mapped.push(transform(row)?);
    }
    Ok(mapped)
}

/// Apply `transform` to the first row only; `None` when there are no rows.
///
/// # Errors
/// Returns the error produced by `transform`.
pub fn map_first<T, F>(result_set: &ResultSet, transform: F) -> Result<Option<T>, SqlTxnError>
where
    F: FnOnce(&Row) -> Result<T, SqlTxnError>,
{
    result_set.first().map(transform).transpose()
}

/// First column of the first row.
///
/// `None` means the query matched no rows; `Some(RowValues::Null)` means it
/// matched a row whose cell is null.
///
/// # Errors
/// Returns `SqlTxnError::ExecutionError` if a row came back with no columns.
pub fn first_cell(result_set: &ResultSet) -> Result<Option<RowValues>, SqlTxnError> {
    match result_set.first() {
        None => Ok(None),
        Some(row) => row.get_by_index(0).cloned().map(Some).ok_or_else(|| {
            SqlTxnError::ExecutionError("query returned a row without columns".into())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> ResultSet {
        let mut rs = ResultSet::new(vec!["id".into(), "name".into()]);
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("ann".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Null]);
        rs
    }

    #[test]
    fn map_rows_keeps_order() {
        let ids = map_rows(&people(), |row| {
            row.get("id")
                .and_then(RowValues::as_int)
                .copied()
                .ok_or_else(|| SqlTxnError::Other("id".into()))
        })
        .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn map_rows_stops_at_first_failure() {
        let mut seen = 0;
        let result = map_rows(&people(), |row| {
            seen += 1;
            row.get("name")
                .and_then(RowValues::as_text)
                .map(str::to_owned)
                .ok_or_else(|| SqlTxnError::Other("name is null".into()))
        });
        assert!(result.is_err());
        assert_eq!(seen, 2);
    }

    #[test]
    fn first_cell_distinguishes_missing_from_null() {
        let empty = ResultSet::new(vec!["v".into()]);
        assert_eq!(first_cell(&empty).unwrap(), None);

        let mut null_row = ResultSet::new(vec!["v".into()]);
        null_row.add_row_values(vec![RowValues::Null]);
        assert_eq!(first_cell(&null_row).unwrap(), Some(RowValues::Null));
    }

    #[test]
    fn map_first_on_empty_is_none() {
        let empty = ResultSet::new(vec!["v".into()]);
        let mapped: Option<i64> = map_first(&empty, |_| Ok(1)).unwrap();
        assert!(mapped.is_none());
    }
}
