use sql_txn::prelude::*;
use sql_txn::test_utils::{CallLog, DriverCall, result_set};

#[test]
fn current_returns_the_bound_connection() -> Result<(), SqlTxnError> {
    let log = CallLog::new();
    let mut registry = ConnectionRegistry::new();
    let ctx = ContextId::next();

    registry.connect(ctx, &log.source())?;
    assert!(registry.is_bound(ctx));

    // Code further down the call chain only has the registry and the context.
    fn audit(registry: &mut ConnectionRegistry, ctx: ContextId) -> Result<usize, SqlTxnError> {
        registry
            .current(ctx)?
            .execute("INSERT INTO audit (msg) VALUES (?1)", &[RowValues::from("hi")])
    }
    assert_eq!(audit(&mut registry, ctx)?, 1);

    registry.close(ctx)?;
    assert!(!registry.is_bound(ctx));
    assert!(matches!(
        registry.current(ctx),
        Err(SqlTxnError::NoActiveConnection(_))
    ));
    assert_eq!(log.count(&DriverCall::Close), 1);
    Ok(())
}

#[test]
fn contexts_are_isolated() -> Result<(), SqlTxnError> {
    let first_log = CallLog::new();
    let second_log = CallLog::new();
    let mut registry = ConnectionRegistry::new();
    let first = ContextId::next();
    let second = ContextId::next();

    registry.connect(first, &first_log.source())?;
    registry.connect(second, &second_log.source())?;
    assert_eq!(registry.len(), 2);

    registry.current(first)?.begin()?;
    assert_eq!(registry.current(first)?.depth(), 1);
    assert_eq!(registry.current(second)?.depth(), 0);

    registry.current(first)?.commit()?;
    assert_eq!(first_log.control_calls(), vec![DriverCall::Begin, DriverCall::Commit]);
    assert!(second_log.calls().is_empty());

    registry.close_all()?;
    assert!(registry.is_empty());
    Ok(())
}

#[test]
fn second_connect_replaces_and_closes_the_first() -> Result<(), SqlTxnError> {
    let old_log = CallLog::new();
    let new_log = CallLog::new();
    let mut registry = ConnectionRegistry::new();
    let ctx = ContextId::next();

    registry.connect(ctx, &old_log.source())?;
    registry.connect(ctx, &new_log.source())?;

    assert_eq!(registry.len(), 1);
    assert_eq!(old_log.calls(), vec![DriverCall::Close]);

    registry.current(ctx)?.execute("DELETE FROM t", &[])?;
    assert_eq!(new_log.calls().len(), 1);
    assert_eq!(old_log.calls().len(), 1);
    Ok(())
}

#[test]
fn failed_connect_keeps_existing_binding() -> Result<(), SqlTxnError> {
    let log = CallLog::new();
    let mut registry = ConnectionRegistry::new();
    let ctx = ContextId::next();
    registry.connect(ctx, &log.source())?;

    let refusing = DataSource::factory(|| -> Result<Box<dyn RawConnection>, SqlTxnError> {
        Err(SqlTxnError::ConnectionError("connection refused".into()))
    });
    let err = registry.connect(ctx, &refusing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(registry.is_bound(ctx));
    assert!(log.calls().is_empty());
    Ok(())
}

#[test]
fn run_in_transaction_clears_the_binding() -> Result<(), SqlTxnError> {
    let log = CallLog::new();
    log.push_result(result_set(&["n"], vec![vec![RowValues::Int(3)]]));
    let mut registry = ConnectionRegistry::new();
    let ctx = ContextId::next();
    registry.connect(ctx, &log.source())?;

    let n = registry.run_in_transaction(ctx, |conn| {
        conn.execute("UPDATE t SET v = v + 1", &[])?;
        conn.query_cell("SELECT COUNT(*) AS n FROM t", &[])
    })?;

    assert_eq!(n, Some(RowValues::Int(3)));
    assert!(!registry.is_bound(ctx));
    assert_eq!(
        log.control_calls(),
        vec![DriverCall::Begin, DriverCall::Commit, DriverCall::Close]
    );
    Ok(())
}

#[test]
fn run_in_transaction_without_binding() {
    let mut registry = ConnectionRegistry::new();
    let ctx = ContextId::next();
    let result: Result<(), SqlTxnError> = registry.run_in_transaction(ctx, |_| Ok(()));
    assert_eq!(result.unwrap_err().kind(), ErrorKind::NoActiveConnection);
}

#[test]
fn failing_body_through_registry_rolls_back_and_unbinds() {
    let log = CallLog::new();
    log.fail_on("explode");
    let mut registry = ConnectionRegistry::new();
    let ctx = ContextId::next();
    registry.connect(ctx, &log.source()).expect("connect");

    let result = registry.run_in_transaction(ctx, |conn| {
        conn.execute("INSERT INTO t (v) VALUES (1)", &[])?;
        conn.execute("explode", &[])
    });

    assert_eq!(result.unwrap_err().kind(), ErrorKind::SqlExecution);
    assert!(!registry.is_bound(ctx));
    assert_eq!(
        log.control_calls(),
        vec![DriverCall::Begin, DriverCall::Rollback, DriverCall::Close]
    );
}

#[cfg(feature = "sqlite")]
#[test]
fn registry_over_sqlite() -> Result<(), SqlTxnError> {
    let source: DataSource =
        DataSourceConfig::from_json_str(r#"{"url": "sqlite::memory:", "driver": "sqlite"}"#)?.into();
    let mut registry = ConnectionRegistry::new();
    let ctx = ContextId::next();

    let conn = registry.connect(ctx, &source)?;
    conn.execute_batch("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT);")?;
    conn.execute(
        "INSERT INTO kv (k, v) VALUES (?1, ?2)",
        &[RowValues::from("a"), RowValues::from("1")],
    )?;

    let v = registry
        .current(ctx)?
        .query_cell("SELECT v FROM kv WHERE k = ?1", &[RowValues::from("a")])?;
    assert_eq!(v, Some(RowValues::Text("1".into())));
    registry.close(ctx)?;
    Ok(())
}
