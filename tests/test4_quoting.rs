use sql_txn::prelude::*;

#[test]
fn column_quoting_properties() {
    assert_eq!(quote_column("a.b", Some("c")), "`a`.`b` AS `c`");
    assert_eq!(quote_column("*", None), "*");
    assert_eq!(quote_column("COUNT(*)", None), "COUNT(*)");
    assert_eq!(quote_column("t.*", None), "t.*");
}

#[test]
fn literal_encoding_properties() {
    assert_eq!(quote(&RowValues::Null).to_string(), "null");
    assert_eq!(quote(&RowValues::Bool(true)), SqlLiteral::Integer(1));
    // Embedded text is not escaped; bind parameters for untrusted input.
    assert_eq!(quote(&RowValues::from("it's")).to_string(), "it's");
}

#[cfg(feature = "sqlite")]
#[test]
fn quoted_fragments_run_against_sqlite() -> Result<(), SqlTxnError> {
    let mut conn = TransactionalConnection::open(&DataSource::url(":memory:", DriverKind::Sqlite))?;
    conn.execute_batch(
        "CREATE TABLE `order` (`id` INTEGER PRIMARY KEY, `group` TEXT, qty INTEGER);",
    )?;

    let insert = format!(
        "INSERT INTO {} {} VALUES (?1, ?2, ?3)",
        conn.quote_table("order", None),
        conn.quote_columns(["id", "group", "qty"], true),
    );
    conn.execute(&insert, &[RowValues::Int(1), RowValues::from("a"), RowValues::Int(2)])?;
    conn.execute(&insert, &[RowValues::Int(2), RowValues::from("a"), RowValues::Int(5)])?;
    conn.execute(&insert, &[RowValues::Int(3), RowValues::from("b"), RowValues::Int(1)])?;

    let select = format!(
        "SELECT {} FROM {} WHERE {} IN {} GROUP BY {} ORDER BY {}",
        conn.quote_columns([("o.group", "g"), ("SUM(o.qty)", "total")], false),
        conn.quote_tables([("order", "o")], false),
        conn.quote_column("o.id", None),
        conn.quote_list(&[RowValues::Int(1), RowValues::Int(2), RowValues::Int(3)]),
        conn.quote_column("g", None),
        conn.quote_column("g", None),
    );
    assert_eq!(
        select,
        "SELECT `o`.`group` AS `g`, SUM(o.qty) AS `total` FROM `order` AS `o` \
         WHERE `o`.`id` IN (1, 2, 3) GROUP BY `g` ORDER BY `g`"
    );

    let totals = conn.query_rows(&select, &[], |row| {
        Ok((
            row.get("g").and_then(RowValues::as_text).unwrap_or_default().to_owned(),
            row.get("total").and_then(RowValues::as_int).copied().unwrap_or_default(),
        ))
    })?;
    assert_eq!(totals, vec![("a".to_string(), 7), ("b".to_string(), 1)]);

    let wildcard = format!(
        "SELECT {} FROM {}",
        conn.quote_column("o.*", None),
        conn.quote_table("order", Some("o"))
    );
    assert_eq!(wildcard, "SELECT o.* FROM `order` AS `o`");
    let rows = conn.query_rows(&wildcard, &[], |row| Ok(row.len()))?;
    assert_eq!(rows, vec![3, 3, 3]);
    Ok(())
}

#[cfg(feature = "sqlite")]
#[test]
fn literal_embedding_with_unescaped_quote_breaks_the_statement() -> Result<(), SqlTxnError> {
    let mut conn = TransactionalConnection::open(&DataSource::url(":memory:", DriverKind::Sqlite))?;
    conn.execute_batch("CREATE TABLE note (body TEXT);")?;

    let embedded = format!(
        "INSERT INTO note (body) VALUES ('{}')",
        conn.quote(&RowValues::from("it's"))
    );
    let err = conn.execute(&embedded, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SqlExecution);

    // The parameterized path stores the same text intact.
    conn.execute("INSERT INTO note (body) VALUES (?1)", &[RowValues::from("it's")])?;
    assert_eq!(
        conn.query_cell("SELECT body FROM note", &[])?,
        Some(RowValues::Text("it's".into()))
    );
    Ok(())
}
