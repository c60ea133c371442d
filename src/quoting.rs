//! Backtick-dialect quoting for table and column identifiers.
//!
//! Column expressions are only quoted when they look like a bare (possibly
//! dotted) ASCII identifier. Anything else, such as `COUNT(*)`, `t.*` or
//! `a + b`, is emitted verbatim and must already be safe.

use std::fmt::Write;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BARE_IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.]*$").expect("bare identifier pattern is valid");
}

/// A table or column reference: a bare name, or a name with an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentRef {
    Name(String),
    Aliased(String, String),
}

pub type TableRef = IdentRef;
pub type ColumnRef = IdentRef;

impl IdentRef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            IdentRef::Name(name) | IdentRef::Aliased(name, _) => name,
        }
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            IdentRef::Name(_) => None,
            IdentRef::Aliased(_, alias) => Some(alias),
        }
    }
}

impl From<&str> for IdentRef {
    fn from(name: &str) -> Self {
        IdentRef::Name(name.to_owned())
    }
}

impl From<String> for IdentRef {
    fn from(name: String) -> Self {
        IdentRef::Name(name)
    }
}

impl From<(&str, &str)> for IdentRef {
    fn from((name, alias): (&str, &str)) -> Self {
        IdentRef::Aliased(name.to_owned(), alias.to_owned())
    }
}

impl From<(String, String)> for IdentRef {
    fn from((name, alias): (String, String)) -> Self {
        IdentRef::Aliased(name, alias)
    }
}

/// `` `name` `` or `` `name` AS `alias` ``.
#[must_use]
pub fn quote_table(name: &str, alias: Option<&str>) -> String {
    let mut out = format!("`{name}`");
    push_alias(&mut out, alias);
    out
}

/// Quote every table and join with `, `, optionally wrapped in parentheses.
#[must_use]
pub fn quote_tables<I, T>(tables: I, with_brackets: bool) -> String
where
    I: IntoIterator<Item = T>,
    T: Into<TableRef>,
{
    join_quoted(tables, with_brackets, |table| {
        quote_table(table.name(), table.alias())
    })
}

/// Quote a column expression.
///
/// ```rust
/// use sql_txn::quoting::quote_column;
///
/// assert_eq!(quote_column("a.b", Some("c")), "`a`.`b` AS `c`");
/// assert_eq!(quote_column("u.*", None), "u.*");
/// assert_eq!(quote_column("COUNT(*)", Some("n")), "COUNT(*) AS `n`");
/// ```
#[must_use]
pub fn quote_column(expression: &str, alias: Option<&str>) -> String {
    let mut out = if BARE_IDENTIFIER.is_match(expression) {
        match expression.split_once('.') {
            Some((table, column)) => format!("`{table}`.`{column}`"),
            None => format!("`{expression}`"),
        }
    } else {
        expression.to_owned()
    };
    push_alias(&mut out, alias);
    out
}

/// Quote every column and join with `, `, optionally wrapped in parentheses.
#[must_use]
pub fn quote_columns<I, T>(columns: I, with_brackets: bool) -> String
where
    I: IntoIterator<Item = T>,
    T: Into<ColumnRef>,
{
    join_quoted(columns, with_brackets, |column| {
        quote_column(column.name(), column.alias())
    })
}

fn push_alias(out: &mut String, alias: Option<&str>) {
    if let Some(alias) = alias {
        // Writing into a String cannot fail.
        let _ = write!(out, " AS `{alias}`");
    }
}

fn join_quoted<I, T, F>(items: I, with_brackets: bool, quote: F) -> String
where
    I: IntoIterator<Item = T>,
    T: Into<IdentRef>,
    F: Fn(&IdentRef) -> String,
{
    let joined = items
        .into_iter()
        .map(|item| quote(&item.into()))
        .collect::<Vec<_>>()
        .join(", ");
    if with_brackets {
        format!("({joined})")
    } else {
        joined
    }
}
