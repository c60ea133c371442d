//! Literal embedding of values into SQL text.
//!
//! **Text is not escaped.** `quote("it's")` yields `it's`, so a literal built
//! from untrusted input can break out of its surrounding quotes. Use the
//! parameterized `execute`/`query_*` calls for anything that did not originate
//! in the program itself.

use std::fmt;

use crate::types::RowValues;

/// A value rendered for direct inclusion in SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlLiteral {
    /// Rendered as `null`
    Null,
    /// Booleans and integers
    Integer(i64),
    Float(f64),
    /// Any other value, in its plain string form
    Text(String),
}

impl fmt::Display for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlLiteral::Null => f.write_str("null"),
            SqlLiteral::Integer(i) => write!(f, "{i}"),
            SqlLiteral::Float(v) => write!(f, "{v}"),
            SqlLiteral::Text(s) => f.write_str(s),
        }
    }
}

/// Encode a single value as a literal.
#[must_use]
pub fn quote(value: &RowValues) -> SqlLiteral {
    match value {
        RowValues::Null => SqlLiteral::Null,
        RowValues::Bool(b) => SqlLiteral::Integer(i64::from(*b)),
        RowValues::Int(i) => SqlLiteral::Integer(*i),
        RowValues::Float(v) => SqlLiteral::Float(*v),
        RowValues::Text(s) => SqlLiteral::Text(s.clone()),
        RowValues::Timestamp(dt) => SqlLiteral::Text(dt.format("%F %T%.f").to_string()),
        RowValues::JSON(json) => SqlLiteral::Text(json.to_string()),
        RowValues::Blob(bytes) => SqlLiteral::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Encode a collection as `(a, b, c)`.
#[must_use]
pub fn quote_list<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a RowValues>,
{
    let joined = values
        .into_iter()
        .map(|value| quote(value).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("({joined})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn null_and_booleans() {
        assert_eq!(quote(&RowValues::Null).to_string(), "null");
        assert_eq!(quote(&RowValues::Bool(true)), SqlLiteral::Integer(1));
        assert_eq!(quote(&RowValues::Bool(false)), SqlLiteral::Integer(0));
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(quote(&RowValues::Int(-3)).to_string(), "-3");
        assert_eq!(quote(&RowValues::Float(2.5)).to_string(), "2.5");
    }

    #[test]
    fn text_is_not_escaped() {
        assert_eq!(
            quote(&RowValues::Text("it's".into())),
            SqlLiteral::Text("it's".into())
        );
    }

    #[test]
    fn other_values_use_their_string_form() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            quote(&RowValues::Timestamp(dt)).to_string(),
            "2024-01-03 10:30:00"
        );
        assert_eq!(
            quote(&RowValues::JSON(json!({"a": 1}))).to_string(),
            r#"{"a":1}"#
        );
        assert_eq!(quote(&RowValues::Blob(b"raw".to_vec())).to_string(), "raw");
    }

    #[test]
    fn list_is_parenthesized() {
        let values = vec![
            RowValues::Int(1),
            RowValues::Null,
            RowValues::Bool(true),
            RowValues::Text("x".into()),
        ];
        assert_eq!(quote_list(&values), "(1, null, 1, x)");
        assert_eq!(quote_list(&Vec::<RowValues>::new()), "()");
    }
}
