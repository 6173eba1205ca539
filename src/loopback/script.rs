//! What the loopback driver answers to a statement text.
//!
//! Texts registered with [`Loopback::respond`](super::Loopback::respond) get
//! their canned [`Response`]. Anything else must be a `SELECT` list whose
//! items are parameter markers or literals, which is echoed back as a
//! one-row result set; `;` separates several of them.

use crate::diagnostics::DiagnosticRecord;
use crate::types::*;
use crate::value::Value;

/// Column description of a loopback result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: SQLSMALLINT,
    pub size: SQLULEN,
    pub decimal_digits: SQLSMALLINT,
    pub nullable: SQLSMALLINT,
}

impl Column {
    /// A nullable column with the usual size for `sql_type`.
    pub fn new(name: impl Into<String>, sql_type: SQLSMALLINT) -> Self {
        let size = match sql_type {
            SQL_BIT => 1,
            SQL_TINYINT => 3,
            SQL_SMALLINT => 5,
            SQL_INTEGER => 10,
            SQL_BIGINT => 19,
            SQL_REAL => 7,
            SQL_FLOAT | SQL_DOUBLE => 15,
            SQL_DECIMAL | SQL_NUMERIC => 18,
            SQL_TYPE_DATE => 10,
            SQL_TYPE_TIME => 8,
            SQL_TYPE_TIMESTAMP => 23,
            SQL_GUID => 36,
            _ => 255,
        };
        let decimal_digits = match sql_type {
            SQL_TYPE_TIMESTAMP => 3,
            _ => 0,
        };
        Self {
            name: name.into(),
            sql_type,
            size,
            decimal_digits,
            nullable: SQL_NULLABLE,
        }
    }

    pub fn size(mut self, size: SQLULEN) -> Self {
        self.size = size;
        self
    }

    pub fn decimal_digits(mut self, decimal_digits: SQLSMALLINT) -> Self {
        self.decimal_digits = decimal_digits;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = SQL_NO_NULLS;
        self
    }
}

/// Columns plus rows; a row shorter than the column list reads as nulls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }
}

/// A canned answer for one statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Rows(ResultSet),
    /// Rows affected by a data-modifying statement. Zero executes as
    /// `SQL_NO_DATA`.
    RowCount(i64),
    /// Several results, read with `SQLMoreResults`.
    Batch(Vec<Response>),
    /// Fails at prepare (or direct execution) with these records.
    Reject(Vec<DiagnosticRecord>),
    /// Prepares fine, fails at execution with these records.
    Fail(Vec<DiagnosticRecord>),
    /// Execution returns `SQL_NEED_DATA`.
    NeedData,
}

/// One result of an execution.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Rows(ResultSet),
    Count(i64),
}

pub(crate) enum Failure {
    Diagnostics(Vec<DiagnosticRecord>),
    NeedData,
}

/// Flattens a registered response into execution results.
pub(crate) fn respond(response: &Response) -> Result<Vec<Outcome>, Failure> {
    let mut outcomes = Vec::new();
    flatten(response, &mut outcomes)?;
    Ok(outcomes)
}

fn flatten(response: &Response, outcomes: &mut Vec<Outcome>) -> Result<(), Failure> {
    match response {
        Response::Rows(rows) => outcomes.push(Outcome::Rows(rows.clone())),
        Response::RowCount(count) => outcomes.push(Outcome::Count(*count)),
        Response::Batch(responses) => {
            for response in responses {
                flatten(response, outcomes)?;
            }
        }
        Response::Reject(records) | Response::Fail(records) => {
            return Err(Failure::Diagnostics(records.clone()))
        }
        Response::NeedData => return Err(Failure::NeedData),
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    /// 1-based parameter marker.
    Param(usize),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
struct Item {
    expr: Expr,
    alias: Option<String>,
}

/// A compiled `SELECT` echo.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Select {
    results: Vec<Vec<Item>>,
    pub(crate) markers: usize,
}

fn syntax_error(near: &str) -> DiagnosticRecord {
    DiagnosticRecord::new(
        "42000",
        102,
        format!("[Loopback] Incorrect syntax near '{}'.", near.trim()),
    )
}

pub(crate) fn compile(text: &str) -> Result<Select, DiagnosticRecord> {
    let mut results = Vec::new();
    let mut markers = 0;

    for statement in split_outside_quotes(text, b';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        let body = strip_select(statement).ok_or_else(|| syntax_error(statement))?;

        let mut items = Vec::new();
        for part in split_outside_quotes(body, b',') {
            let (expr, alias) = split_alias(part);
            if expr.is_empty() {
                return Err(syntax_error(part));
            }
            let expr = if expr == "?" {
                markers += 1;
                Expr::Param(markers)
            } else {
                Expr::Literal(parse_literal(expr)?)
            };
            items.push(Item { expr, alias });
        }
        results.push(items);
    }

    if results.is_empty() {
        return Err(syntax_error(text));
    }
    Ok(Select { results, markers })
}

/// Echoes the select list; `params` holds each marker's value and column.
pub(crate) fn run(select: &Select, params: &[(Value, Column)]) -> Vec<Outcome> {
    select
        .results
        .iter()
        .map(|items| {
            let mut columns = Vec::with_capacity(items.len());
            let mut row = Vec::with_capacity(items.len());
            for item in items {
                let name = item.alias.clone().unwrap_or_default();
                let (value, column) = match &item.expr {
                    Expr::Param(number) => match params.get(number - 1) {
                        Some((value, column)) => (value.clone(), column.clone()),
                        None => (Value::Null, Column::new("", SQL_VARCHAR).size(1)),
                    },
                    Expr::Literal(value) => (value.clone(), literal_column(value)),
                };
                columns.push(Column { name, ..column });
                row.push(value);
            }
            Outcome::Rows(ResultSet::new(columns).row(row))
        })
        .collect()
}

fn literal_column(value: &Value) -> Column {
    match value {
        Value::Bool(_) => Column::new("", SQL_BIT),
        Value::Int(value) if i32::try_from(*value).is_ok() => Column::new("", SQL_INTEGER),
        Value::Int(_) => Column::new("", SQL_BIGINT),
        Value::Float(_) => Column::new("", SQL_DOUBLE),
        Value::Text(text) => {
            Column::new("", SQL_WVARCHAR).size(text.encode_utf16().count().max(1))
        }
        _ => Column::new("", SQL_VARCHAR).size(1),
    }
}

fn strip_select(statement: &str) -> Option<&str> {
    let keyword = statement.get(..6)?;
    if !keyword.eq_ignore_ascii_case("select") {
        return None;
    }
    let rest = &statement[6..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

fn split_alias(item: &str) -> (&str, Option<String>) {
    let bytes = item.as_bytes();
    let mut quoted = false;
    for i in 0..bytes.len() {
        if bytes[i] == b'\'' {
            quoted = !quoted;
            continue;
        }
        if quoted || !bytes[i].is_ascii_whitespace() || i + 3 >= bytes.len() {
            continue;
        }
        if bytes[i + 1..i + 3].eq_ignore_ascii_case(b"as") && bytes[i + 3].is_ascii_whitespace() {
            let alias = item[i + 3..]
                .trim()
                .trim_matches(|c| c == '"' || c == '[' || c == ']');
            return (item[..i].trim(), Some(alias.to_owned()));
        }
    }
    (item.trim(), None)
}

fn parse_literal(text: &str) -> Result<Value, DiagnosticRecord> {
    if text.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    if text.eq_ignore_ascii_case("true") {
        return Ok(Value::Bool(true));
    }
    if text.eq_ignore_ascii_case("false") {
        return Ok(Value::Bool(false));
    }
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        return Ok(Value::Text(text[1..text.len() - 1].replace("''", "'")));
    }
    if let Ok(value) = text.parse::<i64>() {
        return Ok(Value::Int(value));
    }
    let numeric = text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.');
    if numeric {
        if let Ok(value) = text.parse::<f64>() {
            return Ok(Value::Float(value));
        }
    }
    Err(DiagnosticRecord::new(
        "42S22",
        207,
        format!("[Loopback] Invalid column name '{text}'."),
    ))
}

/// Parameter markers outside string literals.
pub(crate) fn count_markers(text: &str) -> usize {
    split_outside_quotes(text, b'?').len() - 1
}

fn split_outside_quotes(text: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, byte) in text.bytes().enumerate() {
        if byte == b'\'' {
            quoted = !quoted;
        } else if byte == separator && !quoted {
            parts.push(&text[start..i]);
            start = i + 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_select_list() {
        let select = compile("SELECT ?, 'it''s' AS quote, 3.5 as f, NULL, TRUE").unwrap();
        assert_eq!(select.markers, 1);
        let outcomes = run(&select, &[(Value::Int(42), Column::new("", SQL_INTEGER))]);
        let Outcome::Rows(rows) = &outcomes[0] else {
            panic!("expected rows");
        };
        assert_eq!(rows.columns[1].name, "quote");
        assert_eq!(rows.columns[2].name, "f");
        assert_eq!(rows.columns[2].sql_type, SQL_DOUBLE);
        assert_eq!(
            rows.rows[0],
            vec![
                Value::Int(42),
                Value::from("it's"),
                Value::Float(3.5),
                Value::Null,
                Value::Bool(true),
            ]
        );
    }

    #[test]
    fn semicolons_make_result_sets() {
        let select = compile("SELECT 1; SELECT 'a;b' AS s;").unwrap();
        let outcomes = run(&select, &[]);
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn rejects_non_select() {
        let err = compile("UPDATE t SET x = 1").unwrap_err();
        assert_eq!(err.state, "42000");
        let err = compile("SELECT nope").unwrap_err();
        assert_eq!(err.state, "42S22");
        assert!(compile("SELECT").is_err());
        assert!(compile("  ;  ").is_err());
    }

    #[test]
    fn markers_inside_literals_do_not_count() {
        assert_eq!(count_markers("UPDATE t SET a = ?, b = '?' WHERE c = ?"), 2);
        assert_eq!(count_markers("DELETE FROM t"), 0);
    }

    #[test]
    fn batch_flattens_and_fails_as_a_whole() {
        let batch = Response::Batch(vec![
            Response::RowCount(2),
            Response::Rows(ResultSet::new(vec![Column::new("x", SQL_INTEGER)])),
        ]);
        assert_eq!(respond(&batch).ok().map(|o| o.len()), Some(2));

        let failing = Response::Batch(vec![
            Response::RowCount(1),
            Response::Fail(vec![DiagnosticRecord::new("23000", 2627, "duplicate")]),
        ]);
        assert!(matches!(respond(&failing), Err(Failure::Diagnostics(records)) if records.len() == 1));
    }
}
