use chrono::NaiveDate;
use wickett::loopback::Loopback;
use wickett::types::*;
use wickett::{Environment, FetchOutcome, HandleKind, TypeFamily, Value};

fn echo(loopback: &Loopback, value: Value) -> Value {
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();
    let mut stmt = conn.prepare("SELECT ? AS v").unwrap();
    stmt.execute(&[value]).unwrap();

    let mut row = [Value::Null];
    assert_eq!(stmt.fetch_row(&mut row).unwrap(), FetchOutcome::Row);
    assert_eq!(stmt.fetch_row(&mut row).unwrap(), FetchOutcome::EndOfData);
    let [value] = row;
    value
}

#[test]
fn text_round_trips() {
    let loopback = Loopback::new();
    assert_eq!(echo(&loopback, Value::from("hello")), Value::from("hello"));
    assert_eq!(echo(&loopback, Value::from("")), Value::from(""));
    assert_eq!(
        echo(&loopback, Value::from("grüße, 世界")),
        Value::from("grüße, 世界")
    );
}

#[test]
fn integers_round_trip_at_both_widths() {
    let loopback = Loopback::new();
    assert_eq!(echo(&loopback, Value::Int(42)), Value::Int(42));
    assert_eq!(echo(&loopback, Value::Int(-7)), Value::Int(-7));
    assert_eq!(echo(&loopback, Value::Int(i64::MAX)), Value::Int(i64::MAX));
    assert_eq!(
        echo(&loopback, Value::Int(i64::from(i32::MIN) - 1)),
        Value::Int(i64::from(i32::MIN) - 1)
    );
}

#[test]
fn floats_and_booleans_round_trip() {
    let loopback = Loopback::new();
    assert_eq!(echo(&loopback, Value::Float(2.5)), Value::Float(2.5));
    assert_eq!(echo(&loopback, Value::Float(-1e-9)), Value::Float(-1e-9));
    assert_eq!(echo(&loopback, Value::Bool(true)), Value::Bool(true));
    assert_eq!(echo(&loopback, Value::Bool(false)), Value::Bool(false));
}

#[test]
fn timestamps_round_trip() {
    let loopback = Loopback::new();
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    for ts in [
        date.and_hms_opt(13, 45, 30).unwrap(),
        date.and_hms_milli_opt(0, 0, 1, 250).unwrap(),
        date.and_hms_nano_opt(23, 59, 59, 123_456_789).unwrap(),
    ] {
        assert_eq!(echo(&loopback, Value::Timestamp(ts)), Value::Timestamp(ts));
    }
}

#[test]
fn bytes_round_trip() {
    let loopback = Loopback::new();
    let bytes = vec![0u8, 1, 2, 0xfe, 0xff];
    assert_eq!(echo(&loopback, Value::Bytes(bytes.clone())), Value::Bytes(bytes));
    assert_eq!(echo(&loopback, Value::Bytes(Vec::new())), Value::Bytes(Vec::new()));
}

#[test]
fn null_binds_as_varchar_and_reads_back_null() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();
    let mut stmt = conn.prepare("SELECT ? AS v").unwrap();
    stmt.execute(&[Value::Null]).unwrap();

    let field = stmt.column_metadata(0).unwrap();
    assert_eq!(field.sql_type, SQL_VARCHAR);
    let row = stmt.fetch_one().unwrap().unwrap();
    assert_eq!(row.get(0), Some(&Value::Null));
}

#[test]
fn null_takes_the_described_parameter_type() {
    let loopback = Loopback::new();
    loopback.describe_params("SELECT ? AS v", vec![SQL_INTEGER]);
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();
    let mut stmt = conn.prepare("SELECT ? AS v").unwrap();

    assert_eq!(stmt.param_type(1).unwrap().data_type, SQL_INTEGER);
    stmt.execute(&[Value::Null]).unwrap();
    let field = stmt.column_metadata(0).unwrap();
    assert_eq!(field.family(), TypeFamily::Integer);
    assert_eq!(stmt.fetch_one().unwrap().unwrap().get(0), Some(&Value::Null));
}

#[test]
fn select_marker_with_alias() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();
    let mut stmt = conn.prepare("SELECT ? AS x").unwrap();
    assert_eq!(stmt.num_params(), 1);
    stmt.execute(&[Value::Int(42)]).unwrap();

    assert_eq!(stmt.columns().unwrap(), vec!["x".to_owned()]);
    let rows = stmt.fetch_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_by_name("X"), Some(&Value::Int(42)));
    assert!(!stmt.fetch().unwrap());
}

#[test]
fn end_of_data_repeats() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();
    let mut stmt = conn.exec_direct("SELECT 1 AS one").unwrap();

    let mut row = [Value::Null];
    assert_eq!(stmt.fetch_row(&mut row).unwrap(), FetchOutcome::Row);
    assert_eq!(row[0], Value::Int(1));
    for _ in 0..3 {
        assert_eq!(stmt.fetch_row(&mut row).unwrap(), FetchOutcome::EndOfData);
    }
}

#[test]
fn re_execution_rebinds_parameters() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();
    let mut stmt = conn.prepare("SELECT ? AS a, ? AS b").unwrap();

    for n in 0..3 {
        stmt.execute(&[Value::Int(n), Value::from(format!("row {n}"))])
            .unwrap();
        let row = stmt.fetch_one().unwrap().unwrap();
        assert_eq!(row.get_int(0), Some(n));
        assert_eq!(row.get_string(1), Some(format!("row {n}").as_str()));
    }
    drop(stmt);
    assert_eq!(loopback.live_handles(HandleKind::Statement), 0);
}

#[test]
fn literals_echo_with_their_types() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();
    let mut stmt = conn
        .exec_direct("SELECT 'it''s' AS s, 3.25 AS f, NULL AS n, FALSE AS b, 9000000000 AS big")
        .unwrap();

    let row = stmt.fetch_one().unwrap().unwrap();
    assert_eq!(row.columns(), ["s", "f", "n", "b", "big"]);
    assert_eq!(
        row.values(),
        [
            Value::from("it's"),
            Value::Float(3.25),
            Value::Null,
            Value::Bool(false),
            Value::Int(9_000_000_000),
        ]
    );
}
