#![cfg(feature = "sqlite")]

use chrono::FixedOffset;
use sql_dbapi::prelude::*;
use sql_dbapi::sqlite::SqliteConnector;
use sql_dbapi::{binary, datetime};
use tempfile::{TempDir, tempdir};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn local_db(name: &str) -> Result<(TempDir, SqliteConnector), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let connector = SqliteConnector::new(dir.path().join(format!("{name}.db")));
    Ok((dir, connector))
}

fn setup(connector: &SqliteConnector) -> Result<Connection, DbApiError> {
    let conn = connect(connector, "mattdb", "local")?;
    let mut cursor = conn.cursor()?;
    cursor.execute(
        "create table simple (key integer primary key, val text not null)",
        None,
    )?;
    cursor.execute(
        "create table all_types (i integer, r real, s text, b blob, d datetime)",
        None,
    )?;
    conn.commit()?;
    Ok(conn)
}

#[test]
fn only_local_tier_is_served() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, connector) = local_db("tiers")?;
    let err = connect(&connector, "mattdb", "default").err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Operational));
    Ok(())
}

#[test]
fn insert_commit_select() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let (_dir, connector) = local_db("simple")?;
    let conn = setup(&connector)?;
    let mut cursor = conn.cursor()?;

    let rows: Vec<Params> = (1..=4)
        .map(|k| params! { "k" => k, "v" => format!("value {k}") })
        .collect();
    cursor.executemany("insert into simple (key, val) values (%(k)s, %(v)s)", &rows)?;
    assert_eq!(cursor.rowcount()?, -1);
    conn.commit()?;
    assert_eq!(cursor.rowcount()?, 4);

    cursor.execute("update simple set val = 'even' where key %% 2 = 0", None)?;
    conn.commit()?;
    assert_eq!(cursor.rowcount()?, 2);

    cursor.execute("select key, val from simple order by key", None)?;
    let all = cursor.fetchall()?;
    assert_eq!(all.len(), 4);
    assert_eq!(all[1], vec![Value::Int(2), Value::Text("even".into())]);
    assert_eq!(all[2].get("val").and_then(Value::as_text), Some("value 3"));
    Ok(())
}

#[test]
fn rollback_discards_writes() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, connector) = local_db("rollback")?;
    let conn = setup(&connector)?;
    let mut cursor = conn.cursor()?;
    cursor.execute("insert into simple values (1, 'one')", None)?;
    conn.rollback()?;

    cursor.execute("select count(*) as n from simple", None)?;
    let row = cursor.fetchone()?.ok_or("no count row")?;
    assert_eq!(row.get("n"), Some(&Value::Int(0)));
    Ok(())
}

#[test]
fn constraint_violations_are_integrity_errors() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, connector) = local_db("constraints")?;
    let conn = setup(&connector)?;
    let mut cursor = conn.cursor()?;
    cursor.execute("insert into simple values (1, 'one')", None)?;
    conn.commit()?;

    let dup = cursor.execute("insert into simple values (1, 'again')", None).err();
    assert_eq!(dup.map(|e| e.kind()), Some(ErrorKind::Integrity));
    let null = cursor.execute("insert into simple values (2, null)", None).err();
    assert_eq!(null.map(|e| e.kind()), Some(ErrorKind::Integrity));
    conn.rollback()?;

    let bad = cursor.execute("selec * from simple", None).err();
    assert_eq!(bad.map(|e| e.kind()), Some(ErrorKind::Programming));
    Ok(())
}

#[test]
fn values_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, connector) = local_db("types")?;
    let conn = setup(&connector)?;
    let mut cursor = conn.cursor()?;

    let est = FixedOffset::west_opt(5 * 3600).ok_or("offset")?;
    let when = datetime(2009, 2, 13, 18, 31, 30, 123_900, Some(est))?;
    cursor.execute(
        "insert into all_types values (%(i)s, %(r)s, %(s)s, %(b)s, %(d)s)",
        Some(&params! {
            "i" => -9_223_372_036_854_775_807_i64,
            "r" => 0.125,
            "s" => "\u{00bf}Qu\u{00e9}?",
            "b" => binary(b"\x00\x01\x02".to_vec()),
            "d" => when,
        }),
    )?;
    cursor.execute("insert into all_types (i) values (%(i)s)", Some(&params! { "i" => None::<i64> }))?;
    conn.commit()?;

    cursor.execute("select i, r, s, b, d from all_types order by i is null, i", None)?;
    let description = cursor.description()?.ok_or("no description")?;
    let types: Vec<ColumnType> = description.iter().map(|c| c.type_code).collect();
    assert_eq!(
        types,
        vec![
            ColumnType::Integer,
            ColumnType::Real,
            ColumnType::CString,
            ColumnType::Blob,
            ColumnType::Datetime,
        ]
    );

    let row = cursor.fetchone()?.ok_or("missing row")?;
    assert_eq!(row[0], Value::Int(-9_223_372_036_854_775_807));
    assert_eq!(row[1], Value::Float(0.125));
    assert_eq!(row[2].as_text(), Some("\u{00bf}Qu\u{00e9}?"));
    assert_eq!(row[3].as_binary(), Some(&b"\x00\x01\x02"[..]));

    let stored = row[4].as_datetime().ok_or("not a datetime")?;
    assert!(stored.is_aware());
    assert_eq!(stored.microsecond(), 124_000);
    assert_eq!(*stored, datetime(2009, 2, 13, 23, 31, 30, 124_000, Some(FixedOffset::east_opt(0).ok_or("utc")?))?);

    let nulls = cursor.fetchone()?.ok_or("missing null row")?;
    assert!(nulls.values().iter().all(Value::is_null));
    assert!(cursor.fetchone()?.is_none());
    Ok(())
}

#[test]
fn naive_datetimes_are_stored_as_utc() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, connector) = local_db("naive")?;
    let conn = setup(&connector)?;
    let mut cursor = conn.cursor()?;
    let naive = datetime(1999, 12, 31, 23, 59, 59, 999_600, None)?;
    cursor.execute("insert into all_types (d) values (%(d)s)", Some(&params! { "d" => naive }))?;
    cursor.execute("select d from all_types", None)?;

    let row = cursor.fetchone()?.ok_or("missing row")?;
    let stored = row[0].as_datetime().ok_or("not a datetime")?;
    assert_eq!(stored.year(), 2000);
    assert_eq!(stored.offset(), FixedOffset::east_opt(0));
    Ok(())
}

#[test]
fn unreadable_datetime_text_fails_only_its_row() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, connector) = local_db("stamps")?;
    let conn = connect(&connector, "mattdb", "local")?;
    let mut cursor = conn.cursor()?;
    cursor.execute(
        "create table stamps (n integer primary key, d datetime default current_timestamp)",
        None,
    )?;
    cursor.execute("insert into stamps values (1, '2020-01-01T10:00:00.000+02:00')", None)?;
    cursor.execute("insert into stamps values (2, 'soon')", None)?;
    cursor.execute("insert into stamps (n) values (3)", None)?;
    conn.commit()?;

    cursor.execute("select n, d from stamps order by n", None)?;
    let first = cursor.fetchone()?.ok_or("missing first row")?;
    let aware = first[1].as_datetime().ok_or("not a datetime")?;
    assert_eq!(aware.offset(), FixedOffset::east_opt(2 * 3600));

    let err = cursor.fetchone().err().ok_or("expected a decode failure")?;
    assert_eq!(err.kind(), ErrorKind::Data);

    let third = cursor.fetchone()?.ok_or("missing third row")?;
    assert_eq!(third[0], Value::Int(3));
    let stamped = third[1].as_datetime().ok_or("default timestamp not decoded")?;
    assert_eq!(stamped.offset(), FixedOffset::east_opt(0));
    assert!(cursor.fetchone()?.is_none());
    Ok(())
}

#[test]
fn data_persists_across_connections() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, connector) = local_db("persist")?;
    let conn = setup(&connector)?;
    let mut cursor = conn.cursor()?;
    cursor.execute("insert into simple values (%(k)s, %(v)s)", Some(&params! { "k" => 1, "v" => "kept" }))?;
    conn.commit()?;
    cursor.execute("insert into simple values (2, 'lost')", None)?;
    conn.close()?;

    let conn = connect(&connector, "mattdb", "local")?;
    let mut cursor = conn.cursor()?;
    cursor.execute("select val from simple", None)?;
    let vals: Vec<Row> = cursor.rows().collect::<Result<_, _>>()?;
    assert_eq!(vals.len(), 1);
    assert_eq!(vals[0][0].as_text(), Some("kept"));
    Ok(())
}

#[test]
fn autocommit_reports_rowcount_immediately() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, connector) = local_db("autocommit")?;
    setup(&connector)?.close()?;
    let options = ConnectOptions::builder("mattdb")
        .tier("local")
        .autocommit(true)
        .finish();
    let conn = connect_with(&connector, options)?;
    let mut cursor = conn.cursor()?;
    cursor.execute("insert into simple values (1, 'a')", None)?;
    assert_eq!(cursor.rowcount()?, 1);
    cursor.execute("delete from simple", None)?;
    assert_eq!(cursor.rowcount()?, 1);
    assert!(!conn.in_transaction());
    Ok(())
}
