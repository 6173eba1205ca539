use wickett::loopback::{Event, Loopback};
use wickett::{ConnectionString, Environment, Error, HandleKind, OdbcVersion};

#[test]
fn unreachable_server_reports_diagnostics() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();

    let err = env.connect("Driver=Loopback;Server=db.invalid").unwrap_err();
    assert!(matches!(
        err,
        Error::Native {
            function: "SQLDriverConnectW",
            ..
        }
    ));
    let diagnostics = err.diagnostics().unwrap();
    assert_eq!(diagnostics.state, "08001");
    assert_eq!(diagnostics.native_error, 10061);
    assert!(diagnostics.message.contains("db.invalid"));
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics.records[1].state, "HYT00");

    assert_eq!(loopback.live_handles(HandleKind::Connection), 0);
    assert_eq!(loopback.invalid_frees(), 0);
}

#[test]
fn extra_servers_are_reachable() {
    let loopback = Loopback::new().with_server("db.internal");
    let env = Environment::new(loopback.api()).unwrap();
    let mut target = ConnectionString::new();
    target
        .driver("Loopback")
        .server("db.internal")
        .database("inventory")
        .user("app")
        .password("s3cr;t");

    let conn = env.connect(&target.to_string()).unwrap();
    assert!(conn.is_connected());
    assert_eq!(conn.server_info().unwrap().database_name, "inventory");
    assert_eq!(
        loopback.events(),
        vec![Event::Connected {
            server: "db.internal".to_owned()
        }]
    );
}

#[test]
fn server_and_client_info() {
    let loopback = Loopback::new();
    let env = Environment::with_version(loopback.api(), OdbcVersion::Odbc3_80).unwrap();
    assert_eq!(env.version(), OdbcVersion::Odbc3_80);
    let conn = env.connect("Server=localhost;Database=inventory").unwrap();

    let server = conn.server_info().unwrap();
    assert_eq!(server.database_name, "inventory");
    assert_eq!(server.dbms_version, "01.00.0000");
    assert_eq!(server.server_name, "localhost");

    let client = conn.client_info().unwrap();
    assert_eq!(client.driver_name, "libwickett-loopback");
    assert_eq!(client.odbc_version, "03.80");
    assert_eq!(client.driver_version, "00.01.0000");
}

#[test]
fn long_info_values_are_cut_to_the_buffer() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let database = "d".repeat(200);
    let conn = env
        .connect(&format!("Server=localhost;Database={database}"))
        .unwrap();

    let name = conn.server_info().unwrap().database_name;
    assert_eq!(name.len(), 127);
    assert!(database.starts_with(&name));
}

#[test]
fn committed_transaction() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();

    let tx = conn.transaction().unwrap();
    assert!(!conn.is_auto_commit());
    tx.connection().exec_direct("SELECT 1").unwrap();
    tx.commit().unwrap();
    assert!(conn.is_auto_commit());

    assert_eq!(
        loopback.events(),
        vec![
            Event::Connected {
                server: "localhost".to_owned()
            },
            Event::AutoCommit(false),
            Event::Executed("SELECT 1".to_owned()),
            Event::Commit,
            Event::AutoCommit(true),
        ]
    );
}

#[test]
fn dropped_transaction_rolls_back() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let conn = env.connect("Server=localhost").unwrap();
    {
        let _tx = conn.transaction().unwrap();
        conn.exec_direct("SELECT 1").unwrap();
    }
    assert!(conn.is_auto_commit());
    let events = loopback.events();
    assert_eq!(
        &events[events.len() - 2..],
        [Event::Rollback, Event::AutoCommit(true)]
    );
    assert!(!events.contains(&Event::Commit));
}

#[test]
fn close_is_idempotent() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let mut conn = env.connect("Server=localhost").unwrap();
    {
        let mut stmt = conn.exec_direct("SELECT 1").unwrap();
        stmt.close().unwrap();
        stmt.close().unwrap();
    }
    conn.close().unwrap();
    conn.close().unwrap();
    assert!(!conn.is_connected());
    assert!(matches!(
        conn.prepare("SELECT 1"),
        Err(Error::Closed(HandleKind::Connection))
    ));
    drop(conn);
    drop(env);

    for kind in [
        HandleKind::Environment,
        HandleKind::Connection,
        HandleKind::Statement,
    ] {
        assert_eq!(loopback.live_handles(kind), 0);
    }
    assert_eq!(loopback.invalid_frees(), 0);
}

#[test]
fn failed_disconnect_keeps_the_connection() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    let mut conn = env.connect("Server=localhost").unwrap();
    conn.begin_transaction().unwrap();
    conn.exec_direct("SELECT 1").unwrap();

    let err = conn.close().unwrap_err();
    assert_eq!(err.state(), Some("25000"));
    assert!(conn.is_connected());

    conn.rollback().unwrap();
    conn.close().unwrap();
    assert_eq!(loopback.live_handles(HandleKind::Connection), 0);
    assert_eq!(loopback.invalid_frees(), 0);
}

#[test]
fn drop_rolls_back_before_disconnecting() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    {
        let conn = env.connect("Server=localhost").unwrap();
        conn.begin_transaction().unwrap();
        conn.exec_direct("SELECT 1").unwrap();
    }
    let events = loopback.events();
    assert_eq!(
        &events[events.len() - 2..],
        [Event::Rollback, Event::Disconnected]
    );
    assert_eq!(loopback.live_handles(HandleKind::Connection), 0);
    assert_eq!(loopback.invalid_frees(), 0);
}

#[test]
fn environment_drop_frees_its_handle() {
    let loopback = Loopback::new();
    let env = Environment::new(loopback.api()).unwrap();
    assert_eq!(loopback.live_handles(HandleKind::Environment), 1);
    drop(env);
    assert_eq!(loopback.live_handles(HandleKind::Environment), 0);
}
