use wickett::loopback::Loopback;
use wickett::{Environment, Error, Value};

#[test]
fn process_wide_environment_installs_once() {
    assert!(Environment::global().is_none());

    let loopback = Loopback::new();
    let env = Environment::install(loopback.api()).unwrap();
    assert!(matches!(
        Environment::install(Loopback::new().api()),
        Err(Error::AlreadyInitialized)
    ));
    assert!(std::ptr::eq(env, Environment::global().unwrap()));

    let conn = env.connect("Server=localhost").unwrap();
    let mut stmt = conn.prepare("SELECT ? AS n").unwrap();
    stmt.execute(&[Value::Int(5)]).unwrap();
    assert_eq!(stmt.fetch_one().unwrap().unwrap().get_int(0), Some(5));
}
