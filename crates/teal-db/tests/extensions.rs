//! Extension loading: trust policy, idempotency, global visibility.

use teal_db::engine::modules;
use teal_db::{Command, Connection, EngineBinding, EngineOptions, ErrorKind, TrustMode};

fn trusted_binding() -> EngineBinding {
    EngineBinding::builder()
        .path(":memory:")
        .allow_unsigned_extensions(true)
        .module(modules::greet())
        .build()
        .unwrap()
}

#[tokio::test]
async fn greet_scenario() {
    let binding = trusted_binding();
    let conn = Connection::open(&binding).unwrap();

    conn.exec("LOAD 'greet';").await.unwrap();
    let rows = conn
        .query("SELECT greet('Sam') AS value")
        .await
        .unwrap();
    assert_eq!(rows.num_rows(), 1);
    assert_eq!(
        rows.row(0).unwrap().get("value").unwrap().as_str(),
        Some("Hello Sam")
    );
    binding.close();
}

#[tokio::test]
async fn greet_version_has_documented_prefix() {
    let binding = trusted_binding();
    let conn = Connection::open(&binding).unwrap();
    conn.exec("LOAD 'greet'").await.unwrap();

    let rows = conn
        .query("SELECT greet_version('Michael') AS value")
        .await
        .unwrap();
    let value = rows.row(0).unwrap().get("value").unwrap().as_str().unwrap();
    assert!(
        value.starts_with("Hello Michael, my linked SQLite version is 3."),
        "unexpected version string: {value}"
    );
    binding.close();
}

#[tokio::test]
async fn unsigned_module_rejected_by_default() {
    let binding = EngineBinding::builder()
        .path(":memory:")
        .module(modules::greet())
        .build()
        .unwrap();
    let conn = Connection::open(&binding).unwrap();

    let err = conn.exec("LOAD 'greet'").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UntrustedExtension);
    assert!(binding.loaded_extensions().is_empty());

    // Nothing was registered: referencing the function is a SQL error, not
    // a crash.
    let err = conn.query("SELECT greet('Sam')").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sql);
    binding.close();
}

#[tokio::test]
async fn signed_module_loads_without_policy() {
    let binding = EngineBinding::builder()
        .path(":memory:")
        .module(modules::greet().signed(true))
        .build()
        .unwrap();
    let conn = Connection::open(&binding).unwrap();
    conn.exec("LOAD 'greet'").await.unwrap();
    assert_eq!(binding.loaded_extensions(), vec!["greet".to_string()]);
    binding.close();
}

#[tokio::test]
async fn explicit_trust_mode_overrides_options() {
    let binding = EngineBinding::builder()
        .path(":memory:")
        .module(modules::greet())
        .build()
        .unwrap();
    let conn = Connection::open(&binding).unwrap();

    // Policy says no, but the explicit command allows unsigned.
    conn.submit(Command::LoadExtension {
        path: "greet".into(),
        trust: TrustMode::AllowUnsigned,
    })
    .unwrap()
    .wait()
    .await
    .unwrap();

    let rows = conn.query("SELECT greet('Sam') AS v").await.unwrap();
    assert_eq!(rows.row(0).unwrap().get("v").unwrap().as_str(), Some("Hello Sam"));

    // And the reverse: options allow, explicit mode requires a signature.
    let strict = EngineBinding::builder()
        .path(":memory:")
        .allow_unsigned_extensions(true)
        .module(modules::greet())
        .build()
        .unwrap();
    let conn2 = Connection::open(&strict).unwrap();
    let err = conn2
        .submit(Command::LoadExtension {
            path: "greet".into(),
            trust: TrustMode::RequireSigned,
        })
        .unwrap()
        .wait()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UntrustedExtension);
    binding.close();
    strict.close();
}

#[tokio::test]
async fn double_load_is_idempotent() {
    let binding = trusted_binding();
    let conn = Connection::open(&binding).unwrap();

    conn.exec("LOAD 'greet'").await.unwrap();
    conn.exec("LOAD 'greet'").await.unwrap();
    assert_eq!(binding.loaded_extensions(), vec!["greet".to_string()]);

    let rows = conn.query("SELECT greet('Sam') AS v").await.unwrap();
    assert_eq!(rows.num_rows(), 1);
    binding.close();
}

#[tokio::test]
async fn load_is_global_across_connections() {
    let binding = trusted_binding();
    let loader = Connection::open(&binding).unwrap();

    // The observer existed before the load and still sees the functions.
    let observer = Connection::open(&binding).unwrap();
    loader.exec("LOAD 'greet'").await.unwrap();

    let rows = observer.query("SELECT greet('Ada') AS v").await.unwrap();
    assert_eq!(
        rows.row(0).unwrap().get("v").unwrap().as_str(),
        Some("Hello Ada")
    );

    let late = Connection::open(&binding).unwrap();
    let rows = late.query("SELECT greet('Eve') AS v").await.unwrap();
    assert_eq!(
        rows.row(0).unwrap().get("v").unwrap().as_str(),
        Some("Hello Eve")
    );
    binding.close();
}

#[tokio::test]
async fn load_by_path_resolves_module_name() {
    let binding = trusted_binding();
    let conn = Connection::open(&binding).unwrap();
    conn.exec("LOAD '/opt/extensions/greet.mod'").await.unwrap();
    assert_eq!(binding.loaded_extensions(), vec!["greet".to_string()]);
    binding.close();
}

#[tokio::test]
async fn unresolved_module_is_load_error() {
    let binding = EngineBinding::builder()
        .path(":memory:")
        .allow_unsigned_extensions(true)
        .build()
        .unwrap();
    let conn = Connection::open(&binding).unwrap();
    let err = conn.exec("LOAD 'missing'").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtensionLoad);
    binding.close();
}

#[tokio::test]
async fn options_from_string_pairs_enable_unsigned_loads() {
    let options =
        EngineOptions::from_pairs([("allow_unsigned_extensions", "true")]).unwrap();
    let binding = EngineBinding::builder()
        .path(":memory:")
        .options(options)
        .module(modules::greet())
        .build()
        .unwrap();
    let conn = Connection::open(&binding).unwrap();
    conn.exec("LOAD 'greet'").await.unwrap();
    binding.close();
}
