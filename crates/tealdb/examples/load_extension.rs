//! Load the built-in `greet` extension module and call its functions.

use tealdb::{Connection, EngineBinding};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let binding = EngineBinding::builder()
        .path(":memory:")
        .allow_unsigned_extensions(true)
        .module(tealdb::engine::modules::greet())
        .build()?;
    let conn = Connection::open(&binding)?;

    conn.exec("LOAD 'greet'").await?;
    println!("loaded extensions: {:?}", binding.loaded_extensions());

    let rows = conn.query("SELECT greet('Sam') AS value").await?;
    println!("{}", rows.row(0).unwrap().get("value").unwrap().as_str().unwrap());

    let rows = conn
        .query("SELECT greet_version('Michael') AS value")
        .await?;
    println!("{}", rows.row(0).unwrap().get("value").unwrap().as_str().unwrap());

    binding.close();
    Ok(())
}
