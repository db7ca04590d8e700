//! Open a binding, run a few statements, and read rows back.

use tealdb::{Connection, EngineBinding, Value};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let binding = EngineBinding::builder().path(":memory:").build()?;
    let conn = Connection::open(&binding)?;

    conn.exec("CREATE TABLE trades (symbol TEXT, price DOUBLE)")
        .await?;
    conn.exec_with(
        "INSERT INTO trades VALUES (?1, ?2)",
        &[Value::Text("AAPL".into()), Value::Float(175.5)],
    )
    .await?;
    conn.exec_with(
        "INSERT INTO trades VALUES (?1, ?2)",
        &[Value::Text("MSFT".into()), Value::Float(410.0)],
    )
    .await?;

    let rows = conn
        .query("SELECT symbol, price FROM trades ORDER BY symbol")
        .await?;
    for row in rows.rows() {
        println!(
            "{}: {}",
            row.get("symbol").unwrap().as_str().unwrap(),
            row.get("price").unwrap().as_f64().unwrap()
        );
    }

    binding.close();
    Ok(())
}
