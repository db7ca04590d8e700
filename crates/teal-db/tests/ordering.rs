//! Per-connection ordering guarantees under concurrent load.

use teal_db::{Command, Connection, EngineBinding, Value};

fn binding() -> EngineBinding {
    EngineBinding::builder()
        .path(":memory:")
        .worker_threads(4)
        .build()
        .unwrap()
}

fn insert(conn_tag: i64, seq: i64) -> Command {
    Command::Execute {
        sql: "INSERT INTO log (conn, seq) VALUES (?1, ?2)".into(),
        params: vec![Value::Integer(conn_tag), Value::Integer(seq)],
    }
}

#[tokio::test]
async fn commands_on_one_connection_complete_in_submission_order() {
    let binding = binding();
    let setup = Connection::open(&binding).unwrap();
    setup
        .exec("CREATE TABLE log (conn INTEGER, seq INTEGER)")
        .await
        .unwrap();

    let a = Connection::open(&binding).unwrap();
    let b = Connection::open(&binding).unwrap();

    // Interleave submissions across two connections without awaiting, so
    // both queues are deep while workers drain them.
    let mut handles = Vec::new();
    for i in 0..30 {
        handles.push(a.submit(insert(1, i)).unwrap());
        handles.push(b.submit(insert(2, i)).unwrap());
    }
    for handle in handles {
        handle.wait().await.unwrap();
    }

    // Execution order per connection is the insertion order in the table.
    for tag in [1i64, 2] {
        let rows = setup
            .query_with(
                "SELECT seq FROM log WHERE conn = ?1 ORDER BY rowid",
                &[Value::Integer(tag)],
            )
            .await
            .unwrap();
        let seqs: Vec<i64> = rows
            .rows()
            .iter()
            .map(|r| r.get("seq").unwrap().as_i64().unwrap())
            .collect();
        let expected: Vec<i64> = (0..30).collect();
        assert_eq!(seqs, expected, "connection {tag} executed out of order");
    }
    binding.close();
}

#[tokio::test]
async fn handles_resolve_in_submission_order() {
    let binding = binding();
    let conn = Connection::open(&binding).unwrap();
    conn.exec("CREATE TABLE t (v INTEGER)").await.unwrap();

    // Submit a write followed by a read; the read must observe the write
    // even though both were submitted before either completed.
    let write = conn
        .submit(Command::Execute {
            sql: "INSERT INTO t VALUES (1)".into(),
            params: vec![],
        })
        .unwrap();
    let read = conn
        .submit(Command::Query {
            sql: "SELECT COUNT(*) AS n FROM t".into(),
            params: vec![],
        })
        .unwrap();

    write.wait().await.unwrap();
    let rows = read.wait().await.unwrap();
    assert_eq!(rows.row(0).unwrap().get("n").unwrap().as_i64(), Some(1));
    binding.close();
}

#[tokio::test]
async fn sequence_numbers_are_per_connection() {
    let binding = binding();
    let a = Connection::open(&binding).unwrap();
    let b = Connection::open(&binding).unwrap();

    let h0 = a.submit(Command::Query {
        sql: "SELECT 1".into(),
        params: vec![],
    });
    let h1 = a.submit(Command::Query {
        sql: "SELECT 1".into(),
        params: vec![],
    });
    let other = b.submit(Command::Query {
        sql: "SELECT 1".into(),
        params: vec![],
    });

    assert_eq!(h0.unwrap().sequence(), 0);
    assert_eq!(h1.unwrap().sequence(), 1);
    assert_eq!(other.unwrap().sequence(), 0);
    binding.close();
}

#[tokio::test]
async fn file_backed_connections_run_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teal.db");
    let binding = EngineBinding::builder()
        .path(path.to_str().unwrap())
        .worker_threads(4)
        .build()
        .unwrap();

    let setup = Connection::open(&binding).unwrap();
    setup
        .exec("CREATE TABLE t (v INTEGER)")
        .await
        .unwrap();
    setup.exec("INSERT INTO t VALUES (1)").await.unwrap();

    let conns: Vec<Connection> = (0..4)
        .map(|_| Connection::open(&binding).unwrap())
        .collect();
    let mut handles = Vec::new();
    for conn in &conns {
        for _ in 0..10 {
            handles.push(
                conn.submit(Command::Query {
                    sql: "SELECT v FROM t".into(),
                    params: vec![],
                })
                .unwrap(),
            );
        }
    }
    for handle in handles {
        let rows = handle.wait().await.unwrap();
        assert_eq!(rows.num_rows(), 1);
    }
    binding.close();
}
