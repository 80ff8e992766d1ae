use rowtags_core::db::migrations::latest_version;
use rowtags_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "rows");
    assert_table_exists(&conn, "row_attributes");
    assert_table_exists(&conn, "row_markers");
}

#[test]
fn reopening_a_document_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO rows (row_uuid, position, text) VALUES ('r1', 0, 'keep me #k');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let text: String = second
        .query_row("SELECT text FROM rows WHERE row_uuid = 'r1';", [], |row| row.get(0))
        .unwrap();
    assert_eq!(text, "keep me #k");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn current_version_without_document_tables_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hollow.db");

    let conn = Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", latest_version())
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::MissingTable(table) => assert_eq!(table, "rows"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_a_row_cascades_to_attributes_and_markers() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO rows (row_uuid, position, text) VALUES ('r1', 0, 'x #k');
         INSERT INTO row_attributes (row_uuid, key, value) VALUES ('r1', 'tags', '[\"#k\"]');
         INSERT INTO row_markers (row_uuid, name, value, span_start, span_end)
             VALUES ('r1', 'tag', '#k', 2, 4);
         DELETE FROM rows WHERE row_uuid = 'r1';",
    )
    .unwrap();

    assert_eq!(count(&conn, "row_attributes"), 0);
    assert_eq!(count(&conn, "row_markers"), 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
