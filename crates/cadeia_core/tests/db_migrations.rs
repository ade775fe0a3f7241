use cadeia_core::db::migrations::latest_version;
use cadeia_core::db::{open_db, open_db_in_memory, DbError};
use cadeia_core::{ChainRepoError, SqliteChainRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "registry_offices",
        "properties",
        "documents",
        "entries",
        "imported_documents",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cadeia.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "documents");
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
fn failed_migration_is_named_and_rolled_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE registry_offices (legacy TEXT);")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert_eq!(err.failed_migration(), Some(1));
    assert!(matches!(
        err,
        DbError::Migration {
            version: 1,
            name: "registry",
            ..
        }
    ));
    assert!(err.to_string().contains("registry migration 1"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    let documents: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'documents';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(documents, 0);
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteChainRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        ChainRepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
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
