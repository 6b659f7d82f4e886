use std::path::Path;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DbError {
    /// The store file could not be opened. The display text is sent to
    /// clients verbatim, so it must stay exactly as written here.
    #[error("Database connection failed")]
    Connection(#[source] rusqlite::Error),

    /// A statement failed during execution. The store's own message is
    /// passed through unchanged.
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

/// The two managed collections. All controller logic is generic over this
/// enum; the variants differ only in table identity and response labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Income,
    Expense,
}

impl Resource {
    /// Table backing this resource.
    pub fn table(&self) -> &'static str {
        match self {
            Resource::Income => "Incomes",
            Resource::Expense => "Expenses",
        }
    }

    /// Singular label used in status messages ("Income created").
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Income => "Income",
            Resource::Expense => "Expense",
        }
    }
}

/// One stored row, keyed by column name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub value: f64,
    pub date: String,
}

impl Record {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Record {
            id: row.get("id")?,
            name: row.get("name")?,
            value: row.get("value")?,
            date: row.get("date")?,
        })
    }
}

/// Client-supplied fields for create and full update. `id` is never accepted
/// from the caller; the store assigns it on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    pub value: f64,
    pub date: String,
}

/// Open a fresh connection to the store file.
///
/// One handle per request: no pooling, no retry, no health check. The handle
/// closes when dropped, which covers every exit path of the caller.
pub fn open_database<P: AsRef<Path>>(path: P) -> DbResult<Connection> {
    Connection::open(path).map_err(DbError::Connection)
}

/// Create both resource tables if they do not exist yet.
///
/// Runs once at server startup (and in tests). Request handlers assume the
/// schema is already in place.
pub fn setup_database(conn: &Connection) -> DbResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    for resource in [Resource::Income, Resource::Expense] {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT,
                    value REAL,
                    date TEXT
                )",
                resource.table()
            ),
            [],
        )?;
    }

    Ok(())
}

/// Fetch every row in the resource's table, ordered by name ascending.
/// An empty table yields an empty vector, not an error.
pub fn list_records(conn: &Connection, resource: Resource) -> DbResult<Vec<Record>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, value, date FROM {} ORDER BY name",
        resource.table()
    ))?;

    let records = stmt
        .query_map([], Record::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Insert one row. The store assigns the id; it is not reported back.
pub fn insert_record(conn: &Connection, resource: Resource, record: &NewRecord) -> DbResult<usize> {
    let inserted = conn.execute(
        &format!(
            "INSERT INTO {} (name, value, date) VALUES (?1, ?2, ?3)",
            resource.table()
        ),
        params![record.name, record.value, record.date],
    )?;

    Ok(inserted)
}

/// Overwrite all three fields of the row with the given id. There is no
/// partial-update path: the new record replaces the old one entirely.
///
/// A missing id is not an error; the statement affects zero rows and the
/// caller still reports success. Returns the affected-row count so callers
/// and tests can observe that behavior.
pub fn update_record(
    conn: &Connection,
    resource: Resource,
    id: i64,
    record: &NewRecord,
) -> DbResult<usize> {
    let updated = conn.execute(
        &format!(
            "UPDATE {} SET name = ?1, value = ?2, date = ?3 WHERE id = ?4",
            resource.table()
        ),
        params![record.name, record.value, record.date, id],
    )?;

    Ok(updated)
}

/// Remove the row with the given id. Like update, a missing id affects zero
/// rows and is still success.
pub fn delete_record(conn: &Connection, resource: Resource, id: i64) -> DbResult<usize> {
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", resource.table()),
        params![id],
    )?;

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn record(name: &str, value: f64, date: &str) -> NewRecord {
        NewRecord {
            name: name.to_string(),
            value,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_insert_then_list() {
        let conn = test_db();

        insert_record(&conn, Resource::Income, &record("Salary", 5000.0, "2024-01-01")).unwrap();

        let records = list_records(&conn, Resource::Income).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].id > 0, "store must assign a positive id");
        assert_eq!(records[0].name, "Salary");
        assert_eq!(records[0].value, 5000.0);
        assert_eq!(records[0].date, "2024-01-01");
    }

    #[test]
    fn test_list_empty_table() {
        let conn = test_db();

        let records = list_records(&conn, Resource::Expense).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_list_sorted_by_name() {
        let conn = test_db();

        insert_record(&conn, Resource::Expense, &record("Rent", 1200.0, "2024-01-05")).unwrap();
        insert_record(&conn, Resource::Expense, &record("Groceries", 85.5, "2024-01-02")).unwrap();
        insert_record(&conn, Resource::Expense, &record("Utilities", 60.0, "2024-01-03")).unwrap();

        let names: Vec<String> = list_records(&conn, Resource::Expense)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["Groceries", "Rent", "Utilities"]);
    }

    #[test]
    fn test_ids_are_unique_across_inserts() {
        let conn = test_db();

        insert_record(&conn, Resource::Income, &record("Salary", 5000.0, "2024-01-01")).unwrap();
        insert_record(&conn, Resource::Income, &record("Bonus", 750.0, "2024-02-01")).unwrap();

        let records = list_records(&conn, Resource::Income).unwrap();
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_update_replaces_all_fields() {
        let conn = test_db();

        insert_record(&conn, Resource::Income, &record("Salary", 5000.0, "2024-01-01")).unwrap();
        let id = list_records(&conn, Resource::Income).unwrap()[0].id;

        let updated = update_record(
            &conn,
            Resource::Income,
            id,
            &record("Consulting", 6200.0, "2024-02-15"),
        )
        .unwrap();
        assert_eq!(updated, 1);

        let records = list_records(&conn, Resource::Income).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].name, "Consulting");
        assert_eq!(records[0].value, 6200.0);
        assert_eq!(records[0].date, "2024-02-15");
    }

    #[test]
    fn test_update_missing_id_affects_zero_rows() {
        let conn = test_db();

        let updated = update_record(
            &conn,
            Resource::Income,
            9999,
            &record("Ghost", 1.0, "2024-01-01"),
        )
        .unwrap();

        assert_eq!(updated, 0, "a missing id is silent success, not an error");
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let conn = test_db();

        insert_record(&conn, Resource::Expense, &record("Rent", 1200.0, "2024-01-05")).unwrap();
        insert_record(&conn, Resource::Expense, &record("Coffee", 4.5, "2024-01-06")).unwrap();

        let records = list_records(&conn, Resource::Expense).unwrap();
        let rent_id = records.iter().find(|r| r.name == "Rent").unwrap().id;

        let deleted = delete_record(&conn, Resource::Expense, rent_id).unwrap();
        assert_eq!(deleted, 1);

        let remaining = list_records(&conn, Resource::Expense).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Coffee");

        // Second delete of the same id still succeeds with zero rows
        let deleted_again = delete_record(&conn, Resource::Expense, rent_id).unwrap();
        assert_eq!(deleted_again, 0);
    }

    #[test]
    fn test_tables_are_independent() {
        let conn = test_db();

        insert_record(&conn, Resource::Income, &record("Salary", 5000.0, "2024-01-01")).unwrap();

        assert_eq!(list_records(&conn, Resource::Income).unwrap().len(), 1);
        assert!(list_records(&conn, Resource::Expense).unwrap().is_empty());
    }

    #[test]
    fn test_open_failure_is_connection_error() {
        // A directory is not a valid store file, so open must fail without
        // handing back a connection.
        let dir = tempfile::tempdir().unwrap();
        let err = open_database(dir.path()).unwrap_err();

        assert!(matches!(err, DbError::Connection(_)));
        assert_eq!(err.to_string(), "Database connection failed");
    }
}
