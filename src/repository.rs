use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{Employee, EmployeeInput};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("an employee with this email or phone already exists")]
    Duplicate,
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Storage for employee records. Deleted rows are kept but never returned.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Employee>, RepoError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, RepoError>;
    async fn create(&self, input: &EmployeeInput) -> Result<Employee, RepoError>;
    // None when no live employee has this id
    async fn update(&self, id: i64, input: &EmployeeInput) -> Result<Option<Employee>, RepoError>;
    // false when no live employee has this id
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS employees (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        email       TEXT NOT NULL UNIQUE,
        role        TEXT NOT NULL,
        phone       TEXT NOT NULL UNIQUE,
        alamat      TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        deleted_at  TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_employees_email ON employees(email);
    CREATE INDEX IF NOT EXISTS idx_employees_created_at ON employees(created_at);
    CREATE INDEX IF NOT EXISTS idx_employees_role ON employees(role);
    CREATE INDEX IF NOT EXISTS idx_employees_deleted_at ON employees(deleted_at);
    CREATE TABLE IF NOT EXISTS migrations (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        version     TEXT NOT NULL UNIQUE,
        description TEXT,
        applied_at  TEXT NOT NULL
    );";

const MIGRATIONS: &[(&str, &str)] = &[
    ("001", "Create employees table with soft delete"),
    ("002", "Add database indexes"),
    ("003", "Create migration tracking table"),
];

const COLUMNS: &str = "id, name, email, role, phone, alamat, created_at, updated_at";

pub struct SqliteEmployeeRepository {
    conn: Mutex<Connection>,
}

impl SqliteEmployeeRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrate(&conn)?;
        info!("Employee database opened at {:?}", path.as_ref());
        Ok(Self { conn: Mutex::new(conn) })
    }

    // Fresh database that lives as long as the repository
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, RepoError> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    #[cfg(test)]
    pub async fn applied_migrations(&self) -> Result<Vec<String>, RepoError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT version FROM migrations ORDER BY version")?;
        let versions = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(versions)
    }
}

fn migrate(conn: &Connection) -> Result<(), RepoError> {
    conn.execute_batch(SCHEMA)?;
    let now = now_rfc3339();
    for (version, description) in MIGRATIONS {
        conn.execute(
            "INSERT OR IGNORE INTO migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            params![version, description, now],
        )?;
    }
    debug!("Database migrations completed");
    Ok(())
}

// fixed width so created_at sorts correctly as text
fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn map_write_error(err: rusqlite::Error) -> RepoError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            RepoError::Duplicate
        }
        other => RepoError::Sqlite(other),
    }
}

fn row_to_employee(row: &rusqlite::Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        phone: row.get(4)?,
        alamat: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn fetch_live(conn: &Connection, id: i64) -> rusqlite::Result<Option<Employee>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM employees WHERE id = ?1 AND deleted_at IS NULL"),
        params![id],
        row_to_employee,
    )
    .optional()
}

#[async_trait]
impl EmployeeRepository for SqliteEmployeeRepository {
    async fn find_all(&self) -> Result<Vec<Employee>, RepoError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM employees WHERE deleted_at IS NULL ORDER BY created_at DESC, id DESC"
        ))?;
        let employees = stmt
            .query_map([], row_to_employee)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(employees)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, RepoError> {
        let conn = self.conn.lock().await;
        Ok(fetch_live(&conn, id)?)
    }

    async fn create(&self, input: &EmployeeInput) -> Result<Employee, RepoError> {
        let conn = self.conn.lock().await;
        let now = now_rfc3339();
        conn.execute(
            "INSERT INTO employees (name, email, role, phone, alamat, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![input.name, input.email, input.role, input.phone, input.alamat, now],
        )
        .map_err(map_write_error)?;

        let id = conn.last_insert_rowid();
        debug!("Inserted employee {}", id);
        fetch_live(&conn, id)?.ok_or(RepoError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    async fn update(&self, id: i64, input: &EmployeeInput) -> Result<Option<Employee>, RepoError> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute(
                "UPDATE employees SET name = ?1, email = ?2, role = ?3, phone = ?4, alamat = ?5, updated_at = ?6
                 WHERE id = ?7 AND deleted_at IS NULL",
                params![input.name, input.email, input.role, input.phone, input.alamat, now_rfc3339(), id],
            )
            .map_err(map_write_error)?;

        if changed == 0 {
            return Ok(None);
        }
        Ok(fetch_live(&conn, id)?)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE employees SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![now_rfc3339(), id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: &str) -> EmployeeInput {
        EmployeeInput {
            name: name.into(),
            email: email.into(),
            role: "Engineer".into(),
            phone: format!("0812-{email}"),
            alamat: "Jl. Sudirman 1, Jakarta".into(),
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let repo = SqliteEmployeeRepository::in_memory().unwrap();
        let created = repo.create(&input("Budi", "budi@example.com")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.created_at, created.updated_at);

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(repo.find_by_id(9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_newest_first() {
        let repo = SqliteEmployeeRepository::in_memory().unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());

        let first = repo.create(&input("Ani", "ani@example.com")).await.unwrap();
        let second = repo.create(&input("Budi", "budi@example.com")).await.unwrap();

        let ids: Vec<i64> = repo.find_all().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let repo = SqliteEmployeeRepository::in_memory().unwrap();
        repo.create(&input("Ani", "ani@example.com")).await.unwrap();
        let err = repo.create(&input("Ani Lain", "ani@example.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate));
    }

    #[tokio::test]
    async fn duplicate_phone_is_reported() {
        let repo = SqliteEmployeeRepository::in_memory().unwrap();
        let mut first = input("Ani", "ani@example.com");
        first.phone = "0811".into();
        repo.create(&first).await.unwrap();

        let mut second = input("Budi", "budi@example.com");
        second.phone = "0811".into();
        let err = repo.create(&second).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate));

        // taking someone else's phone on update is refused as well
        second.phone = "0822".into();
        let budi = repo.create(&second).await.unwrap();
        second.phone = "0811".into();
        let err = repo.update(budi.id, &second).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate));
    }

    #[tokio::test]
    async fn update_changes_fields() {
        let repo = SqliteEmployeeRepository::in_memory().unwrap();
        let created = repo.create(&input("Ani", "ani@example.com")).await.unwrap();

        let mut changed = input("Ani Wijaya", "ani.w@example.com");
        changed.role = "Manager".into();
        let updated = repo.update(created.id, &changed).await.unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Ani Wijaya");
        assert_eq!(updated.role, "Manager");
        assert_eq!(updated.created_at, created.created_at);

        assert_eq!(repo.update(424242, &changed).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_is_soft_and_hides_row() {
        let repo = SqliteEmployeeRepository::in_memory().unwrap();
        let created = repo.create(&input("Ani", "ani@example.com")).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert_eq!(repo.find_by_id(created.id).await.unwrap(), None);
        assert!(repo.find_all().await.unwrap().is_empty());
        assert_eq!(repo.update(created.id, &input("X Y", "x@example.com")).await.unwrap(), None);

        let conn = repo.conn.lock().await;
        let deleted_at: Option<String> = conn
            .query_row("SELECT deleted_at FROM employees WHERE id = ?1", params![created.id], |r| r.get(0))
            .unwrap();
        assert!(deleted_at.is_some());
    }

    #[tokio::test]
    async fn migrations_are_recorded_once() {
        let repo = SqliteEmployeeRepository::in_memory().unwrap();
        {
            let conn = repo.conn.lock().await;
            migrate(&conn).unwrap();
        }
        assert_eq!(repo.applied_migrations().await.unwrap(), vec!["001", "002", "003"]);
    }
}
