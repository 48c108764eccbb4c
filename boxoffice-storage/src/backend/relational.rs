//! SQLite-backed relational store.
//!
//! One table per entity type. Sequence types use an AUTOINCREMENT integer
//! key, so an identity written explicitly by replication also advances the
//! generator and later generated identities never collide with it.

use super::{filter_by_field, validate_type_name, BackendKind, StoreBackend, UpsertOutcome};
use crate::error::{StorageError, StorageResult};
use boxoffice_model::{EntitySchema, IdStrategy, Record};
use boxoffice_types::{EntityType, Identity};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Relational store backed by a single SQLite connection.
pub struct RelationalBackend {
    conn: Mutex<Connection>,
}

impl RelationalBackend {
    /// Opens (or creates) a database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        debug!("Opened relational store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Poisoned(format!("relational connection: {e}")))
    }
}

fn table(entity_type: &EntityType) -> StorageResult<String> {
    validate_type_name(entity_type)?;
    Ok(format!("\"{}\"", entity_type.as_str()))
}

fn id_value(id: &Identity) -> SqlValue {
    match id {
        Identity::Int(v) => SqlValue::Integer(*v),
        Identity::Text(s) => SqlValue::Text(s.clone()),
    }
}

/// Raw column values of one row, decoded into a [`Record`] outside the
/// rusqlite callback so JSON errors keep their own variant.
struct RawRow {
    id: SqlValue,
    data: String,
    created_at: i64,
    modified_at: i64,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            data: row.get(1)?,
            created_at: row.get(2)?,
            modified_at: row.get(3)?,
        })
    }

    fn into_record(self, entity_type: &EntityType) -> StorageResult<Record> {
        let id = match self.id {
            SqlValue::Integer(v) => Identity::Int(v),
            SqlValue::Text(s) => Identity::Text(s),
            other => {
                return Err(StorageError::InvalidData(format!(
                    "unsupported identity column value in {entity_type}: {other:?}"
                )));
            }
        };
        Ok(Record {
            entity_type: entity_type.clone(),
            id,
            data: serde_json::from_str(&self.data)?,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

/// Converts a simple JSON pointer ("/a/b") into a SQLite JSON path ("$.a.b").
fn json_path(pointer: &str) -> Option<String> {
    let rest = pointer.strip_prefix('/')?;
    let simple = !rest.is_empty()
        && rest
            .split('/')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    simple.then(|| format!("$.{}", rest.replace('/', ".")))
}

/// SQL value `json_extract` yields for a scalar JSON value.
fn json_scalar(value: &serde_json::Value) -> Option<SqlValue> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().map(SqlValue::Integer),
        serde_json::Value::String(s) => Some(SqlValue::Text(s.clone())),
        serde_json::Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        _ => None,
    }
}

impl StoreBackend for RelationalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn ensure_type(&self, schema: &EntitySchema) -> StorageResult<()> {
        let table = table(&schema.entity_type)?;
        let id_column = match schema.id_strategy {
            IdStrategy::Sequence => "id INTEGER PRIMARY KEY AUTOINCREMENT",
            IdStrategy::Uuid => "id TEXT PRIMARY KEY NOT NULL",
        };
        self.conn()?.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {id_column},
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                modified_at INTEGER NOT NULL
            );"
        ))?;
        Ok(())
    }

    fn fetch(&self, entity_type: &EntityType, id: &Identity) -> StorageResult<Option<Record>> {
        let table = table(entity_type)?;
        let raw = self
            .conn()?
            .query_row(
                &format!("SELECT id, data, created_at, modified_at FROM {table} WHERE id = ?1"),
                params![id_value(id)],
                RawRow::read,
            )
            .optional()?;
        raw.map(|r| r.into_record(entity_type)).transpose()
    }

    fn fetch_all(&self, entity_type: &EntityType) -> StorageResult<Vec<Record>> {
        let table = table(entity_type)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, data, created_at, modified_at FROM {table} ORDER BY id"
        ))?;
        let rows = stmt.query_map([], RawRow::read)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_record(entity_type)?);
        }
        Ok(result)
    }

    fn fetch_where(
        &self,
        entity_type: &EntityType,
        field: &str,
        value: &serde_json::Value,
    ) -> StorageResult<Vec<Record>> {
        let (Some(path), Some(scalar)) = (json_path(field), json_scalar(value)) else {
            return Ok(filter_by_field(self.fetch_all(entity_type)?, field, value));
        };

        let table = table(entity_type)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, data, created_at, modified_at FROM {table}
             WHERE json_extract(data, ?1) = ?2 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![path, scalar], RawRow::read)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_record(entity_type)?);
        }
        Ok(result)
    }

    fn insert_generated(&self, schema: &EntitySchema, mut record: Record) -> StorageResult<Record> {
        let table = table(&schema.entity_type)?;
        let data = serde_json::to_string(&record.data)?;
        let conn = self.conn()?;

        match schema.id_strategy {
            IdStrategy::Sequence => {
                conn.execute(
                    &format!("INSERT INTO {table} (data, created_at, modified_at) VALUES (?1, ?2, ?3)"),
                    params![data, record.created_at, record.modified_at],
                )?;
                record.id = Identity::Int(conn.last_insert_rowid());
            }
            IdStrategy::Uuid => {
                record.id = Identity::new_uuid();
                conn.execute(
                    &format!(
                        "INSERT INTO {table} (id, data, created_at, modified_at) VALUES (?1, ?2, ?3, ?4)"
                    ),
                    params![id_value(&record.id), data, record.created_at, record.modified_at],
                )?;
            }
        }
        Ok(record)
    }

    fn upsert(&self, record: &Record) -> StorageResult<UpsertOutcome> {
        let table = table(&record.entity_type)?;
        let data = serde_json::to_string(&record.data)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let existed = tx
            .query_row(
                &format!("SELECT 1 FROM {table} WHERE id = ?1"),
                params![id_value(&record.id)],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        tx.execute(
            &format!(
                "INSERT INTO {table} (id, data, created_at, modified_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    data = excluded.data,
                    created_at = excluded.created_at,
                    modified_at = excluded.modified_at"
            ),
            params![id_value(&record.id), data, record.created_at, record.modified_at],
        )?;
        tx.commit()?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn update(&self, record: &Record) -> StorageResult<bool> {
        let table = table(&record.entity_type)?;
        let data = serde_json::to_string(&record.data)?;
        let changed = self.conn()?.execute(
            &format!("UPDATE {table} SET data = ?2, modified_at = ?3 WHERE id = ?1"),
            params![id_value(&record.id), data, record.modified_at],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, entity_type: &EntityType, id: &Identity) -> StorageResult<bool> {
        let table = table(entity_type)?;
        let changed = self
            .conn()?
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id_value(id)])?;
        Ok(changed > 0)
    }

    fn clear(&self, entity_type: &EntityType) -> StorageResult<usize> {
        let table = table(entity_type)?;
        Ok(self.conn()?.execute(&format!("DELETE FROM {table}"), [])?)
    }

    fn count(&self, entity_type: &EntityType) -> StorageResult<usize> {
        let table = table(entity_type)?;
        let count: i64 = self
            .conn()?
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
