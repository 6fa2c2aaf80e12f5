use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;
use rusqlite::{Connection, params};
use serde_json::Value;

use crate::remote::{Document, merge_into};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY,
                    value BLOB NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS documents (
                    collection TEXT NOT NULL,
                    doc_id TEXT NOT NULL,
                    body TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (collection, doc_id)
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Key/value (on-device store) ---

    pub fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn kv_set(&self, key: &str, value: &[u8]) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("Failed to write key '{key}'"))?;
        Ok(())
    }

    /// All entries whose key starts with `prefix`, in key order.
    pub fn kv_scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM kv_store
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key",
        )?;
        let rows = stmt
            .query_map(params![prefix], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- Documents (remote multi-device store) ---

    fn document_from_body(body: &str) -> Result<Document> {
        match serde_json::from_str(body).context("Stored document is not valid JSON")? {
            Value::Object(map) => Ok(map),
            _ => bail!("Stored document is not a JSON object"),
        }
    }

    pub fn get_document(&self, collection: &str, doc_id: &str) -> Result<Option<Document>> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2")?;
        let mut rows = stmt.query(params![collection, doc_id])?;
        if let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            Ok(Some(Self::document_from_body(&body)?))
        } else {
            Ok(None)
        }
    }

    /// Merge `partial` into the stored document, creating it when absent.
    /// Returns the merged document.
    pub fn merge_document(
        &self,
        collection: &str,
        doc_id: &str,
        partial: Document,
    ) -> Result<Document> {
        let tx = self.conn.unchecked_transaction()?;
        let mut doc = self.get_document(collection, doc_id)?.unwrap_or_default();
        merge_into(&mut doc, partial);
        let body = serde_json::to_string(&doc)?;
        let now = Local::now().to_rfc3339();
        tx.execute(
            "INSERT INTO documents (collection, doc_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(collection, doc_id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![collection, doc_id, body, now],
        )?;
        tx.commit()?;
        Ok(doc)
    }

    /// Documents in `collection` whose top-level `field` equals `value`.
    pub fn query_documents_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let path = json_path(field)?;
        let needle = serde_json::to_string(value)?;
        let mut stmt = self.conn.prepare(
            "SELECT body FROM documents
             WHERE collection = ?1 AND json_extract(body, ?2) = json_extract(?3, '$')
             ORDER BY doc_id
             LIMIT ?4",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let bodies = stmt
            .query_map(params![collection, path, needle, limit], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        bodies.iter().map(|b| Self::document_from_body(b)).collect()
    }

    /// The `limit` documents with the greatest `order_field`, highest first.
    pub fn recent_documents(
        &self,
        collection: &str,
        order_field: &str,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let path = json_path(order_field)?;
        let mut stmt = self.conn.prepare(
            "SELECT body FROM documents
             WHERE collection = ?1 AND json_extract(body, ?2) IS NOT NULL
             ORDER BY json_extract(body, ?2) DESC
             LIMIT ?3",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let bodies = stmt
            .query_map(params![collection, path, limit], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        bodies.iter().map(|b| Self::document_from_body(b)).collect()
    }
}

/// Build a JSON path for a top-level field, rejecting anything that could
/// escape into a nested or quoted path.
pub fn json_path(field: &str) -> Result<String> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("Invalid document field name '{field}'");
    }
    Ok(format!("$.{field}"))
}
