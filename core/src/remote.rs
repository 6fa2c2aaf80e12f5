//! Remote Store contract.
//!
//! The remote side is a per-user document database: schema-free JSON objects
//! grouped in slash-separated collections (`users`, `users/{uid}/daily_progress`).
//! Writes are partial merges; nested objects merge key by key, every other
//! value (arrays included) is replaced.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::db::Database;
use crate::error::RemoteError;

pub type Document = Map<String, Value>;

pub const USERS_COLLECTION: &str = "users";

#[must_use]
pub fn progress_collection(identity: &str) -> String {
    format!("{USERS_COLLECTION}/{identity}/daily_progress")
}

/// Recursively merge `patch` into `target`. A `null` in the patch is stored
/// as `null`, replacing whatever was there.
pub fn merge_into(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        let Value::Object(incoming) = value else {
            target.insert(key, value);
            continue;
        };
        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            merge_into(existing, incoming);
            continue;
        }
        target.insert(key, Value::Object(incoming));
    }
}

/// Convert a serialized entity into a document. Entities always serialize to
/// JSON objects; anything else is reported as malformed.
pub fn to_document<T: serde::Serialize>(value: &T) -> Result<Document, RemoteError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RemoteError::Malformed(
            "entity did not serialize to an object".to_string(),
        )),
        Err(e) => Err(RemoteError::Malformed(e.to_string())),
    }
}

/// A network-reachable, per-user document database.
///
/// Implementations are expected to bound their own network calls; the sync
/// engine additionally wraps every call in its own timeout.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<Document>, RemoteError>;

    async fn merge_write(
        &self,
        collection: &str,
        doc_id: &str,
        partial: Document,
    ) -> Result<(), RemoteError>;

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: Value,
        limit: usize,
    ) -> Result<Vec<Document>, RemoteError>;

    /// Documents ordered by `order_field`, highest first.
    async fn query_recent(
        &self,
        collection: &str,
        order_field: &str,
        limit: usize,
    ) -> Result<Vec<Document>, RemoteError>;
}

/// In-process document store backed by the same sqlite database the
/// `serve` command exposes over HTTP.
#[derive(Clone)]
pub struct EmbeddedRemote {
    db: Arc<Mutex<Database>>,
}

impl EmbeddedRemote {
    #[must_use]
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(Mutex::new(Database::open_in_memory()?))))
    }

    #[must_use]
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    fn with_db<T>(
        &self,
        f: impl FnOnce(&Database) -> anyhow::Result<T>,
    ) -> Result<T, RemoteError> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        f(&db).map_err(|e| RemoteError::Transport(format!("{e:#}")))
    }
}

#[async_trait]
impl RemoteStore for EmbeddedRemote {
    async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<Document>, RemoteError> {
        self.with_db(|db| db.get_document(collection, doc_id))
    }

    async fn merge_write(
        &self,
        collection: &str,
        doc_id: &str,
        partial: Document,
    ) -> Result<(), RemoteError> {
        self.with_db(|db| db.merge_document(collection, doc_id, partial).map(|_| ()))
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: Value,
        limit: usize,
    ) -> Result<Vec<Document>, RemoteError> {
        self.with_db(|db| db.query_documents_by_field(collection, field, &value, limit))
    }

    async fn query_recent(
        &self,
        collection: &str,
        order_field: &str,
        limit: usize,
    ) -> Result<Vec<Document>, RemoteError> {
        self.with_db(|db| db.recent_documents(collection, order_field, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_merge_into_nested_objects() {
        let mut target = doc(json!({
            "name": "Alex",
            "goals": { "dailyCalories": 2600, "macroRatio": { "p": 30, "c": 45, "f": 25 } }
        }));
        merge_into(
            &mut target,
            doc(json!({ "goals": { "macroRatio": { "p": 35 } }, "email": "a@b.c" })),
        );

        assert_eq!(target["name"], "Alex");
        assert_eq!(target["email"], "a@b.c");
        assert_eq!(target["goals"]["dailyCalories"], 2600);
        assert_eq!(target["goals"]["macroRatio"], json!({ "p": 35, "c": 45, "f": 25 }));
    }

    #[test]
    fn test_merge_into_replaces_arrays() {
        let mut target = doc(json!({ "reminders": [{ "id": "a" }, { "id": "b" }] }));
        merge_into(&mut target, doc(json!({ "reminders": [{ "id": "c" }] })));
        assert_eq!(target["reminders"], json!([{ "id": "c" }]));
    }

    #[test]
    fn test_merge_into_object_replaces_scalar() {
        let mut target = doc(json!({ "macros": 0 }));
        merge_into(&mut target, doc(json!({ "macros": { "protein": 10 } })));
        assert_eq!(target["macros"], json!({ "protein": 10 }));
    }

    #[test]
    fn test_merge_into_null_clears_value() {
        let mut target = doc(json!({ "email": "a@b.c", "goals": { "targetWeight": 70 } }));
        merge_into(
            &mut target,
            doc(json!({ "email": null, "goals": { "targetWeight": null } })),
        );
        assert_eq!(target["email"], Value::Null);
        assert_eq!(target["goals"]["targetWeight"], Value::Null);
    }

    #[test]
    fn test_progress_collection_path() {
        assert_eq!(progress_collection("u1"), "users/u1/daily_progress");
    }

    #[tokio::test]
    async fn test_embedded_remote_roundtrip() {
        let remote = EmbeddedRemote::in_memory().unwrap();
        assert!(remote.get_document("users", "u1").await.unwrap().is_none());

        remote
            .merge_write("users", "u1", doc(json!({ "name": "Alex" })))
            .await
            .unwrap();
        let fetched = remote.get_document("users", "u1").await.unwrap().unwrap();
        assert_eq!(fetched["name"], "Alex");

        let coll = progress_collection("u1");
        remote
            .merge_write(&coll, "2024-05-01", doc(json!({ "date": "2024-05-01" })))
            .await
            .unwrap();
        let hits = remote
            .query_by_field(&coll, "date", json!("2024-05-01"), 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        let recent = remote.query_recent(&coll, "date", 30).await.unwrap();
        assert_eq!(recent.len(), 1);
    }
}
