use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

mod client;
mod memory;
mod value;

pub use client::FirestoreClient;
pub use memory::MemoryDocumentStore;
pub use value::{decode_fields, encode_fields};

pub type Fields = Map<String, Value>;

/// Remote document database used as a per-user key/array store.
///
/// Paths are slash-separated alternating collection/document ids, e.g.
/// `users/{uid}` or `movies/{movie_id}/reviews/{review_id}`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Fields>>;
    /// Creates or fully overwrites the document.
    async fn set(&self, path: &str, fields: Fields) -> Result<()>;
    /// Creates the document if needed and overwrites only the given fields.
    async fn merge(&self, path: &str, fields: Fields) -> Result<()>;
    /// Succeeds when the document does not exist.
    async fn delete(&self, path: &str) -> Result<()>;
    async fn list(&self, collection: &str) -> Result<Vec<Fields>>;
}

fn segment(id: &str) -> Result<&str> {
    if id.is_empty() || id.contains('/') {
        return Err(Error::Validation(format!("invalid document id '{}'", id)));
    }
    Ok(id)
}

pub fn user_doc(uid: &str) -> Result<String> {
    Ok(format!("users/{}", segment(uid)?))
}

pub fn reviews_collection(movie_id: i64) -> String {
    format!("movies/{}/reviews", movie_id)
}

/// `{uid}_{movie_id}`: one review per user per movie.
pub fn review_id(uid: &str, movie_id: i64) -> String {
    format!("{}_{}", uid, movie_id)
}

pub fn review_doc(movie_id: i64, uid: &str) -> Result<String> {
    Ok(format!(
        "{}/{}",
        reviews_collection(movie_id),
        review_id(segment(uid)?, movie_id)
    ))
}
