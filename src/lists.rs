//! Per-user favorites and watchlist, stored as two arrays on `users/{uid}`.

use crate::error::{Error, Result};
use crate::firestore::{user_doc, DocumentStore, Fields};
use crate::models::{ListKind, Movie};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserLists {
    pub favorites: Vec<Movie>,
    pub watchlist: Vec<Movie>,
}

impl UserLists {
    pub fn list(&self, kind: ListKind) -> &[Movie] {
        match kind {
            ListKind::Favorites => &self.favorites,
            ListKind::Watchlist => &self.watchlist,
        }
    }

    pub fn contains(&self, kind: ListKind, movie_id: i64) -> bool {
        self.list(kind).iter().any(|m| m.id == movie_id)
    }
}

/// Collapses entries sharing an id: the first position wins, the last
/// written fields win.
pub fn dedupe_by_id(movies: Vec<Movie>) -> Vec<Movie> {
    let mut out: Vec<Movie> = Vec::with_capacity(movies.len());
    for movie in movies {
        match out.iter_mut().find(|m| m.id == movie.id) {
            Some(existing) => *existing = movie,
            None => out.push(movie),
        }
    }
    out
}

#[derive(Clone)]
pub struct UserListStore {
    docs: Arc<dyn DocumentStore>,
}

impl UserListStore {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    pub async fn get(&self, kind: ListKind, uid: &str) -> Result<Vec<Movie>> {
        let doc = self.docs.get(&user_doc(uid)?).await?;
        match doc {
            Some(fields) => decode_list(&fields, kind),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_all(&self, uid: &str) -> Result<UserLists> {
        let Some(fields) = self.docs.get(&user_doc(uid)?).await? else {
            return Ok(UserLists::default());
        };
        Ok(UserLists {
            favorites: decode_list(&fields, ListKind::Favorites)?,
            watchlist: decode_list(&fields, ListKind::Watchlist)?,
        })
    }

    pub async fn contains(&self, kind: ListKind, uid: &str, movie_id: i64) -> Result<bool> {
        Ok(self.get(kind, uid).await?.iter().any(|m| m.id == movie_id))
    }

    /// Adds `movie`, or replaces the stored entry with the same id. Creates the
    /// user document on first use.
    pub async fn add(&self, kind: ListKind, uid: &str, movie: &Movie) -> Result<()> {
        let path = user_doc(uid)?;
        debug!(uid, movie_id = movie.id, list = kind.field(), "adding to list");
        match self.docs.get(&path).await? {
            None => {
                let mut fields = Fields::new();
                fields.insert(kind.field().to_string(), encode_list(std::slice::from_ref(movie))?);
                fields.insert(kind.other().field().to_string(), Value::Array(Vec::new()));
                self.docs.set(&path, fields).await
            }
            Some(existing) => {
                let mut list = decode_list(&existing, kind)?;
                match list.iter_mut().find(|m| m.id == movie.id) {
                    Some(slot) => *slot = movie.clone(),
                    None => list.push(movie.clone()),
                }
                self.write_list(&path, kind, &list).await
            }
        }
    }

    /// Removes every entry with `movie_id`. Removing an absent movie is a no-op.
    pub async fn remove(&self, kind: ListKind, uid: &str, movie_id: i64) -> Result<()> {
        let path = user_doc(uid)?;
        debug!(uid, movie_id, list = kind.field(), "removing from list");
        let Some(existing) = self.docs.get(&path).await? else {
            return Ok(());
        };
        let list = decode_list(&existing, kind)?;
        let kept: Vec<Movie> = list.into_iter().filter(|m| m.id != movie_id).collect();
        self.write_list(&path, kind, &kept).await
    }

    async fn write_list(&self, path: &str, kind: ListKind, list: &[Movie]) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert(kind.field().to_string(), encode_list(list)?);
        self.docs.merge(path, fields).await
    }
}

fn encode_list(list: &[Movie]) -> Result<Value> {
    Ok(serde_json::to_value(list)?)
}

fn decode_list(fields: &Fields, kind: ListKind) -> Result<Vec<Movie>> {
    let items = match fields.get(kind.field()) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(Error::Malformed(format!(
                "{} is not an array: {}",
                kind.field(),
                other
            )))
        }
    };
    let movies = items
        .iter()
        .filter_map(|item| match serde_json::from_value::<Movie>(item.clone()) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("Skipping unreadable {} entry: {}", kind.field(), e);
                None
            }
        })
        .collect();
    Ok(dedupe_by_id(movies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::MemoryDocumentStore;
    use serde_json::json;

    fn movie(id: i64, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            overview: String::new(),
            release_date: None,
            vote_average: 6.5,
            vote_count: 3,
            poster_path: None,
            backdrop_path: None,
            genres: None,
        }
    }

    fn store() -> (Arc<MemoryDocumentStore>, UserListStore) {
        let docs = Arc::new(MemoryDocumentStore::new());
        (docs.clone(), UserListStore::new(docs))
    }

    #[tokio::test]
    async fn first_add_creates_document_with_both_lists() {
        let (docs, lists) = store();
        lists.add(ListKind::Watchlist, "u1", &movie(1, "A")).await.unwrap();
        let doc = docs.get("users/u1").await.unwrap().unwrap();
        assert_eq!(doc["favorites"], json!([]));
        assert_eq!(doc["watchlist"][0]["id"], json!(1));
    }

    #[tokio::test]
    async fn add_then_remove_round_trip() {
        let (_, lists) = store();
        let m = movie(550, "Fight Club");
        lists.add(ListKind::Favorites, "u1", &m).await.unwrap();
        assert!(lists.contains(ListKind::Favorites, "u1", 550).await.unwrap());
        assert!(!lists.contains(ListKind::Watchlist, "u1", 550).await.unwrap());

        lists.remove(ListKind::Favorites, "u1", 550).await.unwrap();
        assert!(!lists.contains(ListKind::Favorites, "u1", 550).await.unwrap());
        lists.remove(ListKind::Favorites, "u1", 550).await.unwrap();
        lists.remove(ListKind::Favorites, "nobody", 550).await.unwrap();
    }

    #[tokio::test]
    async fn re_add_replaces_fields_by_id() {
        let (_, lists) = store();
        lists.add(ListKind::Favorites, "u1", &movie(1, "Old")).await.unwrap();
        lists.add(ListKind::Favorites, "u1", &movie(2, "Other")).await.unwrap();
        lists.add(ListKind::Favorites, "u1", &movie(1, "New")).await.unwrap();

        let favs = lists.get(ListKind::Favorites, "u1").await.unwrap();
        assert_eq!(favs.len(), 2);
        assert_eq!(favs[0].title, "New");
        assert_eq!(favs[1].id, 2);
    }

    #[tokio::test]
    async fn reads_collapse_legacy_duplicates() {
        let (docs, lists) = store();
        let mut fields = Fields::new();
        fields.insert(
            "favorites".to_string(),
            json!([
                { "id": 1, "title": "Stale" },
                { "id": 2, "title": "B" },
                { "id": 1, "title": "Fresh" },
                { "title": "missing id" }
            ]),
        );
        docs.set("users/u1", fields).await.unwrap();

        let all = lists.get_all("u1").await.unwrap();
        assert_eq!(all.favorites.len(), 2);
        assert_eq!(all.favorites[0].title, "Fresh");
        assert!(all.watchlist.is_empty());
        assert!(all.contains(ListKind::Favorites, 2));
    }

    #[tokio::test]
    async fn removing_from_one_list_leaves_the_other() {
        let (_, lists) = store();
        lists.add(ListKind::Favorites, "u1", &movie(1, "A")).await.unwrap();
        lists.add(ListKind::Watchlist, "u1", &movie(1, "A")).await.unwrap();
        lists.remove(ListKind::Favorites, "u1", 1).await.unwrap();
        let all = lists.get_all("u1").await.unwrap();
        assert!(all.favorites.is_empty());
        assert_eq!(all.watchlist.len(), 1);
    }
}
