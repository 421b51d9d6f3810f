use crate::error::Result;
use crate::models::Movie;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tracing::warn;

pub const RECENTLY_VIEWED_KEY: &str = "recently_viewed_movies";
pub const RECENTLY_VIEWED_CAPACITY: usize = 10;

/// Moves `movie` to the front of `recent`, dropping any older entry with the
/// same id and anything past `capacity`.
pub fn push_recent(recent: &mut Vec<Movie>, movie: Movie, capacity: usize) {
    recent.retain(|m| m.id != movie.id);
    recent.insert(0, movie);
    recent.truncate(capacity);
}

/// Most-recently-viewed-first movie history persisted in the local store.
#[derive(Clone)]
pub struct RecentlyViewed {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl RecentlyViewed {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            capacity: RECENTLY_VIEWED_CAPACITY,
        }
    }

    pub async fn record_view(&self, movie: &Movie) -> Result<Vec<Movie>> {
        let mut recent = self.get_recent().await?;
        push_recent(&mut recent, movie.clone(), self.capacity);
        let encoded = serde_json::to_string(&recent)?;
        self.store.set(RECENTLY_VIEWED_KEY, &encoded).await?;
        Ok(recent)
    }

    pub async fn get_recent(&self) -> Result<Vec<Movie>> {
        let Some(raw) = self.store.get(RECENTLY_VIEWED_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<Movie>>(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                warn!("Ignoring unreadable recently viewed list: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(RECENTLY_VIEWED_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn movie(id: i64) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            overview: String::new(),
            release_date: None,
            vote_average: 7.0,
            vote_count: 10,
            poster_path: None,
            backdrop_path: None,
            genres: None,
        }
    }

    fn ids(list: &[Movie]) -> Vec<i64> {
        list.iter().map(|m| m.id).collect()
    }

    #[test]
    fn re_view_moves_to_front() {
        let mut recent = Vec::new();
        push_recent(&mut recent, movie(1), 10);
        push_recent(&mut recent, movie(2), 10);
        push_recent(&mut recent, movie(1), 10);
        assert_eq!(ids(&recent), vec![1, 2]);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recent() {
        let recent = RecentlyViewed::new(Arc::new(MemoryStore::new()));
        recent.record_view(&movie(1)).await.unwrap();
        recent.record_view(&movie(2)).await.unwrap();
        recent.record_view(&movie(1)).await.unwrap();
        for id in 3..=11 {
            recent.record_view(&movie(id)).await.unwrap();
        }

        let list = recent.get_recent().await.unwrap();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0].id, 11);
        let mut seen = ids(&list);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10);
        // 2 was the least recently viewed of the 11 distinct ids.
        assert!(!ids(&list).contains(&2));
        assert!(ids(&list).contains(&1));
    }

    #[tokio::test]
    async fn corrupt_storage_reads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(RECENTLY_VIEWED_KEY, "{not json").await.unwrap();
        let recent = RecentlyViewed::new(store.clone());
        assert!(recent.get_recent().await.unwrap().is_empty());

        recent.record_view(&movie(5)).await.unwrap();
        assert_eq!(ids(&recent.get_recent().await.unwrap()), vec![5]);

        recent.clear().await.unwrap();
        assert_eq!(store.get(RECENTLY_VIEWED_KEY).await.unwrap(), None);
    }
}
