use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A catalog movie. Immutable once fetched; identity is `id`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
}

impl Movie {
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .filter(|y| !y.is_empty())
    }
}

/// One page of a TMDB list response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(rename = "page", default = "first_page")]
    pub page_number: u32,
    #[serde(rename = "results", default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_results: Option<u64>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Video {
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

impl Video {
    pub fn youtube_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }

    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.key)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Image {
    pub file_path: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub iso_639_1: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MovieImages {
    #[serde(default)]
    pub backdrops: Vec<Image>,
    #[serde(default)]
    pub posters: Vec<Image>,
}

/// A user's review of one movie. `id` is `{user_id}_{movie_id}`, so there is at
/// most one per (user, movie).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub rating: u8,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewDraft {
    pub rating: u8,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Favorites,
    Watchlist,
}

impl ListKind {
    pub fn field(&self) -> &'static str {
        match self {
            ListKind::Favorites => "favorites",
            ListKind::Watchlist => "watchlist",
        }
    }

    pub fn other(&self) -> ListKind {
        match self {
            ListKind::Favorites => ListKind::Watchlist,
            ListKind::Watchlist => ListKind::Favorites,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_list_page_with_sparse_movies() {
        let value = json!({
            "page": 2,
            "results": [
                { "id": 550, "title": "Fight Club", "vote_average": 8.4, "poster_path": "/a.jpg" },
                { "id": 13, "title": "Forrest Gump", "release_date": "1994-06-23", "poster_path": null }
            ],
            "total_pages": 40,
            "total_results": 800
        });
        let page: Page<Movie> = serde_json::from_value(value).expect("page deserialize");
        assert_eq!(page.page_number, 2);
        assert_eq!(page.total_pages, Some(40));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].overview, "");
        assert_eq!(page.items[1].poster_path, None);
        assert_eq!(page.items[1].year(), Some("1994"));
    }

    #[test]
    fn review_uses_camel_case_fields() {
        let review = Review {
            id: "u1_550".to_string(),
            user_id: "u1".to_string(),
            username: "ana".to_string(),
            rating: 4,
            text: "Good".to_string(),
            created_at: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&review).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["createdAt"], 1_700_000_000_000i64);
    }
}
