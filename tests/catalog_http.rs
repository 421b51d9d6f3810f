use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cinescope::feed::{CatalogPageSource, QueryKey};
use cinescope::pagination::{LoadOutcome, PaginationController};
use cinescope::tmdb::{CatalogApi, TmdbClient};
use cinescope::Error;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const API_KEY: &str = "test-key";

type Params = Query<HashMap<String, String>>;

fn authorized(q: &HashMap<String, String>) -> bool {
    q.get("api_key").map(String::as_str) == Some(API_KEY)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "status_message": "Invalid API key" })),
    )
        .into_response()
}

fn movie(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "overview": "",
        "release_date": "2023-07-21",
        "vote_average": 7.5,
        "vote_count": 100,
        "poster_path": format!("/p{}.jpg", id),
        "backdrop_path": null
    })
}

async fn popular(Query(q): Params) -> Response {
    if !authorized(&q) {
        return unauthorized();
    }
    let page: i64 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let results: Vec<Value> = (0..3)
        .map(|i| movie(page * 100 + i, &format!("Popular {}-{}", page, i)))
        .collect();
    Json(json!({ "page": page, "results": results, "total_pages": 2, "total_results": 6 }))
        .into_response()
}

async fn trending(Query(q): Params) -> Response {
    if !authorized(&q) {
        return unauthorized();
    }
    Json(json!({ "page": 1, "results": [movie(7, "Trending")], "total_pages": 1000 }))
        .into_response()
}

async fn search(Query(q): Params) -> Response {
    let query = q.get("query").cloned().unwrap_or_default();
    Json(json!({ "page": 1, "results": [movie(1, &query)], "total_pages": 1 })).into_response()
}

async fn discover(Query(q): Params) -> Response {
    let title = format!(
        "{}|{}",
        q.get("with_genres").cloned().unwrap_or_default(),
        q.get("sort_by").cloned().unwrap_or_default()
    );
    Json(json!({ "page": 1, "results": [movie(2, &title)] })).into_response()
}

async fn details(Path(id): Path<i64>) -> Response {
    match id {
        404 => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status_message": "The resource you requested could not be found." })),
        )
            .into_response(),
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => {
            let mut m = movie(id, "Oppenheimer");
            m["genres"] = json!([{ "id": 18, "name": "Drama" }]);
            Json(m).into_response()
        }
    }
}

async fn credits(Path(id): Path<i64>) -> Response {
    if id == 13 {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }
    Json(json!({
        "cast": [{ "id": 1, "name": "Cillian Murphy", "character": "J. Robert Oppenheimer", "profile_path": "/c.jpg" }],
        "crew": [{ "id": 2, "name": "Christopher Nolan", "job": "Director" }]
    }))
    .into_response()
}

async fn videos(Path(_id): Path<i64>) -> Response {
    Json(json!({
        "id": 1,
        "results": [
            { "key": "teaser", "name": "Teaser", "site": "YouTube", "type": "Teaser", "official": true },
            { "key": "trailer", "name": "Official Trailer", "site": "YouTube", "type": "Trailer", "official": true }
        ]
    }))
    .into_response()
}

async fn spawn_tmdb() -> String {
    let app = Router::new()
        .route("/movie/popular", get(popular))
        .route("/trending/movie/day", get(trending))
        .route("/search/movie", get(search))
        .route("/discover/movie", get(discover))
        .route("/movie/:id", get(details))
        .route("/movie/:id/credits", get(credits))
        .route("/movie/:id/videos", get(videos));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn client() -> TmdbClient {
    let base = spawn_tmdb().await;
    TmdbClient::new(API_KEY, &base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn popular_feed_pages_until_total_pages() {
    let client = Arc::new(client().await);
    let feed = PaginationController::new(Arc::new(CatalogPageSource::new(client)));

    assert_eq!(
        feed.reset(QueryKey::Popular).await.unwrap(),
        LoadOutcome::Appended { page: 1, count: 3 }
    );
    assert_eq!(
        feed.load_next().await.unwrap(),
        LoadOutcome::Appended { page: 2, count: 3 }
    );
    assert_eq!(feed.load_next().await.unwrap(), LoadOutcome::Skipped);

    let ids: Vec<i64> = feed.items().await.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![100, 101, 102, 200, 201, 202]);
    assert!(!feed.has_more().await);
}

#[tokio::test]
async fn trending_is_a_single_page_despite_total_pages() {
    let client = Arc::new(client().await);
    let feed = PaginationController::new(Arc::new(CatalogPageSource::new(client)));
    feed.reset(QueryKey::Trending).await.unwrap();
    assert_eq!(feed.items().await.len(), 1);
    assert!(!feed.has_more().await);
}

#[tokio::test]
async fn details_decode_genres_and_year() {
    let client = client().await;
    let movie = client.movie_details(872585).await.unwrap();
    assert_eq!(movie.title, "Oppenheimer");
    assert_eq!(movie.year(), Some("2023"));
    assert_eq!(movie.genres.unwrap()[0].name, "Drama");
}

#[tokio::test]
async fn missing_movie_is_not_found() {
    let client = client().await;
    assert_eq!(
        client.movie_details(404).await,
        Err(Error::NotFound("/movie/404".to_string()))
    );
}

#[tokio::test]
async fn server_error_keeps_status() {
    let client = client().await;
    match client.movie_details(500).await {
        Err(Error::Http { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn bad_api_key_is_an_http_error() {
    let base = spawn_tmdb().await;
    let client = TmdbClient::new("wrong", &base, Duration::from_secs(5)).unwrap();
    assert!(matches!(
        client.popular(1).await,
        Err(Error::Http { status: 401, .. })
    ));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let client = client().await;
    assert!(matches!(client.credits(13).await, Err(Error::Malformed(_))));
    assert_eq!(client.credits(1).await.unwrap().cast[0].name, "Cillian Murphy");
}

#[tokio::test]
async fn search_query_is_url_encoded() {
    let client = client().await;
    let page = client.search("fast & furious 7?", 1).await.unwrap();
    assert_eq!(page.items[0].title, "fast & furious 7?");
}

#[tokio::test]
async fn discover_sends_genre_and_sort() {
    let client = client().await;
    let page = client
        .discover_by_genre(28, 1, "vote_average.desc")
        .await
        .unwrap();
    assert_eq!(page.items[0].title, "28|vote_average.desc");
    // Missing total_pages stays None rather than failing the decode.
    assert_eq!(page.total_pages, None);
}

#[tokio::test]
async fn videos_unwrap_results() {
    let client = client().await;
    let videos = client.videos(1).await.unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[1].video_type, "Trailer");
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let client = TmdbClient::new(API_KEY, "http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = client.popular(1).await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(
        err.user_message(),
        "Network error. Please check your internet connection."
    );
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn transport_failure_keeps_api_key_out_of_logs() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let client =
        TmdbClient::new("SECRETKEY123", "http://127.0.0.1:1/3", Duration::from_secs(2)).unwrap();
    let err = client.popular(1).await.unwrap_err();
    assert!(err.is_network());
    assert!(!err.to_string().contains("SECRETKEY123"));

    let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(logged.contains("TMDB request to /movie/popular failed"));
    assert!(!logged.contains("SECRETKEY123"));
}
