use crate::app::AppState;
use crate::error::Result;
use crate::models::{CastMember, Image, ListKind, Movie, Review, ReviewDraft, Video};
use crate::tmdb::{self, image_size};
use crate::trailer::select_trailer;
use tracing::{debug, error, warn};

pub const CAST_LIMIT: usize = 10;
pub const GALLERY_LIMIT: usize = 10;

/// Everything the details view renders. Background sections are `None` when
/// their fetch failed, which hides the section.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsView {
    pub movie: Movie,
    pub similar: Option<Vec<Movie>>,
    pub cast: Option<Vec<CastMember>>,
    pub trailer: Option<Video>,
    pub backdrops: Option<Vec<Image>>,
    pub reviews: Vec<Review>,
    pub my_review: Option<Review>,
    pub is_favorite: bool,
    pub in_watchlist: bool,
}

pub struct DetailsScreen {
    state: AppState,
    view: DetailsView,
}

impl DetailsScreen {
    /// Fans out every fetch the view needs and records the visit.
    pub async fn open(state: AppState, movie: Movie) -> Self {
        let id = movie.id;
        let user = state.session.current();
        let catalog = &state.catalog;

        let (details, similar, credits, media, lists, reviews, _) = tokio::join!(
            catalog.movie_details(id),
            catalog.similar(id),
            catalog.credits(id),
            async { tokio::try_join!(catalog.videos(id), catalog.images(id)) },
            async {
                match &user {
                    Some(u) => state.lists.get_all(&u.uid).await.map(Some),
                    None => Ok(None),
                }
            },
            state.reviews.list(id),
            async {
                if let Err(e) = state.recent.record_view(&movie).await {
                    warn!("Error saving recently viewed: {}", e);
                }
            },
        );

        let movie = details.unwrap_or_else(|e| {
            debug!(movie_id = id, "keeping list copy of movie: {}", e);
            movie
        });
        let similar = background("similar movies", similar);
        let cast = background("cast", credits)
            .map(|c| c.cast.into_iter().take(CAST_LIMIT).collect());
        let (trailer, backdrops) = match background("media", media) {
            Some((videos, images)) => (
                select_trailer(&videos).cloned(),
                Some(images.backdrops.into_iter().take(GALLERY_LIMIT).collect()),
            ),
            None => (None, None),
        };
        let lists = background("user lists", lists).flatten().unwrap_or_default();
        let reviews = background("reviews", reviews).unwrap_or_default();
        let my_review = user
            .as_ref()
            .and_then(|u| reviews.iter().find(|r| r.user_id == u.uid).cloned());

        let view = DetailsView {
            is_favorite: lists.contains(ListKind::Favorites, id),
            in_watchlist: lists.contains(ListKind::Watchlist, id),
            movie,
            similar,
            cast,
            trailer,
            backdrops,
            reviews,
            my_review,
        };
        Self { state, view }
    }

    pub fn view(&self) -> &DetailsView {
        &self.view
    }

    pub fn poster_url(&self) -> Option<String> {
        tmdb::poster_url(&self.state.image_base, &self.view.movie)
    }

    pub fn backdrop_url(&self) -> Option<String> {
        tmdb::backdrop_url(&self.state.image_base, &self.view.movie)
    }

    pub fn cast_photo_url(&self, member: &CastMember) -> Option<String> {
        member
            .profile_path
            .as_deref()
            .map(|p| tmdb::image_url(&self.state.image_base, p, image_size::PROFILE))
    }

    /// Returns the new membership state.
    pub async fn toggle_favorite(&mut self) -> Result<bool> {
        let now = self
            .toggle(ListKind::Favorites, self.view.is_favorite, "add movies to your favorites")
            .await?;
        self.view.is_favorite = now;
        Ok(now)
    }

    pub async fn toggle_watchlist(&mut self) -> Result<bool> {
        let now = self
            .toggle(ListKind::Watchlist, self.view.in_watchlist, "add movies to your watchlist")
            .await?;
        self.view.in_watchlist = now;
        Ok(now)
    }

    async fn toggle(&self, kind: ListKind, present: bool, action: &'static str) -> Result<bool> {
        let user = self.state.require_user(action)?;
        let result = if present {
            self.state
                .lists
                .remove(kind, &user.uid, self.view.movie.id)
                .await
        } else {
            self.state.lists.add(kind, &user.uid, &self.view.movie).await
        };
        result.map_err(|e| {
            error!("Error updating {}: {}", kind.field(), e);
            e
        })?;
        Ok(!present)
    }

    pub async fn submit_review(&mut self, draft: &ReviewDraft) -> Result<&Review> {
        let user = self.state.require_user("write a review")?;
        let id = self.view.movie.id;
        let review = self
            .state
            .reviews
            .submit(id, &user.uid, &user.display_name(), draft)
            .await
            .map_err(|e| {
                error!("Error submitting review: {}", e);
                e
            })?;
        self.reload_reviews(&user.uid).await;
        Ok(&*self.view.my_review.get_or_insert(review))
    }

    pub async fn delete_review(&mut self) -> Result<()> {
        let user = self.state.require_user("delete a review")?;
        self.state
            .reviews
            .delete(self.view.movie.id, &user.uid)
            .await
            .map_err(|e| {
                error!("Error deleting review: {}", e);
                e
            })?;
        self.view.my_review = None;
        self.reload_reviews(&user.uid).await;
        Ok(())
    }

    async fn reload_reviews(&mut self, uid: &str) {
        match self.state.reviews.list(self.view.movie.id).await {
            Ok(reviews) => {
                self.view.my_review = reviews.iter().find(|r| r.user_id == uid).cloned();
                self.view.reviews = reviews;
            }
            Err(e) => warn!("Error refreshing reviews: {}", e),
        }
    }
}

fn background<T>(section: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Error fetching {}: {}", section, e);
            None
        }
    }
}
