use crate::app::AppState;
use crate::error::Result;
use crate::models::Movie;
use tracing::{error, info};

/// Number of popular movies shown in the hero carousel.
pub const HERO_COUNT: usize = 8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeView {
    pub popular: Vec<Movie>,
    pub top_rated: Vec<Movie>,
    pub upcoming: Vec<Movie>,
}

pub struct HomeScreen {
    state: AppState,
    view: HomeView,
    hero_index: usize,
}

impl HomeScreen {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            view: HomeView::default(),
            hero_index: 0,
        }
    }

    /// Fetches the three feeds concurrently. Any failure keeps the previous view.
    pub async fn load(&mut self) -> Result<&HomeView> {
        let catalog = &self.state.catalog;
        let fetched = tokio::try_join!(catalog.popular(1), catalog.top_rated(1), catalog.upcoming(1));

        let (popular, top_rated, upcoming) = fetched.map_err(|e| {
            error!("Error fetching home feeds: {}", e);
            e
        })?;
        self.view = HomeView {
            popular: popular.items.into_iter().take(HERO_COUNT).collect(),
            top_rated: top_rated.items,
            upcoming: upcoming.items,
        };
        self.hero_index = 0;
        info!(
            "Home loaded: {} popular, {} top rated, {} upcoming",
            self.view.popular.len(),
            self.view.top_rated.len(),
            self.view.upcoming.len()
        );
        Ok(&self.view)
    }

    pub fn view(&self) -> &HomeView {
        &self.view
    }

    pub fn hero(&self) -> Option<&Movie> {
        self.view.popular.get(self.hero_index)
    }

    pub fn next_hero(&mut self) -> Option<&Movie> {
        let len = self.view.popular.len();
        if len > 0 {
            self.hero_index = (self.hero_index + 1) % len;
        }
        self.hero()
    }

    pub fn previous_hero(&mut self) -> Option<&Movie> {
        let len = self.view.popular.len();
        if len > 0 {
            self.hero_index = (self.hero_index + len - 1) % len;
        }
        self.hero()
    }
}
