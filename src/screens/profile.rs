use crate::app::AppState;
use crate::error::Result;
use crate::models::Movie;
use crate::session::AuthUser;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileView {
    pub user: Option<AuthUser>,
    pub favorites: Vec<Movie>,
    pub watchlist: Vec<Movie>,
    pub recent: Vec<Movie>,
}

pub struct ProfileScreen {
    state: AppState,
}

impl ProfileScreen {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Recently viewed is always shown; the lists only for a signed-in user.
    pub async fn load(&self) -> Result<ProfileView> {
        let user = self.state.session.current();
        let recent = self.state.recent.get_recent().await.unwrap_or_else(|e| {
            warn!("Error reading recently viewed: {}", e);
            Vec::new()
        });
        let lists = match &user {
            Some(u) => self.state.lists.get_all(&u.uid).await?,
            None => Default::default(),
        };
        Ok(ProfileView {
            user,
            favorites: lists.favorites,
            watchlist: lists.watchlist,
            recent,
        })
    }

    pub async fn sign_out(&self) -> Result<()> {
        let Some(user) = self.state.session.current() else {
            return Ok(());
        };
        if let Some(auth) = &self.state.auth {
            auth.sign_out(&user).await?;
        }
        self.state.session.set_user(None).await?;
        info!("User {} signed out", user.uid);
        Ok(())
    }
}
