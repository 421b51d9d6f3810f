//! Headless per-view controllers. Each one owns the state a view renders and
//! exposes the actions the view can trigger.

mod account;
mod browse;
mod details;
mod home;
mod profile;
mod search;

pub use account::AccountScreen;
pub use browse::{CategoriesScreen, TopRatedScreen};
pub use details::{DetailsScreen, DetailsView, CAST_LIMIT, GALLERY_LIMIT};
pub use home::{HomeScreen, HomeView, HERO_COUNT};
pub use profile::{ProfileScreen, ProfileView};
pub use search::{SearchScreen, MIN_QUERY_LEN};
