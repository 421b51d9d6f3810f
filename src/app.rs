use crate::auth::{AuthProvider, FirebaseAuthClient};
use crate::config::{Settings, DEFAULT_IMAGE_BASE};
use crate::error::{Error, Result};
use crate::firestore::{DocumentStore, FirestoreClient, MemoryDocumentStore};
use crate::lists::UserListStore;
use crate::recent::RecentlyViewed;
use crate::reviews::ReviewStore;
use crate::session::{AuthUser, SessionContext};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::tmdb::{CatalogApi, TmdbClient};
use std::sync::Arc;
use tracing::{info, warn};

/// Services shared by every screen controller.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub lists: UserListStore,
    pub reviews: ReviewStore,
    pub recent: RecentlyViewed,
    pub session: Arc<SessionContext>,
    pub auth: Option<Arc<dyn AuthProvider>>,
    pub image_base: String,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::from_settings(settings)?);
        let local: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&settings.data_dir));
        let session = Arc::new(SessionContext::new(local.clone()));
        info!("Local data in {}", settings.data_dir.display());

        let (docs, auth): (Arc<dyn DocumentStore>, Option<Arc<dyn AuthProvider>>) =
            match &settings.firebase {
                Some(fb) => {
                    let auth: Arc<dyn AuthProvider> = Arc::new(FirebaseAuthClient::new(
                        fb.api_key.clone(),
                        settings.request_timeout,
                    )?);
                    let docs = FirestoreClient::new(
                        &fb.project_id,
                        session.clone(),
                        settings.request_timeout,
                    )?
                    .with_auth(auth.clone());
                    info!("Using Firestore project {}", fb.project_id);
                    (Arc::new(docs), Some(auth))
                }
                None => {
                    warn!("No Firebase project configured; user lists are kept in memory");
                    (Arc::new(MemoryDocumentStore::new()), None)
                }
            };

        Ok(Self::assemble(
            catalog,
            docs,
            local,
            session,
            auth,
            settings.image_base_url.clone(),
        ))
    }

    /// Everything except the catalog kept in memory.
    pub fn in_memory(catalog: Arc<dyn CatalogApi>, auth: Option<Arc<dyn AuthProvider>>) -> Self {
        let local: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let session = Arc::new(SessionContext::new(local.clone()));
        Self::assemble(
            catalog,
            Arc::new(MemoryDocumentStore::new()),
            local,
            session,
            auth,
            DEFAULT_IMAGE_BASE.to_string(),
        )
    }

    pub fn assemble(
        catalog: Arc<dyn CatalogApi>,
        docs: Arc<dyn DocumentStore>,
        local: Arc<dyn KeyValueStore>,
        session: Arc<SessionContext>,
        auth: Option<Arc<dyn AuthProvider>>,
        image_base: String,
    ) -> Self {
        Self {
            catalog,
            lists: UserListStore::new(docs.clone()),
            reviews: ReviewStore::new(docs),
            recent: RecentlyViewed::new(local),
            session,
            auth,
            image_base,
        }
    }

    pub fn require_user(&self, action: &'static str) -> Result<AuthUser> {
        self.session
            .current()
            .ok_or(Error::LoginRequired(action))
    }
}
