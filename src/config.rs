use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DATA_DIR: &str = ".cinescope";

#[derive(Debug, Clone)]
pub struct Settings {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub image_base_url: String,
    pub firebase: Option<FirebaseSettings>,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct FirebaseSettings {
    pub api_key: String,
    pub project_id: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = non_empty("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let tmdb_base_url = non_empty("TMDB_BASE_URL")
            .unwrap_or_else(|| DEFAULT_TMDB_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let image_base_url = non_empty("TMDB_IMAGE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let firebase = match (non_empty("FIREBASE_API_KEY"), non_empty("FIREBASE_PROJECT_ID")) {
            (Some(api_key), Some(project_id)) => Some(FirebaseSettings {
                api_key,
                project_id,
            }),
            (None, None) => {
                info!("Firebase not configured; account features disabled");
                None
            }
            _ => anyhow::bail!("FIREBASE_API_KEY and FIREBASE_PROJECT_ID must be set together"),
        };

        let request_timeout = match non_empty("CINESCOPE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("Invalid CINESCOPE_REQUEST_TIMEOUT_SECS '{}'", raw))?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        if request_timeout.is_zero() {
            warn!("CINESCOPE_REQUEST_TIMEOUT_SECS is 0; requests will fail immediately");
        }

        let data_dir = non_empty("CINESCOPE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url,
            image_base_url,
            firebase,
            data_dir,
            request_timeout,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
