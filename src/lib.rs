pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod feed;
pub mod firestore;
pub mod lists;
pub mod models;
pub mod pagination;
pub mod recent;
pub mod reviews;
pub mod screens;
pub mod session;
pub mod storage;
pub mod tmdb;
pub mod trailer;

pub use error::{AuthError, Error, Result};
