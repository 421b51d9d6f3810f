//! Error taxonomy shared by the catalog client, the stores and the screen controllers.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Transport failure: DNS, connect, reset, timeout.
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("{0} not found")]
    NotFound(String),

    /// Upstream answered 2xx but the body was not the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("sign-in required to {0}")]
    LoginRequired(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no account for this email")]
    UserNotFound,
    #[error("wrong password")]
    WrongPassword,
    #[error("invalid email")]
    InvalidEmail,
    #[error("email already in use")]
    EmailInUse,
    #[error("weak password")]
    WeakPassword,
    #[error("too many attempts")]
    RateLimited,
    /// The id token was rejected and could not be refreshed.
    #[error("session expired")]
    SessionExpired,
    #[error("permission denied")]
    PermissionDenied,
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Text for the blocking message shown after a user-initiated action fails.
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth(auth) => auth.user_message(),
            Error::Network(_) => {
                "Network error. Please check your internet connection.".to_string()
            }
            Error::Validation(msg) => msg.clone(),
            Error::LoginRequired(action) => format!("Please log in to {}.", action),
            Error::NotFound(what) => format!("{} could not be found.", what),
            Error::Malformed(_) | Error::Http { .. } | Error::Storage(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

impl AuthError {
    /// Maps a Firebase Identity Toolkit error message (e.g. `EMAIL_EXISTS`,
    /// `WEAK_PASSWORD : Password should be at least 6 characters`) to a variant.
    pub fn from_firebase_code(message: &str) -> Self {
        let code = message.split([' ', ':']).next().unwrap_or(message).trim();
        match code {
            "EMAIL_EXISTS" => AuthError::EmailInUse,
            "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
            "INVALID_PASSWORD" => AuthError::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredentials,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "WEAK_PASSWORD" => AuthError::WeakPassword,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::RateLimited,
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "MISSING_REFRESH_TOKEN"
            | "INVALID_ID_TOKEN" => AuthError::SessionExpired,
            _ => AuthError::Other(message.to_string()),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Incorrect email or password.".to_string(),
            AuthError::UserNotFound => "No account found with this email.".to_string(),
            AuthError::WrongPassword => "Incorrect password.".to_string(),
            AuthError::InvalidEmail => "Invalid email address.".to_string(),
            AuthError::EmailInUse => "Email is already in use".to_string(),
            AuthError::WeakPassword => "Password is too weak".to_string(),
            AuthError::RateLimited => {
                "Too many failed attempts. Please try again later.".to_string()
            }
            AuthError::SessionExpired => {
                "Your session has expired. Please log in again.".to_string()
            }
            AuthError::PermissionDenied => {
                "You do not have permission to do that.".to_string()
            }
            AuthError::Other(msg) => format!("Login failed: {}", msg),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Malformed(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Malformed(err.to_string())
    }
}
