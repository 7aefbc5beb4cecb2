use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the service can produce.
///
/// Client-facing variants carry the message that ends up in the error envelope, the others
/// wrap the underlying cause and are reported as a plain 500.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Request headers exceed {0} bytes")]
    HeadTooLarge(usize),

    #[error("Connection reset by peer")]
    ConnectionReset,
    #[error("No response from server")]
    NoResponse,
    #[error("Malformed HTTP message: {0}")]
    Http(#[from] httparse::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid route definition: {0}")]
    Route(#[from] matchit::InsertError),
    #[error("Store lock poisoned")]
    LockPoisoned,
    #[error("{0}")]
    Cli(#[from] crate::cli::CLIError),
}

impl Error {
    /// HTTP status code reported to the client for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) | Error::Http(_) | Error::ConnectionReset | Error::Cli(_) => 400,
            Error::Unauthorized(_) | Error::Token(_) => 401,
            Error::Forbidden(_) => 403,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::PayloadTooLarge(_) | Error::HeadTooLarge(_) => 413,
            Error::NoResponse
            | Error::Io(_)
            | Error::Database(_)
            | Error::Json(_)
            | Error::PasswordHash(_)
            | Error::Config(_)
            | Error::Route(_)
            | Error::LockPoisoned => 500,
        }
    }

    /// Message safe to send back to the client.
    ///
    /// Internal failures are collapsed into a generic message, their cause only goes to the logs.
    pub fn public_message(&self) -> String {
        match self.status_code() {
            500 => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}
