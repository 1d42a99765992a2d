use thiserror::Error;

/// Failures surfaced by the metadata client. No retry happens anywhere;
/// callers see the first failure verbatim.
#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response shape: {context}")]
    Decode { context: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("TMDB returned {code}: {body}")]
    Status { code: u16, body: String },
}

pub type Result<T> = std::result::Result<T, TmdbError>;
