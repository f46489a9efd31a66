use thiserror::Error;

/// Transport-level failures of a generator call.
///
/// Everything below the transport layer degrades gracefully (the change-set
/// parser is total), so these are the only errors a user ever sees for an
/// agent turn. The Display strings double as the user-facing hints.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("API quota exceeded for {model}; switch model or wait a few minutes")]
    RateLimited { model: String },

    #[error("authentication failed for {model}; check the api_key in your config")]
    AuthFailed { model: String },

    #[error("the model returned an empty response; try again")]
    EmptyResponse,

    #[error("backend returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),
}
