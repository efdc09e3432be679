use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::db::StoreError;
use crate::rate_limit::counter::CounterError;

/// API failure taxonomy. Handlers and the admission gate funnel every
/// failure through here so the status mapping lives in one place.
///
/// `Validation`, `InvalidIdentifier` and `NotFound` are expected outcomes
/// and are not logged; `Store` covers any unexpected fault from the note
/// store or the counter store and is logged before the generic response
/// goes out.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A required field is missing or empty.
    #[error("{0} is required")]
    Validation(&'static str),

    /// The id in the path is not a well-formed note identifier.
    #[error("Invalid note id")]
    InvalidIdentifier,

    #[error("Note not found")]
    NotFound,

    /// Rejected by the admission gate before reaching any handler.
    #[error("Too many requests, please try again later")]
    RateLimited,

    /// Unexpected failure from the note store or the counter store.
    /// The client sees a generic message; the cause goes to the log.
    #[error("Internal server error")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(Box::new(e))
    }
}

impl From<CounterError> for ApiError {
    fn from(e: CounterError) -> Self {
        ApiError::Store(Box::new(e))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidIdentifier => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Store(source) = self {
            log::error!("Store fault: {}", source);
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
