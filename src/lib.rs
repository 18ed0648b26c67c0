//! Salesboard is a JSON API backing a product sales dashboard.
//!
//! It seeds a SQLite database from a remote product dataset and serves a
//! paginated transaction listing, sold/unsold statistics, and chart data
//! aggregated from that table.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod bar_chart;
mod combined;
mod db;
mod endpoints;
mod logging;
mod month;
mod pie_chart;
mod product;
mod query;
mod routing;
mod seed;
mod statistics;
mod transactions;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use product::Product;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A month query parameter was outside the calendar range 1-12.
    #[error("the month {0} is not in the range 1-12")]
    MonthOutOfRange(u8),

    /// A chart month could not be read as a month name, abbreviation, or
    /// number.
    #[error("could not read \"{0}\" as a calendar month")]
    InvalidChartMonth(String),

    /// A page query parameter was zero. Pages are numbered from 1.
    #[error("page numbers start at 1")]
    PageOutOfRange,

    /// A required month query parameter was not provided.
    #[error("the month query parameter is required")]
    MissingMonth,

    /// The seed dataset could not be downloaded.
    #[error("could not fetch the seed dataset: {0}")]
    SeedFetchError(String),

    /// The seed dataset was downloaded but was not a JSON array of products.
    #[error("could not parse the seed dataset: {0}")]
    SeedDataError(String),

    /// The HTTP client for fetching the seed dataset could not be built.
    #[error("could not build the HTTP client: {0}")]
    HttpClientError(String),

    /// There was an error formatting a date of sale for storage.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format the date \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::MonthOutOfRange(_)
            | Error::InvalidChartMonth(_)
            | Error::PageOutOfRange
            | Error::MissingMonth => (StatusCode::BAD_REQUEST, "Invalid request parameters"),
            Error::SeedFetchError(_) | Error::SeedDataError(_) | Error::HttpClientError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error initializing database",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error querying the database",
                )
            }
        };

        let body = Json(json!({
            "message": message,
            "error": {"detail": self.to_string()},
        }));

        (status, body).into_response()
    }
}
