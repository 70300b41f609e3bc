use axum::{http::StatusCode, response::{Html, IntoResponse, Response}};

pub type AppResult<T> = Result<T, AppError>;

/// Anything a handler can't recover from. Rendered as a bare 500 page; the
/// full error and backtrace only go to the log.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, backtrace = %self.0.backtrace(), "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Internal Server Error</h1><p>Something went wrong on our side.</p>"),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
