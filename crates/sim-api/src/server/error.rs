#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn invalid_query(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidQuery, message, details),
        }
    }

    fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(ErrorCode::InternalError, message, details),
        }
    }

    fn from_persistence(err: PersistenceError) -> Self {
        Self::internal("store operation failed", Some(err.to_string()))
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
