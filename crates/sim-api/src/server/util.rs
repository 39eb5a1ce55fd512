fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}

fn resolve_log_limit(requested: Option<usize>) -> Result<usize, HttpApiError> {
    match requested {
        None => Ok(DEFAULT_LOG_LIMIT),
        Some(0) => Err(HttpApiError::invalid_query(
            "limit must be positive",
            Some("limit=0".to_string()),
        )),
        Some(limit) => Ok(limit.min(MAX_LOG_LIMIT)),
    }
}
