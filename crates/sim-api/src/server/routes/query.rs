#[derive(Debug, Serialize)]
struct FacilitiesResponse {
    schema_version: String,
    facilities: Vec<Facility>,
}

#[derive(Debug, Deserialize)]
struct LogQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct LogResponse {
    schema_version: String,
    entries: Vec<ChangeLogEntry>,
}

async fn list_facilities(
    State(state): State<AppState>,
) -> Result<Json<FacilitiesResponse>, HttpApiError> {
    let facilities = {
        let store = state.store.lock().await;
        store
            .list_active_facilities()
            .map_err(HttpApiError::from_persistence)?
    };

    Ok(Json(FacilitiesResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        facilities,
    }))
}

async fn get_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogResponse>, HttpApiError> {
    let limit = resolve_log_limit(query.limit)?;

    let entries = {
        let store = state.store.lock().await;
        store
            .recent_log(limit)
            .map_err(HttpApiError::from_persistence)?
    };

    Ok(Json(LogResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        entries,
    }))
}
