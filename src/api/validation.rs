use super::ApiError;

pub fn validate_identifier(identifier: &str) -> Result<&str, ApiError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Pokemon ID or name is required"));
    }
    Ok(trimmed)
}

pub fn validate_search_query(query: Option<&str>) -> Result<&str, ApiError> {
    let trimmed = query.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query is required"));
    }
    Ok(trimmed)
}
