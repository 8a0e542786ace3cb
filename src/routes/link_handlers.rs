use crate::db::NewLink;
use crate::error::{AppError, AppResult};
use crate::models::{CreateLinkRequest, LinkResponse, UpdateLinkRequest};
use crate::services::analytics;
use crate::services::short_code::ShortCodeService;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use regex::Regex;
use std::sync::Arc;
use url::Url as UrlParser;
use validator::Validate;

use super::types::MessageResponse;
use super::AppState;

/// Create a short URL
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLinkRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidUrl(format!("Validation failed: {}", e)))?;

    // The target must be an absolute http(s) URL
    let parsed = UrlParser::parse(&payload.original_url)
        .map_err(|_| AppError::InvalidUrl("Invalid URL format".to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::InvalidUrl(
            "URL must start with http:// or https://".to_string(),
        ));
    }

    // Validate custom alias with regex if provided
    if let Some(custom) = &payload.custom_alias {
        let alias_regex = Regex::new(r"^[A-Za-z0-9_-]{3,50}$")
            .map_err(|e| AppError::Internal(format!("Invalid regex pattern: {}", e)))?;
        if !alias_regex.is_match(custom) {
            return Err(AppError::InvalidUrl(
                "Custom alias must be 3-50 alphanumeric characters, underscores, or hyphens"
                    .to_string(),
            ));
        }
    }

    let new_link = NewLink {
        original_url: &payload.original_url,
        title: payload.title.as_deref(),
        description: payload.description.as_deref(),
        expires_at: payload.expires_at,
    };

    // A supplied alias is reserved as-is or rejected; otherwise generate,
    // retrying on collision against the store's uniqueness constraint
    let entry = match &payload.custom_alias {
        Some(alias) => ShortCodeService::allocate_alias(&state.repository, alias, &new_link).await?,
        None => {
            ShortCodeService::allocate_generated(
                &state.repository,
                state.short_code_length,
                state.short_code_max_attempts,
                &new_link,
            )
            .await?
        }
    };

    // Cache new link if enabled
    if state.cache_enabled {
        let _ = state.cache.set_link(&entry).await;
    }

    let response = LinkResponse::from_link(entry, &state.base_url);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get information about a short URL, keyed by its short code
pub async fn get_link_info(
    State(state): State<Arc<AppState>>,
    Path(short_code): Path<String>,
) -> AppResult<impl IntoResponse> {
    // Check cache first if enabled
    if state.cache_enabled {
        if let Some(entry) = state.cache.get_link(&short_code).await? {
            let response = LinkResponse::from_link(entry, &state.base_url);
            return Ok(Json(response));
        }
    }

    // Cache miss - check database
    let entry = state
        .repository
        .get_link_by_code(&short_code)
        .await?
        .ok_or(AppError::LinkNotFound(short_code.clone()))?;

    // Cache for future requests if enabled
    if state.cache_enabled {
        let _ = state.cache.set_link(&entry).await;
    }

    let response = LinkResponse::from_link(entry, &state.base_url);
    Ok(Json(response))
}

/// Partially update a short URL
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLinkRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidUrl(format!("Validation failed: {}", e)))?;

    let entry = state
        .repository
        .update_link(id, &payload)
        .await?
        .ok_or(AppError::LinkNotFound(id.to_string()))?;

    // Refresh the cached entry so the redirect path sees the new fields
    if state.cache_enabled {
        let _ = state.cache.set_link(&entry).await;
    }

    let response = LinkResponse::from_link(entry, &state.base_url);
    Ok(Json(response))
}

/// Delete a short URL
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let deleted = state
        .repository
        .delete_link(id)
        .await?
        .ok_or(AppError::LinkNotFound(id.to_string()))?;

    // Also remove from cache if enabled
    if state.cache_enabled {
        let _ = state.cache.delete_link(&deleted.short_code).await;
    }

    Ok(Json(MessageResponse {
        message: "URL deleted successfully".to_string(),
    }))
}

/// Get the analytics report for a short URL
pub async fn get_link_analytics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let link = state
        .repository
        .get_link_by_id(id)
        .await?
        .ok_or(AppError::LinkNotFound(id.to_string()))?;

    let events = state.repository.clicks_for_link(link.id).await?;
    let report = analytics::build_report(&events, Utc::now());

    Ok(Json(report))
}
