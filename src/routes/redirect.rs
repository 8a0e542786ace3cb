use crate::error::{AppError, AppResult};
use crate::jobs::ClickJob;
use crate::middleware::RequestContext;
use crate::models::Link;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Extension;
use chrono::Utc;
use std::sync::Arc;

use super::AppState;

/// Resolve a short code and redirect to the original URL.
///
/// Click recording is enqueued to the background worker and never awaited;
/// a worker failure cannot break navigation for the end user.
pub async fn resolve_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Redirect> {
    let entry = lookup(&state, &code).await?;

    // Liveness checks apply on cache hits too
    if !entry.is_active {
        return Err(AppError::LinkGone(code));
    }
    let now = Utc::now();
    if entry.is_expired(now) {
        return Err(AppError::LinkExpired(code));
    }

    state.job_sender.record_click(ClickJob {
        link_id: entry.id,
        clicked_at: now,
        ip_address: ctx.client_ip.clone(),
        user_agent: ctx.user_agent.clone(),
        referer: ctx.referer.clone(),
    });

    // Temporary: browsers must re-resolve on every visit, or expiration and
    // click counting would stop at their cache
    Ok(Redirect::temporary(&entry.original_url))
}

/// Cache-first lookup with database fallback. A cache failure degrades to a
/// database read rather than failing the redirect.
async fn lookup(state: &Arc<AppState>, code: &str) -> AppResult<Link> {
    if state.cache_enabled {
        match state.cache.get_link(code).await {
            Ok(Some(entry)) => return Ok(entry),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", code, e);
            }
        }
    }

    let entry = state
        .repository
        .get_link_by_code(code)
        .await?
        .ok_or_else(|| AppError::LinkNotFound(code.to_string()))?;

    // Backfill the cache for next time
    if state.cache_enabled {
        let _ = state.cache.set_link(&entry).await;
    }

    Ok(entry)
}
