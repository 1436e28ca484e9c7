use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{gate::AuthUser, repo::User},
    error::ApiError,
    markers::{
        dto::{
            AreaQuery, MarkerRequest, MarkerResponse, NearbyQuery, PageQuery, PagedResponse,
            SearchQuery,
        },
        geo, repo,
    },
    response::ApiEnvelope,
    state::AppState,
};

fn to_responses(rows: Vec<repo::MarkerRow>) -> Vec<MarkerResponse> {
    rows.into_iter().map(MarkerResponse::from).collect()
}

#[instrument(skip(state))]
pub async fn list_markers(
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<Vec<MarkerResponse>>>, ApiError> {
    let rows = repo::list_all(&state.db).await?;
    info!(count = rows.len(), "listed all markers");
    Ok(ApiEnvelope::ok(to_responses(rows), "Markers fetched"))
}

#[instrument(skip(state))]
pub async fn get_marker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<MarkerResponse>>, ApiError> {
    let row = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::MarkerNotFound)?;
    Ok(ApiEnvelope::ok(MarkerResponse::from(row), "Marker fetched"))
}

#[instrument(skip(state, user, payload))]
pub async fn create_marker(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MarkerRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<MarkerResponse>>), ApiError> {
    let category = payload.validate()?;

    // Should not happen for a token minted by us, unless the user row is gone.
    let owner = User::find_by_id(&state.db, user.0.user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let row = repo::insert(
        &state.db,
        owner.id,
        payload.latitude,
        payload.longitude,
        payload.title.as_deref(),
        &payload.description,
        category,
    )
    .await?;

    info!(marker_id = %row.id, owner = %owner.email, "marker created");
    Ok((
        StatusCode::CREATED,
        ApiEnvelope::ok(MarkerResponse::from(row), "Marker created"),
    ))
}

#[instrument(skip(state, user, payload))]
pub async fn update_marker(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkerRequest>,
) -> Result<Json<ApiEnvelope<MarkerResponse>>, ApiError> {
    let category = payload.validate()?;

    let row = repo::update_owned(
        &state.db,
        id,
        user.0.user_id,
        payload.latitude,
        payload.longitude,
        payload.title.as_deref(),
        &payload.description,
        category,
    )
    .await?
    .ok_or_else(|| {
        warn!(marker_id = %id, email = %user.0.email, "update rejected");
        ApiError::MarkerNotFoundOrForbidden
    })?;

    info!(marker_id = %id, email = %user.0.email, "marker updated");
    Ok(ApiEnvelope::ok(MarkerResponse::from(row), "Marker updated"))
}

#[instrument(skip(state, user))]
pub async fn delete_marker(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<()>>, ApiError> {
    let deleted = repo::delete_owned(&state.db, id, user.0.user_id).await?;
    if !deleted {
        warn!(marker_id = %id, email = %user.0.email, "delete rejected");
        return Err(ApiError::MarkerNotFoundOrForbidden);
    }
    info!(marker_id = %id, email = %user.0.email, "marker deleted");
    Ok(ApiEnvelope::ok((), "Marker deleted"))
}

#[instrument(skip(state, user))]
pub async fn my_markers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiEnvelope<Vec<MarkerResponse>>>, ApiError> {
    let rows = repo::list_by_owner(&state.db, user.0.user_id).await?;
    info!(count = rows.len(), email = %user.0.email, "listed own markers");
    Ok(ApiEnvelope::ok(to_responses(rows), "Markers fetched"))
}

#[instrument(skip(state))]
pub async fn markers_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ApiEnvelope<Vec<MarkerResponse>>>, ApiError> {
    let rows = repo::list_by_category(&state.db, &category).await?;
    Ok(ApiEnvelope::ok(to_responses(rows), "Markers fetched"))
}

#[instrument(skip(state))]
pub async fn search_markers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiEnvelope<Vec<MarkerResponse>>>, ApiError> {
    let keyword = query.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::Validation("Keyword is required".into()));
    }
    let rows = repo::search_keyword(&state.db, keyword).await?;
    info!(keyword, count = rows.len(), "keyword search");
    Ok(ApiEnvelope::ok(to_responses(rows), "Markers fetched"))
}

#[instrument(skip(state))]
pub async fn markers_in_area(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<ApiEnvelope<Vec<MarkerResponse>>>, ApiError> {
    query.validate()?;
    let rows = repo::find_in_area(
        &state.db,
        query.min_lat,
        query.max_lat,
        query.min_lng,
        query.max_lng,
    )
    .await?;
    info!(count = rows.len(), "area search");
    Ok(ApiEnvelope::ok(to_responses(rows), "Markers fetched"))
}

#[instrument(skip(state))]
pub async fn markers_nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiEnvelope<Vec<MarkerResponse>>>, ApiError> {
    query.validate()?;

    let (min_lat, max_lat) = geo::lat_window(query.lat, query.radius);
    let candidates = repo::find_in_lat_band(&state.db, min_lat, max_lat).await?;

    let rows: Vec<_> = candidates
        .into_iter()
        .filter(|m| geo::within_radius(query.lat, query.lng, m.latitude, m.longitude, query.radius))
        .collect();

    info!(radius_km = query.radius, count = rows.len(), "radius search");
    Ok(ApiEnvelope::ok(to_responses(rows), "Markers fetched"))
}

#[instrument(skip(state))]
pub async fn markers_paged(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiEnvelope<PagedResponse<MarkerResponse>>>, ApiError> {
    let spec = query.validate()?;
    let rows = repo::page(&state.db, spec).await?;
    let total = repo::count_all(&state.db).await?;
    let paged = PagedResponse::new(to_responses(rows), spec.page, spec.size, total);
    Ok(ApiEnvelope::ok(paged, "Markers fetched"))
}

#[instrument(skip(state, user))]
pub async fn my_markers_paged(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiEnvelope<PagedResponse<MarkerResponse>>>, ApiError> {
    let spec = query.validate()?;
    let rows = repo::page_by_owner(&state.db, user.0.user_id, spec).await?;
    let total = repo::count_by_owner(&state.db, user.0.user_id).await?;
    let paged = PagedResponse::new(to_responses(rows), spec.page, spec.size, total);
    Ok(ApiEnvelope::ok(paged, "Markers fetched"))
}
