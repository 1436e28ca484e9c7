use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::markers::dto::{Category, PageSpec};

/// Marker row joined with its owner for the denormalized response fields.
#[derive(Debug, Clone, FromRow)]
pub struct MarkerRow {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub title: Option<String>,
    pub description: String,
    pub category: String,
    pub user_id: Uuid,
    pub created_by_email: String,
    pub created_by_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const MARKER_SELECT: &str = "
    SELECT m.id, m.latitude, m.longitude, m.title, m.description, m.category,
           m.user_id, u.email AS created_by_email, u.name AS created_by_name,
           m.created_at, m.updated_at
    FROM markers m
    JOIN users u ON u.id = m.user_id";

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<MarkerRow>> {
    let rows = sqlx::query_as::<_, MarkerRow>(&format!(
        "{MARKER_SELECT} ORDER BY m.created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<MarkerRow>> {
    let row = sqlx::query_as::<_, MarkerRow>(&format!("{MARKER_SELECT} WHERE m.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn list_by_owner(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<MarkerRow>> {
    let rows = sqlx::query_as::<_, MarkerRow>(&format!(
        "{MARKER_SELECT} WHERE m.user_id = $1 ORDER BY m.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_by_category(db: &PgPool, category: &str) -> anyhow::Result<Vec<MarkerRow>> {
    let rows = sqlx::query_as::<_, MarkerRow>(&format!(
        "{MARKER_SELECT} WHERE m.category = $1 ORDER BY m.created_at DESC"
    ))
    .bind(category)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Case-insensitive substring match against title or description.
pub async fn search_keyword(db: &PgPool, keyword: &str) -> anyhow::Result<Vec<MarkerRow>> {
    let pattern = format!("%{keyword}%");
    let rows = sqlx::query_as::<_, MarkerRow>(&format!(
        "{MARKER_SELECT} WHERE m.title ILIKE $1 OR m.description ILIKE $1
         ORDER BY m.created_at DESC"
    ))
    .bind(pattern)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Closed bounding box on both axes.
pub async fn find_in_area(
    db: &PgPool,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
) -> anyhow::Result<Vec<MarkerRow>> {
    let rows = sqlx::query_as::<_, MarkerRow>(&format!(
        "{MARKER_SELECT}
         WHERE m.latitude BETWEEN $1 AND $2 AND m.longitude BETWEEN $3 AND $4
         ORDER BY m.created_at DESC"
    ))
    .bind(min_lat)
    .bind(max_lat)
    .bind(min_lng)
    .bind(max_lng)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Latitude-band prefilter for radius search; the exact distance check
/// happens in the handler.
pub async fn find_in_lat_band(
    db: &PgPool,
    min_lat: f64,
    max_lat: f64,
) -> anyhow::Result<Vec<MarkerRow>> {
    let rows = sqlx::query_as::<_, MarkerRow>(&format!(
        "{MARKER_SELECT} WHERE m.latitude BETWEEN $1 AND $2"
    ))
    .bind(min_lat)
    .bind(max_lat)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert(
    db: &PgPool,
    owner_id: Uuid,
    latitude: f64,
    longitude: f64,
    title: Option<&str>,
    description: &str,
    category: Category,
) -> anyhow::Result<MarkerRow> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO markers (latitude, longitude, title, description, category, user_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(latitude)
    .bind(longitude)
    .bind(title)
    .bind(description)
    .bind(category.as_str())
    .bind(owner_id)
    .fetch_one(db)
    .await?;

    let row = sqlx::query_as::<_, MarkerRow>(&format!("{MARKER_SELECT} WHERE m.id = $1"))
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(row)
}

/// Ownership gate and mutation in one statement: the row is matched by id AND
/// owner, so there is no window between the check and the write.
pub async fn update_owned(
    db: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    latitude: f64,
    longitude: f64,
    title: Option<&str>,
    description: &str,
    category: Category,
) -> anyhow::Result<Option<MarkerRow>> {
    let updated = sqlx::query_scalar::<_, Uuid>(
        "UPDATE markers
         SET latitude = $3, longitude = $4, title = $5, description = $6,
             category = $7, updated_at = now()
         WHERE id = $1 AND user_id = $2
         RETURNING id",
    )
    .bind(id)
    .bind(owner_id)
    .bind(latitude)
    .bind(longitude)
    .bind(title)
    .bind(description)
    .bind(category.as_str())
    .fetch_optional(db)
    .await?;

    match updated {
        Some(id) => find_by_id(db, id).await,
        None => Ok(None),
    }
}

/// Permanent removal; same combined id-and-owner filter as `update_owned`.
pub async fn delete_owned(db: &PgPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM markers WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_all(db: &PgPool) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM markers")
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn count_by_owner(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM markers WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn page(db: &PgPool, spec: PageSpec) -> anyhow::Result<Vec<MarkerRow>> {
    // order_column comes from a fixed whitelist, never from raw input.
    let direction = if spec.descending { "DESC" } else { "ASC" };
    let rows = sqlx::query_as::<_, MarkerRow>(&format!(
        "{MARKER_SELECT} ORDER BY m.{} {} LIMIT $1 OFFSET $2",
        spec.order_column, direction
    ))
    .bind(spec.size)
    .bind(spec.offset())
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn page_by_owner(
    db: &PgPool,
    user_id: Uuid,
    spec: PageSpec,
) -> anyhow::Result<Vec<MarkerRow>> {
    let direction = if spec.descending { "DESC" } else { "ASC" };
    let rows = sqlx::query_as::<_, MarkerRow>(&format!(
        "{MARKER_SELECT} WHERE m.user_id = $1 ORDER BY m.{} {} LIMIT $2 OFFSET $3",
        spec.order_column, direction
    ))
    .bind(user_id)
    .bind(spec.size)
    .bind(spec.offset())
    .fetch_all(db)
    .await?;
    Ok(rows)
}
