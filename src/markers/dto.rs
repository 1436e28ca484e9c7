use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::markers::repo::MarkerRow;

/// Fixed marker category set; anything unknown is rejected at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Restaurant,
    Cafe,
    Shop,
    Park,
    Tourist,
    Transport,
    Government,
    Etc,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Restaurant => "restaurant",
            Category::Cafe => "cafe",
            Category::Shop => "shop",
            Category::Park => "park",
            Category::Tourist => "tourist",
            Category::Transport => "transport",
            Category::Government => "government",
            Category::Etc => "etc",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restaurant" => Ok(Category::Restaurant),
            "cafe" => Ok(Category::Cafe),
            "shop" => Ok(Category::Shop),
            "park" => Ok(Category::Park),
            "tourist" => Ok(Category::Tourist),
            "transport" => Ok(Category::Transport),
            "government" => Ok(Category::Government),
            "etc" => Ok(Category::Etc),
            _ => Err(()),
        }
    }
}

fn default_category() -> String {
    "etc".to_string()
}

/// Create/update request body.
#[derive(Debug, Deserialize)]
pub struct MarkerRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub title: Option<String>,
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
}

impl MarkerRequest {
    pub fn validate(&self) -> Result<Category, ApiError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ApiError::Validation(
                "Latitude must be between -90 and 90".into(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ApiError::Validation(
                "Longitude must be between -180 and 180".into(),
            ));
        }
        if let Some(title) = &self.title {
            if title.chars().count() > 100 {
                return Err(ApiError::Validation(
                    "Title must be at most 100 characters".into(),
                ));
            }
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::Validation("Description is required".into()));
        }
        if self.description.chars().count() > 500 {
            return Err(ApiError::Validation(
                "Description must be at most 500 characters".into(),
            ));
        }
        self.category
            .parse::<Category>()
            .map_err(|_| ApiError::Validation("Invalid category".into()))
    }
}

/// Marker view with the owner denormalized in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerResponse {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub title: Option<String>,
    pub description: String,
    pub category: String,
    pub created_by_email: String,
    pub created_by_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<MarkerRow> for MarkerResponse {
    fn from(row: MarkerRow) -> Self {
        Self {
            id: row.id,
            latitude: row.latitude,
            longitude: row.longitude,
            title: row.title,
            description: row.description,
            category: row.category,
            created_by_email: row.created_by_email,
            created_by_name: row.created_by_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaQuery {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl AreaQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.min_lat > self.max_lat {
            return Err(ApiError::Validation(
                "minLat must not exceed maxLat".into(),
            ));
        }
        if self.min_lng > self.max_lng {
            return Err(ApiError::Validation(
                "minLng must not exceed maxLng".into(),
            ));
        }
        Ok(())
    }
}

fn default_radius() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
}

impl NearbyQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ApiError::Validation(
                "Latitude must be between -90 and 90".into(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(ApiError::Validation(
                "Longitude must be between -180 and 180".into(),
            ));
        }
        if self.radius <= 0.0 || self.radius > 100.0 {
            return Err(ApiError::Validation(
                "Radius must be greater than 0 and at most 100 km".into(),
            ));
        }
        Ok(())
    }
}

fn default_page_size() -> i64 {
    10
}

fn default_sort_by() -> String {
    "createdAt".to_string()
}

fn default_sort_dir() -> String {
    "desc".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_dir")]
    pub sort_dir: String,
}

/// Validated paging parameters ready for the repository.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub page: i64,
    pub size: i64,
    pub order_column: &'static str,
    pub descending: bool,
}

impl PageSpec {
    pub fn offset(&self) -> i64 {
        self.page * self.size
    }
}

fn sort_column(sort_by: &str) -> Option<&'static str> {
    match sort_by {
        "createdAt" => Some("created_at"),
        "updatedAt" => Some("updated_at"),
        "title" => Some("title"),
        "category" => Some("category"),
        "latitude" => Some("latitude"),
        "longitude" => Some("longitude"),
        _ => None,
    }
}

impl PageQuery {
    pub fn validate(&self) -> Result<PageSpec, ApiError> {
        if self.page < 0 {
            return Err(ApiError::Validation("Page must not be negative".into()));
        }
        if self.size <= 0 || self.size > 100 {
            return Err(ApiError::Validation(
                "Size must be between 1 and 100".into(),
            ));
        }
        let order_column = sort_column(&self.sort_by)
            .ok_or_else(|| ApiError::Validation(format!("Unknown sort field '{}'", self.sort_by)))?;
        Ok(PageSpec {
            page: self.page,
            size: self.size,
            order_column,
            descending: self.sort_dir.eq_ignore_ascii_case("desc"),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
}

impl<T> PagedResponse<T> {
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            first: page == 0,
            last: page + 1 >= total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> MarkerRequest {
        MarkerRequest {
            latitude: 37.5,
            longitude: 127.0,
            title: Some("Cafe on the corner".into()),
            description: "Quiet place with good espresso".into(),
            category: "cafe".into(),
        }
    }

    #[test]
    fn valid_marker_passes() {
        assert_eq!(request().validate().unwrap(), Category::Cafe);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut r = request();
        r.latitude = 90.0001;
        assert!(r.validate().is_err());
        let mut r = request();
        r.longitude = -180.5;
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_blank_description() {
        let mut r = request();
        r.description = "   ".into();
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_overlong_fields() {
        let mut r = request();
        r.title = Some("x".repeat(101));
        assert!(r.validate().is_err());
        let mut r = request();
        r.description = "y".repeat(501);
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_unknown_category() {
        let mut r = request();
        r.category = "nightclub".into();
        assert!(r.validate().is_err());
    }

    #[test]
    fn area_rejects_inverted_bounds() {
        let q = AreaQuery {
            min_lat: 38.0,
            max_lat: 37.0,
            min_lng: 126.0,
            max_lng: 128.0,
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn nearby_rejects_bad_radius() {
        for radius in [0.0, -1.0, 100.01] {
            let q = NearbyQuery {
                lat: 37.5,
                lng: 127.0,
                radius,
            };
            assert!(q.validate().is_err(), "{radius}");
        }
    }

    #[test]
    fn page_spec_rejects_bad_input() {
        let q = PageQuery {
            page: -1,
            size: 10,
            sort_by: "createdAt".into(),
            sort_dir: "desc".into(),
        };
        assert!(q.validate().is_err());

        let q = PageQuery {
            page: 0,
            size: 101,
            sort_by: "createdAt".into(),
            sort_dir: "desc".into(),
        };
        assert!(q.validate().is_err());

        let q = PageQuery {
            page: 0,
            size: 10,
            sort_by: "passwordHash".into(),
            sort_dir: "desc".into(),
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn page_spec_maps_sort_fields() {
        let q = PageQuery {
            page: 2,
            size: 20,
            sort_by: "updatedAt".into(),
            sort_dir: "ASC".into(),
        };
        let spec = q.validate().unwrap();
        assert_eq!(spec.order_column, "updated_at");
        assert!(!spec.descending);
        assert_eq!(spec.offset(), 40);
    }

    #[test]
    fn paged_response_math() {
        let paged = PagedResponse::new(vec![0; 10], 0, 10, 25);
        assert_eq!(paged.total_pages, 3);
        assert!(paged.first);
        assert!(!paged.last);

        let paged = PagedResponse::new(vec![0; 5], 2, 10, 25);
        assert!(!paged.first);
        assert!(paged.last);

        let paged: PagedResponse<i32> = PagedResponse::new(vec![], 0, 10, 0);
        assert_eq!(paged.total_pages, 0);
        assert!(paged.first);
        assert!(paged.last);
    }
}
