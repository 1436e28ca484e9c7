use axum::{routing::get, Router};

use crate::state::AppState;

pub mod dto;
pub mod geo;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/markers", get(handlers::list_markers).post(handlers::create_marker))
        .route("/markers/my", get(handlers::my_markers))
        .route("/markers/my/paged", get(handlers::my_markers_paged))
        .route("/markers/category/:category", get(handlers::markers_by_category))
        .route("/markers/search", get(handlers::search_markers))
        .route("/markers/area", get(handlers::markers_in_area))
        .route("/markers/nearby", get(handlers::markers_nearby))
        .route("/markers/paged", get(handlers::markers_paged))
        .route(
            "/markers/:id",
            get(handlers::get_marker)
                .put(handlers::update_marker)
                .delete(handlers::delete_marker),
        )
}
