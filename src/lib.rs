// Library crate for the travel journal server
// This file exposes the public API for integration tests

pub mod images;
pub mod session;
pub mod shared;
pub mod story;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use shared::{AppError, AppState};

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Builds the API router. The auth middleware wraps every route except
/// account creation, login, and the image endpoints; it is the single
/// enforcement point for session tokens.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/get-user", get(user::get_user))
        .route("/add-travel-story", post(story::add_travel_story))
        .route("/get-all-stories", get(story::get_all_stories))
        .route("/travel-stories/filter", get(story::filter_stories))
        .route("/edit-story/:id", put(story::edit_story))
        .route("/update-is-favourite/:id", put(story::update_is_favourite))
        .route("/delete-story/:id", delete(story::delete_story))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_auth,
        ));

    let public = Router::new()
        .route("/create-account", post(user::create_account))
        .route("/login", post(user::login))
        .route("/image-upload", post(images::upload_image))
        .route("/delete-image", delete(images::delete_image));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
