use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use super::service::StoryService;
use super::types::{
    AddStoryRequest, EditStoryRequest, FavouriteRequest, FilterParams, StoryEnvelope,
    StoryListResponse,
};
use crate::session::AuthUser;
use crate::shared::{AppError, AppState};

fn story_service(state: &AppState) -> StoryService {
    StoryService::new(
        Arc::clone(&state.story_repository),
        Arc::clone(&state.image_store),
        Arc::clone(&state.clock),
    )
}

/// POST /add-travel-story
#[instrument(name = "add_travel_story", skip(state, payload))]
pub async fn add_travel_story(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<AddStoryRequest>,
) -> Result<(StatusCode, Json<StoryEnvelope>), AppError> {
    let story = story_service(&state).add(&auth.user_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(StoryEnvelope {
            story: (&story).into(),
            message: "Added successfully".to_string(),
        }),
    ))
}

/// GET /get-all-stories
#[instrument(name = "get_all_stories", skip(state))]
pub async fn get_all_stories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<StoryListResponse>, AppError> {
    let stories = story_service(&state).list(&auth.user_id).await?;

    Ok(Json(StoryListResponse {
        stories: stories.iter().map(Into::into).collect(),
    }))
}

/// GET /travel-stories/filter?startDate=..&endDate=..
#[instrument(name = "filter_stories", skip(state))]
pub async fn filter_stories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<FilterParams>,
) -> Result<Json<StoryListResponse>, AppError> {
    let stories = story_service(&state)
        .filter_by_date_range(
            &auth.user_id,
            params.start_date.as_deref(),
            params.end_date.as_deref(),
        )
        .await?;

    Ok(Json(StoryListResponse {
        stories: stories.iter().map(Into::into).collect(),
    }))
}

/// PUT /edit-story/:id
#[instrument(name = "edit_story", skip(state, payload))]
pub async fn edit_story(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(story_id): Path<String>,
    Json(payload): Json<EditStoryRequest>,
) -> Result<Json<StoryEnvelope>, AppError> {
    let story = story_service(&state)
        .update(&auth.user_id, &story_id, payload)
        .await?;

    Ok(Json(StoryEnvelope {
        story: (&story).into(),
        message: "Story updated successfully".to_string(),
    }))
}

/// PUT /update-is-favourite/:id
#[instrument(name = "update_is_favourite", skip(state, payload))]
pub async fn update_is_favourite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(story_id): Path<String>,
    Json(payload): Json<FavouriteRequest>,
) -> Result<Json<StoryEnvelope>, AppError> {
    let story = story_service(&state)
        .set_favourite(&auth.user_id, &story_id, payload.is_favourite)
        .await?;

    Ok(Json(StoryEnvelope {
        story: (&story).into(),
        message: "Updated successfully".to_string(),
    }))
}

/// DELETE /delete-story/:id
#[instrument(name = "delete_story", skip(state))]
pub async fn delete_story(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(story_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    story_service(&state)
        .delete(&auth.user_id, &story_id)
        .await?;

    Ok(Json(json!({
        "message": "Travel story deleted successfully"
    })))
}
