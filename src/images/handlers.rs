use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::shared::{AppError, AppState};

/// Response for POST /image-upload
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub image_url: String,
}

/// Query parameters for DELETE /delete-image
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteImageParams {
    pub image_url: Option<String>,
}

/// POST /image-upload — accepts a multipart form with an "image" field.
#[instrument(name = "upload_image", skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.bin").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let image_url = state.image_store.store(&bytes, &original_name).await?;
        return Ok(Json(ImageUploadResponse { image_url }));
    }

    Err(AppError::Validation("No image uploaded".to_string()))
}

/// DELETE /delete-image?imageUrl=..
#[instrument(name = "delete_image", skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    Query(params): Query<DeleteImageParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let image_url = params
        .image_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("imageUrl parameter is required".to_string()))?;

    state.image_store.release(&image_url).await?;

    Ok(Json(json!({
        "message": "Image deleted successfully"
    })))
}
