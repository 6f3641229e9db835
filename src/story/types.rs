use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::StoryModel;

/// Epoch milliseconds on the wire. Clients send the value either as a JSON
/// number or as a numeric string; a non-numeric string is carried through
/// so the service can reject it as a validation failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EpochMillis {
    Number(i64),
    Text(String),
}

impl EpochMillis {
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Self::Number(ms) => Some(*ms),
            Self::Text(raw) => raw.parse().ok(),
        }
    }
}

impl From<i64> for EpochMillis {
    fn from(ms: i64) -> Self {
        Self::Number(ms)
    }
}

/// Request body for POST /add-travel-story. Fields are optional so missing
/// values surface as validation errors; `visitedDate` is epoch milliseconds.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddStoryRequest {
    pub title: Option<String>,
    pub story: Option<String>,
    pub visited_location: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub visited_date: Option<EpochMillis>,
}

/// Request body for PUT /edit-story/:id — partial patch semantics: only
/// supplied, non-empty fields are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditStoryRequest {
    pub title: Option<String>,
    pub story: Option<String>,
    pub visited_location: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub visited_date: Option<EpochMillis>,
}

/// Request body for PUT /update-is-favourite/:id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteRequest {
    pub is_favourite: bool,
}

/// Query parameters for GET /travel-stories/filter
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Public-facing story representation
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub story: String,
    pub visited_location: Vec<String>,
    pub image_url: String,
    pub visited_date: DateTime<Utc>,
    pub created_on: DateTime<Utc>,
    pub is_favourite: bool,
}

impl From<&StoryModel> for StoryResponse {
    fn from(story: &StoryModel) -> Self {
        Self {
            id: story.id.clone(),
            owner_id: story.owner_id.clone(),
            title: story.title.clone(),
            story: story.story.clone(),
            visited_location: story.visited_location.clone(),
            image_url: story.image_url.clone(),
            visited_date: story.visited_date,
            created_on: story.created_on,
            is_favourite: story.is_favourite,
        }
    }
}

/// Single-story response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct StoryEnvelope {
    pub story: StoryResponse,
    pub message: String,
}

/// Response for listing and filter endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct StoryListResponse {
    pub stories: Vec<StoryResponse>,
}
