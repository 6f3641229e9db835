use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the travel stories collection
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StoryModel {
    pub id: String, // UUID v4 as string
    pub owner_id: String,
    pub title: String,
    pub story: String,
    pub visited_location: Vec<String>,
    pub image_url: String,
    pub visited_date: DateTime<Utc>,
    pub created_on: DateTime<Utc>, // set at creation, immutable
    pub is_favourite: bool,
}

impl StoryModel {
    /// Creates a new story model with a generated id and `is_favourite`
    /// defaulting to false. `created_on` comes from the caller's clock,
    /// never from request input.
    pub fn new(
        owner_id: String,
        title: String,
        story: String,
        visited_location: Vec<String>,
        image_url: String,
        visited_date: DateTime<Utc>,
        created_on: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title,
            story,
            visited_location,
            image_url,
            visited_date,
            created_on,
            is_favourite: false,
        }
    }
}
