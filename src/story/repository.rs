use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::StoryModel;
use crate::shared::AppError;

/// Trait for owner-scoped travel story persistence.
///
/// Every operation filters by `(story id, owner id)`: a story is invisible
/// and unmodifiable to any user other than its owner, and no cross-owner
/// listing exists.
///
/// Listing order: favourites first; within each group, insertion order
/// (the Postgres implementation orders by `created_on, id`).
#[async_trait]
pub trait StoryRepository {
    async fn insert(&self, story: &StoryModel) -> Result<(), AppError>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoryModel>, AppError>;
    /// Stories whose visited date falls within `[start, end]` inclusive.
    async fn filter_by_date_range(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StoryModel>, AppError>;
    async fn find_by_owner(
        &self,
        owner_id: &str,
        story_id: &str,
    ) -> Result<Option<StoryModel>, AppError>;
    /// Replaces the stored record keyed by `(story.id, story.owner_id)`.
    /// Fails with `NotFound` if no such story exists.
    async fn update(&self, story: &StoryModel) -> Result<(), AppError>;
    /// Writes exactly the favourite flag; returns the updated story.
    async fn set_favourite(
        &self,
        owner_id: &str,
        story_id: &str,
        is_favourite: bool,
    ) -> Result<StoryModel, AppError>;
    async fn delete(&self, owner_id: &str, story_id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of StoryRepository for development and testing
///
/// Stories are kept in insertion order so listing keeps a stable secondary
/// order. All mutations happen under a single lock, so a concurrent reader
/// never observes a partially updated record.
pub struct InMemoryStoryRepository {
    stories: Mutex<Vec<StoryModel>>,
}

impl Default for InMemoryStoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStoryRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            stories: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current number of stories across all owners
    pub fn story_count(&self) -> usize {
        self.stories.lock().unwrap().len()
    }
}

/// Favourites first, keeping the incoming (insertion) order otherwise.
fn favourites_first(mut stories: Vec<StoryModel>) -> Vec<StoryModel> {
    stories.sort_by_key(|s| !s.is_favourite); // stable sort
    stories
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepository {
    #[instrument(skip(self, story))]
    async fn insert(&self, story: &StoryModel) -> Result<(), AppError> {
        debug!(story_id = %story.id, owner_id = %story.owner_id, "Creating story in memory");

        let mut stories = self.stories.lock().unwrap();
        stories.push(story.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoryModel>, AppError> {
        let stories = self.stories.lock().unwrap();
        let owned: Vec<StoryModel> = stories
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();

        debug!(owner_id = %owner_id, count = owned.len(), "Listed stories from memory");
        Ok(favourites_first(owned))
    }

    #[instrument(skip(self))]
    async fn filter_by_date_range(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StoryModel>, AppError> {
        let stories = self.stories.lock().unwrap();
        let matching: Vec<StoryModel> = stories
            .iter()
            .filter(|s| {
                s.owner_id == owner_id && s.visited_date >= start && s.visited_date <= end
            })
            .cloned()
            .collect();

        debug!(owner_id = %owner_id, count = matching.len(), "Filtered stories from memory");
        Ok(favourites_first(matching))
    }

    #[instrument(skip(self))]
    async fn find_by_owner(
        &self,
        owner_id: &str,
        story_id: &str,
    ) -> Result<Option<StoryModel>, AppError> {
        let stories = self.stories.lock().unwrap();
        Ok(stories
            .iter()
            .find(|s| s.id == story_id && s.owner_id == owner_id)
            .cloned())
    }

    #[instrument(skip(self, story))]
    async fn update(&self, story: &StoryModel) -> Result<(), AppError> {
        debug!(story_id = %story.id, "Updating story in memory");

        let mut stories = self.stories.lock().unwrap();
        let slot = stories
            .iter_mut()
            .find(|s| s.id == story.id && s.owner_id == story.owner_id);

        match slot {
            Some(existing) => {
                *existing = story.clone();
                Ok(())
            }
            None => {
                warn!(story_id = %story.id, "Story not found for update in memory");
                Err(AppError::NotFound("Travel story not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn set_favourite(
        &self,
        owner_id: &str,
        story_id: &str,
        is_favourite: bool,
    ) -> Result<StoryModel, AppError> {
        let mut stories = self.stories.lock().unwrap();
        let slot = stories
            .iter_mut()
            .find(|s| s.id == story_id && s.owner_id == owner_id);

        match slot {
            Some(existing) => {
                existing.is_favourite = is_favourite;
                Ok(existing.clone())
            }
            None => {
                warn!(story_id = %story_id, "Story not found for favourite update in memory");
                Err(AppError::NotFound("Travel story not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: &str, story_id: &str) -> Result<(), AppError> {
        debug!(story_id = %story_id, "Deleting story from memory");

        let mut stories = self.stories.lock().unwrap();
        let position = stories
            .iter()
            .position(|s| s.id == story_id && s.owner_id == owner_id);

        match position {
            Some(index) => {
                stories.remove(index);
                Ok(())
            }
            None => {
                warn!(story_id = %story_id, "Story not found for deletion in memory");
                Err(AppError::NotFound("Travel story not found".to_string()))
            }
        }
    }
}

/// PostgreSQL implementation of story repository
pub struct PostgresStoryRepository {
    pool: PgPool,
}

impl PostgresStoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const STORY_COLUMNS: &str =
    "id, owner_id, title, story, visited_location, image_url, visited_date, created_on, is_favourite";

fn story_from_row(row: &sqlx::postgres::PgRow) -> StoryModel {
    StoryModel {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        story: row.get("story"),
        visited_location: row.get("visited_location"),
        image_url: row.get("image_url"),
        visited_date: row.get("visited_date"),
        created_on: row.get("created_on"),
        is_favourite: row.get("is_favourite"),
    }
}

fn store_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Story store operation failed");
    AppError::Store(e.to_string())
}

#[async_trait]
impl StoryRepository for PostgresStoryRepository {
    #[instrument(skip(self, story))]
    async fn insert(&self, story: &StoryModel) -> Result<(), AppError> {
        debug!(story_id = %story.id, owner_id = %story.owner_id, "Creating story in database");

        sqlx::query(
            "INSERT INTO travel_stories (id, owner_id, title, story, visited_location, image_url, visited_date, created_on, is_favourite) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&story.id)
        .bind(&story.owner_id)
        .bind(&story.title)
        .bind(&story.story)
        .bind(&story.visited_location)
        .bind(&story.image_url)
        .bind(story.visited_date)
        .bind(story.created_on)
        .bind(story.is_favourite)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoryModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM travel_stories WHERE owner_id = $1 \
             ORDER BY is_favourite DESC, created_on, id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.iter().map(story_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn filter_by_date_range(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StoryModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM travel_stories \
             WHERE owner_id = $1 AND visited_date BETWEEN $2 AND $3 \
             ORDER BY is_favourite DESC, created_on, id"
        ))
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.iter().map(story_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_owner(
        &self,
        owner_id: &str,
        story_id: &str,
    ) -> Result<Option<StoryModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM travel_stories WHERE id = $1 AND owner_id = $2"
        ))
        .bind(story_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.as_ref().map(story_from_row))
    }

    #[instrument(skip(self, story))]
    async fn update(&self, story: &StoryModel) -> Result<(), AppError> {
        debug!(story_id = %story.id, "Updating story in database");

        let result = sqlx::query(
            "UPDATE travel_stories \
             SET title = $3, story = $4, visited_location = $5, image_url = $6, \
                 visited_date = $7, is_favourite = $8 \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(&story.id)
        .bind(&story.owner_id)
        .bind(&story.title)
        .bind(&story.story)
        .bind(&story.visited_location)
        .bind(&story.image_url)
        .bind(story.visited_date)
        .bind(story.is_favourite)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            warn!(story_id = %story.id, "Story not found for update");
            return Err(AppError::NotFound("Travel story not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_favourite(
        &self,
        owner_id: &str,
        story_id: &str,
        is_favourite: bool,
    ) -> Result<StoryModel, AppError> {
        // Single statement so the flag flip is atomic with the read-back.
        let row = sqlx::query(&format!(
            "UPDATE travel_stories SET is_favourite = $3 \
             WHERE id = $1 AND owner_id = $2 RETURNING {STORY_COLUMNS}"
        ))
        .bind(story_id)
        .bind(owner_id)
        .bind(is_favourite)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => Ok(story_from_row(&row)),
            None => {
                warn!(story_id = %story_id, "Story not found for favourite update");
                Err(AppError::NotFound("Travel story not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: &str, story_id: &str) -> Result<(), AppError> {
        debug!(story_id = %story_id, "Deleting story from database");

        let result = sqlx::query("DELETE FROM travel_stories WHERE id = $1 AND owner_id = $2")
            .bind(story_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            warn!(story_id = %story_id, "Story not found for deletion");
            return Err(AppError::NotFound("Travel story not found".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Test helper functions for creating test data
    mod helpers {
        use super::*;

        pub fn story_for(owner_id: &str, title: &str, visited_ms: i64) -> StoryModel {
            let visited = Utc.timestamp_millis_opt(visited_ms).unwrap();
            StoryModel::new(
                owner_id.to_string(),
                title.to_string(),
                format!("Narrative for {}", title),
                vec![title.to_string()],
                format!("http://localhost:8000/uploads/{}.png", title),
                visited,
                Utc::now(),
            )
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_insert_and_list_scoped_to_owner() {
        let repo = InMemoryStoryRepository::new();
        let mine = story_for("owner-a", "kyoto", 1_700_000_000_000);
        let theirs = story_for("owner-b", "oslo", 1_700_000_000_000);

        repo.insert(&mine).await.unwrap();
        repo.insert(&theirs).await.unwrap();

        let listed = repo.list_by_owner("owner-a").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
    }

    #[tokio::test]
    async fn test_list_orders_favourites_first_then_insertion_order() {
        let repo = InMemoryStoryRepository::new();
        let first = story_for("owner-a", "first", 1_000);
        let second = story_for("owner-a", "second", 2_000);
        let third = story_for("owner-a", "third", 3_000);

        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();
        repo.insert(&third).await.unwrap();
        repo.set_favourite("owner-a", &third.id, true).await.unwrap();

        let listed = repo.list_by_owner("owner-a").await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "first", "second"]);
    }

    #[tokio::test]
    async fn test_filter_by_date_range_is_inclusive() {
        let repo = InMemoryStoryRepository::new();
        let before = story_for("owner-a", "before", 999);
        let at_start = story_for("owner-a", "at-start", 1_000);
        let inside = story_for("owner-a", "inside", 1_500);
        let at_end = story_for("owner-a", "at-end", 2_000);
        let after = story_for("owner-a", "after", 2_001);

        for story in [&before, &at_start, &inside, &at_end, &after] {
            repo.insert(story).await.unwrap();
        }

        let start = Utc.timestamp_millis_opt(1_000).unwrap();
        let end = Utc.timestamp_millis_opt(2_000).unwrap();
        let filtered = repo
            .filter_by_date_range("owner-a", start, end)
            .await
            .unwrap();

        let titles: Vec<&str> = filtered.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["at-start", "inside", "at-end"]);
    }

    #[tokio::test]
    async fn test_filter_never_crosses_owners() {
        let repo = InMemoryStoryRepository::new();
        repo.insert(&story_for("owner-a", "mine", 1_500))
            .await
            .unwrap();
        repo.insert(&story_for("owner-b", "theirs", 1_500))
            .await
            .unwrap();

        let start = Utc.timestamp_millis_opt(0).unwrap();
        let end = Utc.timestamp_millis_opt(10_000).unwrap();
        let filtered = repo
            .filter_by_date_range("owner-a", start, end)
            .await
            .unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "mine");
    }

    #[tokio::test]
    async fn test_update_requires_matching_owner() {
        let repo = InMemoryStoryRepository::new();
        let story = story_for("owner-a", "kyoto", 1_000);
        repo.insert(&story).await.unwrap();

        let mut stolen = story.clone();
        stolen.owner_id = "owner-b".to_string();
        stolen.title = "hijacked".to_string();

        let result = repo.update(&stolen).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        // Unchanged for the real owner
        let found = repo.find_by_owner("owner-a", &story.id).await.unwrap();
        assert_eq!(found.unwrap().title, "kyoto");
    }

    #[tokio::test]
    async fn test_set_favourite_requires_matching_owner() {
        let repo = InMemoryStoryRepository::new();
        let story = story_for("owner-a", "kyoto", 1_000);
        repo.insert(&story).await.unwrap();

        let result = repo.set_favourite("owner-b", &story.id, true).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let updated = repo.set_favourite("owner-a", &story.id, true).await.unwrap();
        assert!(updated.is_favourite);
    }

    #[tokio::test]
    async fn test_delete_requires_matching_owner() {
        let repo = InMemoryStoryRepository::new();
        let story = story_for("owner-a", "kyoto", 1_000);
        repo.insert(&story).await.unwrap();

        let result = repo.delete("owner-b", &story.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(repo.story_count(), 1);

        repo.delete("owner-a", &story.id).await.unwrap();
        assert_eq!(repo.story_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_story() {
        let repo = InMemoryStoryRepository::new();

        let result = repo.delete("owner-a", "missing-id").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
