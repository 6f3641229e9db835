use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::StoryModel;
use super::repository::StoryRepository;
use super::types::{AddStoryRequest, EditStoryRequest, EpochMillis};
use crate::images::store::ImageStore;
use crate::shared::{AppError, Clock};

/// Service for travel story business logic: input validation, epoch
/// timestamp parsing, partial patching, and the best-effort image release
/// on delete. Ownership scoping itself lives in the repository.
pub struct StoryService {
    repository: Arc<dyn StoryRepository + Send + Sync>,
    image_store: Arc<dyn ImageStore + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl StoryService {
    pub fn new(
        repository: Arc<dyn StoryRepository + Send + Sync>,
        image_store: Arc<dyn ImageStore + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            image_store,
            clock,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn add(
        &self,
        owner_id: &str,
        request: AddStoryRequest,
    ) -> Result<StoryModel, AppError> {
        let title = request.title.filter(|t| !t.is_empty()).ok_or_else(missing_fields)?;
        let story = request.story.filter(|s| !s.is_empty()).ok_or_else(missing_fields)?;
        // The location list must be supplied but may be empty.
        let visited_location = request.visited_location.ok_or_else(missing_fields)?;
        let image_url = request
            .image_url
            .filter(|u| !u.is_empty())
            .ok_or_else(missing_fields)?;
        let visited_date_ms = request.visited_date.ok_or_else(missing_fields)?;
        let visited_date = parse_epoch_field(&visited_date_ms, "visitedDate")?;

        let model = StoryModel::new(
            owner_id.to_string(),
            title,
            story,
            visited_location,
            image_url,
            visited_date,
            self.clock.now(), // created_on never comes from the caller
        );

        self.repository.insert(&model).await?;

        info!(story_id = %model.id, owner_id = %owner_id, "Travel story added");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: &str) -> Result<Vec<StoryModel>, AppError> {
        self.repository.list_by_owner(owner_id).await
    }

    #[instrument(skip(self))]
    pub async fn filter_by_date_range(
        &self,
        owner_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<StoryModel>, AppError> {
        let start = parse_epoch_param(start_date, "startDate")?;
        let end = parse_epoch_param(end_date, "endDate")?;

        self.repository
            .filter_by_date_range(owner_id, start, end)
            .await
    }

    /// Partial patch: absent and empty fields leave the stored value
    /// untouched. Same-story concurrent edits are last-write-wins.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        owner_id: &str,
        story_id: &str,
        request: EditStoryRequest,
    ) -> Result<StoryModel, AppError> {
        let mut story = self
            .repository
            .find_by_owner(owner_id, story_id)
            .await?
            .ok_or_else(story_not_found)?;

        if let Some(title) = request.title.filter(|t| !t.is_empty()) {
            story.title = title;
        }
        if let Some(text) = request.story.filter(|s| !s.is_empty()) {
            story.story = text;
        }
        if let Some(locations) = request.visited_location.filter(|l| !l.is_empty()) {
            story.visited_location = locations;
        }
        if let Some(image_url) = request.image_url.filter(|u| !u.is_empty()) {
            story.image_url = image_url;
        }
        if let Some(ms) = request.visited_date {
            story.visited_date = parse_epoch_field(&ms, "visitedDate")?;
        }

        self.repository.update(&story).await?;

        info!(story_id = %story_id, owner_id = %owner_id, "Travel story updated");
        Ok(story)
    }

    #[instrument(skip(self))]
    pub async fn set_favourite(
        &self,
        owner_id: &str,
        story_id: &str,
        is_favourite: bool,
    ) -> Result<StoryModel, AppError> {
        let story = self
            .repository
            .set_favourite(owner_id, story_id, is_favourite)
            .await?;

        info!(story_id = %story_id, is_favourite, "Favourite flag updated");
        Ok(story)
    }

    /// Deletes the story, then releases its image as a best-effort side
    /// effect: a failed release is logged and never surfaces to the caller.
    #[instrument(skip(self))]
    pub async fn delete(&self, owner_id: &str, story_id: &str) -> Result<(), AppError> {
        let story = self
            .repository
            .find_by_owner(owner_id, story_id)
            .await?
            .ok_or_else(story_not_found)?;

        self.repository.delete(owner_id, story_id).await?;

        if let Err(e) = self.image_store.release(&story.image_url).await {
            warn!(
                story_id = %story_id,
                image_url = %story.image_url,
                error = %e,
                "Failed to release story image"
            );
        }

        info!(story_id = %story_id, owner_id = %owner_id, "Travel story deleted");
        Ok(())
    }
}

fn missing_fields() -> AppError {
    AppError::Validation("All fields are required".to_string())
}

fn story_not_found() -> AppError {
    AppError::NotFound("Travel story not found".to_string())
}

fn parse_epoch_millis(ms: i64, field: &str) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| AppError::Validation(format!("{} is not a valid timestamp", field)))
}

fn parse_epoch_field(value: &EpochMillis, field: &str) -> Result<DateTime<Utc>, AppError> {
    let ms = value
        .as_millis()
        .ok_or_else(|| AppError::Validation(format!("{} must be an integer timestamp", field)))?;
    parse_epoch_millis(ms, field)
}

fn parse_epoch_param(value: Option<&str>, field: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))?;
    let ms: i64 = raw
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be an integer timestamp", field)))?;
    parse_epoch_millis(ms, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::store::RecordingImageStore;
    use crate::shared::test_utils::FixedClock;
    use crate::shared::SystemClock;
    use crate::story::repository::InMemoryStoryRepository;
    use rstest::rstest;

    fn valid_request() -> AddStoryRequest {
        AddStoryRequest {
            title: Some("Kyoto".to_string()),
            story: Some("Temples and tea".to_string()),
            visited_location: Some(vec!["Kyoto".to_string()]),
            image_url: Some("http://localhost:8000/uploads/kyoto.png".to_string()),
            visited_date: Some(1_700_000_000_000_i64.into()),
        }
    }

    fn service_with(
        image_store: Arc<RecordingImageStore>,
    ) -> (StoryService, Arc<InMemoryStoryRepository>) {
        let repo = Arc::new(InMemoryStoryRepository::new());
        let service = StoryService::new(repo.clone(), image_store, Arc::new(SystemClock));
        (service, repo)
    }

    fn service() -> StoryService {
        service_with(Arc::new(RecordingImageStore::new())).0
    }

    #[tokio::test]
    async fn test_add_story_defaults_to_not_favourite() {
        let service = service();

        let story = service.add("owner-a", valid_request()).await.unwrap();

        assert!(!story.is_favourite);
        assert_eq!(story.owner_id, "owner-a");
        assert_eq!(
            story.visited_date,
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
        );
    }

    #[tokio::test]
    async fn test_add_story_sets_created_on_from_clock() {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(created));
        let service = StoryService::new(
            Arc::new(InMemoryStoryRepository::new()),
            Arc::new(RecordingImageStore::new()),
            clock,
        );

        let story = service.add("owner-a", valid_request()).await.unwrap();
        assert_eq!(story.created_on, created);
    }

    #[rstest]
    #[case::no_title(AddStoryRequest { title: None, ..valid_request() })]
    #[case::empty_title(AddStoryRequest { title: Some(String::new()), ..valid_request() })]
    #[case::no_story(AddStoryRequest { story: None, ..valid_request() })]
    #[case::no_location(AddStoryRequest { visited_location: None, ..valid_request() })]
    #[case::no_image(AddStoryRequest { image_url: None, ..valid_request() })]
    #[case::no_date(AddStoryRequest { visited_date: None, ..valid_request() })]
    #[tokio::test]
    async fn test_add_story_rejects_missing_fields(#[case] request: AddStoryRequest) {
        let service = service();

        let result = service.add("owner-a", request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_story_allows_empty_location_list() {
        let service = service();
        let request = AddStoryRequest {
            visited_location: Some(Vec::new()),
            ..valid_request()
        };

        let story = service.add("owner-a", request).await.unwrap();
        assert!(story.visited_location.is_empty());
    }

    #[tokio::test]
    async fn test_add_story_rejects_out_of_range_timestamp() {
        let service = service();
        let request = AddStoryRequest {
            visited_date: Some(i64::MAX.into()),
            ..valid_request()
        };

        let result = service.add("owner-a", request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_story_accepts_numeric_string_date() {
        let service = service();
        let request = AddStoryRequest {
            visited_date: Some(EpochMillis::Text("1700000000000".to_string())),
            ..valid_request()
        };

        let story = service.add("owner-a", request).await.unwrap();
        assert_eq!(
            story.visited_date,
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
        );
    }

    #[tokio::test]
    async fn test_add_story_rejects_non_numeric_string_date() {
        let service = service();
        let request = AddStoryRequest {
            visited_date: Some(EpochMillis::Text("yesterday".to_string())),
            ..valid_request()
        };

        let result = service.add("owner-a", request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_applies_partial_patch_only() {
        let service = service();
        let original = service.add("owner-a", valid_request()).await.unwrap();

        let patched = service
            .update(
                "owner-a",
                &original.id,
                EditStoryRequest {
                    title: Some("Kyoto in autumn".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.title, "Kyoto in autumn");
        assert_eq!(patched.story, original.story);
        assert_eq!(patched.visited_location, original.visited_location);
        assert_eq!(patched.image_url, original.image_url);
        assert_eq!(patched.visited_date, original.visited_date);
    }

    #[tokio::test]
    async fn test_update_treats_empty_strings_as_absent() {
        let service = service();
        let original = service.add("owner-a", valid_request()).await.unwrap();

        let patched = service
            .update(
                "owner-a",
                &original.id,
                EditStoryRequest {
                    title: Some(String::new()),
                    story: Some(String::new()),
                    visited_location: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.title, original.title);
        assert_eq!(patched.story, original.story);
        assert_eq!(patched.visited_location, original.visited_location);
    }

    #[tokio::test]
    async fn test_update_unknown_story_not_found() {
        let service = service();

        let result = service
            .update("owner-a", "missing-id", EditStoryRequest::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_filter_rejects_non_integer_bounds() {
        let service = service();

        let result = service
            .filter_by_date_range("owner-a", Some("yesterday"), Some("1700000000000"))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service
            .filter_by_date_range("owner-a", Some("1700000000000"), None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_releases_image() {
        let image_store = Arc::new(RecordingImageStore::new());
        let (service, _) = service_with(image_store.clone());
        let story = service.add("owner-a", valid_request()).await.unwrap();

        service.delete("owner-a", &story.id).await.unwrap();

        assert_eq!(image_store.released_urls(), vec![story.image_url]);
    }

    #[tokio::test]
    async fn test_delete_succeeds_even_if_image_release_fails() {
        let image_store = Arc::new(RecordingImageStore::failing_release());
        let (service, repo) = service_with(image_store);
        let story = service.add("owner-a", valid_request()).await.unwrap();

        // Best-effort release: the delete itself must still succeed.
        service.delete("owner-a", &story.id).await.unwrap();
        assert_eq!(repo.story_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_story_not_found() {
        let service = service();

        let result = service.delete("owner-a", "missing-id").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
