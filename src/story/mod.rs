// Public API - what other modules can use
pub use handlers::{
    add_travel_story, delete_story, edit_story, filter_stories, get_all_stories,
    update_is_favourite,
};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
