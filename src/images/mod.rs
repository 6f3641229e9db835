// Public API - what other modules can use
pub use handlers::{delete_image, upload_image};

// Internal modules
mod handlers;
pub mod store;
