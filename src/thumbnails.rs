pub mod cache;
pub mod generator;
pub mod template;

pub use cache::{ThumbnailRequest, ThumbnailSize};
pub use generator::{ThumbnailOutcome, generate_thumbnails};
