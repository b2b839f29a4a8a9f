mod agent;
mod catalog;
mod image;
mod post;
mod topic;

pub use agent::{AgentConfig, ScheduleTime};
pub use catalog::{GalleryImage, NewGalleryImage, NewProduct, Product};
pub use image::{ImageCandidate, ImageSuggestion, UploadedImage, UploadedMedia};
pub use post::{NewPost, Post, PostUpdate};
pub use topic::{NewTopic, Topic, TopicStats};
