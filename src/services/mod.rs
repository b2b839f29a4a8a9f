mod blog;
mod catalog;
mod image_search;
mod media;

pub use blog::BlogService;
pub use catalog::CatalogService;
#[cfg(test)]
pub use image_search::ImageProvider;
pub use image_search::ImageSearch;
pub use media::{CloudinaryHost, MediaHost};
