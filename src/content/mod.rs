mod assemble;
mod keywords;
mod sanitize;

pub use assemble::{interleave_images, PlacedImage};
pub use keywords::extract_keywords;
pub use sanitize::sanitize_html;
