mod repository;
mod schema;
mod seed;

pub use repository::Repository;
pub use seed::STARTER_TOPICS;
