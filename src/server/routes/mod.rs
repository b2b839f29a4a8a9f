pub mod agent;
pub mod catalog;
pub mod posts;
pub mod topics;
