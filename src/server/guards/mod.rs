mod auth;
mod client_ip;

pub use auth::{RequireAdminKey, RequireCronSecret};
pub use client_ip::ClientIp;
