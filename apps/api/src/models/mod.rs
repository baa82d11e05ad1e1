pub mod analytics;
pub mod application;
pub mod resume;
pub mod template;
pub mod user;
