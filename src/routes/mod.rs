pub mod auth;
pub mod chat;
pub mod cycle;
pub mod insights;
pub mod users;
