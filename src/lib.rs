pub mod analytics;
pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod extract;
pub mod health;
pub mod llm;
pub mod state;
