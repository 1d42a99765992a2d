pub mod app;
pub mod error;
pub mod favorites;
pub mod listing;
pub mod models;
pub mod tmdb;
