//! HTTP handlers

pub mod health;
pub mod auth;
pub mod fabricator;
pub mod threats;
pub mod assistant;
pub mod progress;
pub mod pages;
