// src/handlers/mod.rs

pub mod adaptive;
pub mod aptitude;
pub mod auth;
pub mod health;
pub mod mock_interview;
pub mod password;
pub mod profile;
pub mod resume;
pub mod settings;
