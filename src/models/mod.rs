// src/models/mod.rs

pub mod answer;
pub mod aptitude;
pub mod chat_session;
pub mod history;
pub mod question;
pub mod resume;
pub mod user;
