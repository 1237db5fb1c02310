// src/adaptive/mod.rs

pub mod aggregate;
pub mod difficulty;
pub mod scoring;
