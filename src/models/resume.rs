// src/models/resume.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Represents the 'resumes' table. The raw upload is kept alongside its metadata.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub user_id: i64,
    pub file_name: String,
    pub file_type: String,
    pub file_data: Vec<u8>,
    pub description: Option<String>,
}

/// Multipart body of `POST /upload/`; the handler reads the fields by name.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ResumeUploadForm {
    /// PDF, DOCX or plain text resume.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResumeUploadResponse {
    pub message: String,
    pub skills: String,
}
