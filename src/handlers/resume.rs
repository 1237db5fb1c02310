// src/handlers/resume.rs

use axum::{
    Extension, Json,
    extract::{Multipart, State},
};

use crate::{
    error::AppError,
    generation,
    models::resume::{NewResume, ResumeUploadForm, ResumeUploadResponse},
    state::AppState,
    utils::{
        extract::{detect_format, extract_text},
        jwt::Claims,
    },
};

/// Largest accepted upload, in bytes.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

struct Upload {
    file_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// Accepts a resume (multipart field `file`, optional `description`),
/// stores it and saves the model's skills summary on the user.
#[utoipa::path(
    post,
    path = "/upload/",
    request_body(content = ResumeUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resume analyzed", body = ResumeUploadResponse),
        (status = 400, description = "Missing, unsupported or unreadable file")
    ),
    security(("bearer" = [])),
    tag = "profile"
)]
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadResponse>, AppError> {
    let user_id = claims.user_id()?;

    let mut upload = None;
    let mut description = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            Some("description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                description = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("No file selected".to_string()))?;
    if upload.file_name.is_empty() || upload.data.is_empty() {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }

    let format = detect_format(&upload.file_name, upload.content_type.as_deref())?;
    let text = extract_text(&upload.data, format)?;
    let skills = generation::analyze_resume(state.llm.as_ref(), &text).await?;

    state
        .store
        .insert_resume(NewResume {
            user_id,
            file_name: upload.file_name,
            file_type: format.mime().to_string(),
            file_data: upload.data,
            description,
        })
        .await?;
    state.store.set_skills(user_id, &skills).await?;

    tracing::info!(user_id, chars = text.len(), "Resume analyzed");

    Ok(Json(ResumeUploadResponse {
        message: "Resume uploaded and analyzed successfully".to_string(),
        skills,
    }))
}
