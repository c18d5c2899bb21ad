use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cv::extract::{extract_text, ExtractError, UploadMeta};
use crate::errors::AppError;
use crate::models::cv::CvSummary;
use crate::state::AppState;

const FILE_FIELD: &str = "file";
const DEFAULT_FILENAME: &str = "cv";

struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

/// POST /api/cvs
///
/// Accepts a multipart upload with a `file` part, extracts its text and stores it.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<CvSummary>, AppError> {
    let file = read_file_field(&mut multipart).await?;

    let raw_text = tokio::task::spawn_blocking(move || {
        let meta = UploadMeta {
            filename: file.filename.as_deref(),
            content_type: file.content_type.as_deref(),
        };
        extract_text(&file.data, &meta).map(|text| (text, file.filename))
    })
    .await
    .map_err(|e| {
        warn!("CV extraction task aborted: {e}");
        AppError::UnprocessableEntity("CV text extraction failed".to_string())
    })?;

    let (raw_text, filename) = raw_text.map_err(extraction_error)?;

    let filename = filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    let cv: CvSummary = sqlx::query_as(
        r#"
        INSERT INTO cvs (id, user_id, filename, raw_text)
        VALUES ($1, $2, $3, $4)
        RETURNING id AS cv_id, filename, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(&filename)
    .bind(&raw_text)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Stored CV {} ({} chars) for user {}",
        cv.cv_id,
        raw_text.chars().count(),
        user.user_id
    );

    Ok(Json(cv))
}

/// GET /api/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CvSummary>>, AppError> {
    let cvs = sqlx::query_as::<_, CvSummary>(
        "SELECT id AS cv_id, filename, created_at FROM cvs WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(cvs))
}

fn extraction_error(e: ExtractError) -> AppError {
    match e {
        ExtractError::TooShort => AppError::Validation(e.to_string()),
        ExtractError::Unsupported(_) => AppError::UnprocessableEntity(e.to_string()),
        ExtractError::Pdf(_) | ExtractError::Docx(_) => {
            warn!("{e}");
            AppError::UnprocessableEntity("CV text extraction failed".to_string())
        }
    }
}

async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid file: {e}")))?;
        return Ok(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    Err(AppError::Validation("No CV file provided".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_statuses() {
        assert!(matches!(
            extraction_error(ExtractError::TooShort),
            AppError::Validation(_)
        ));
        for e in [
            ExtractError::Pdf("bad xref".to_string()),
            ExtractError::Docx("missing word/document.xml".to_string()),
            ExtractError::Unsupported("binary".to_string()),
        ] {
            assert!(matches!(extraction_error(e), AppError::UnprocessableEntity(_)));
        }
    }
}
