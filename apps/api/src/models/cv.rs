#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct CvRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

/// Listing projection: everything but the extracted text. Select `id AS cv_id`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CvSummary {
    pub cv_id: Uuid,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}
