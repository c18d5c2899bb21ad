#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cv_id: Uuid,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub country: String,
    pub job_description: String,
    pub result_json: Value,
    pub created_at: DateTime<Utc>,
}

/// Anonymous per-analysis record used for aggregate insights.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInsightEvent {
    pub country: String,
    pub role_guess: Option<String>,
    pub seniority_guess: Option<String>,
    pub match_score: i32,
    pub ats_readability_score: i32,
    pub missing_skills: Option<Vec<String>>,
}
