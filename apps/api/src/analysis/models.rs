use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::analysis::AnalysisRow;

/// The report returned for one CV / job-description pair.
///
/// The three numeric fields always come from the deterministic scorer.
/// Everything else may be replaced by model commentary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ghosting_probability: f64,
    pub match_score: u32,
    pub ats_readability_score: u32,
    pub seniority_guess: String,
    pub role_guess: String,
    pub top_rejection_reasons: Vec<RejectionReason>,
    pub missing_skills: Vec<String>,
    pub fixes: Vec<Fix>,
    pub rewrite_suggestions: Vec<RewriteSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionReason {
    pub reason: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub area: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteSuggestion {
    pub original: String,
    pub improved: String,
}

/// Numeric fields that override whatever the model returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineScores {
    pub ghosting_probability: f64,
    pub match_score: u32,
    pub ats_readability_score: u32,
}

impl AnalysisResult {
    pub fn scores(&self) -> EngineScores {
        EngineScores {
            ghosting_probability: self.ghosting_probability,
            match_score: self.match_score,
            ats_readability_score: self.ats_readability_score,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub cv_id: Uuid,
    pub job_description: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analysis_id: Uuid,
    pub cv_id: Uuid,
    /// The merged report, serialized. Clients parse it themselves.
    pub result_json: String,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisRow> for AnalyzeResponse {
    fn from(row: AnalysisRow) -> Self {
        Self {
            analysis_id: row.id,
            cv_id: row.cv_id,
            result_json: row.result_json.to_string(),
            created_at: row.created_at,
        }
    }
}
