//! Analysis pipeline.
//!
//! Flow: load CV → deterministic scores → prompt → chat completion (best
//! effort) → merge → persist analysis + insight event in one transaction.
//!
//! The AI path never fails the request. Any transport, parse or shape
//! problem falls back to the engine's own report.

use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::engine;
use crate::analysis::merge::AiCandidate;
use crate::analysis::models::{AnalysisResult, AnalyzeRequest, AnalyzeResponse};
use crate::analysis::prompts::{build_analysis_prompt, PromptContext, DEFAULT_COUNTRY};
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{preview, LlmClient};
use crate::models::analysis::{AnalysisRow, NewInsightEvent};
use crate::models::cv::CvRow;

/// Which path produced the commentary in a final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Ai,
    Engine,
}

/// Runs the full pipeline for one request and persists the result.
pub async fn run_analysis(
    pool: &PgPool,
    llm: &LlmClient,
    user_id: Uuid,
    request: AnalyzeRequest,
) -> Result<AnalyzeResponse, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription cannot be empty".to_string(),
        ));
    }

    let cv = sqlx::query_as::<_, CvRow>("SELECT * FROM cvs WHERE id = $1")
        .bind(request.cv_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {} not found", request.cv_id)))?;

    if cv.user_id != user_id {
        return Err(AppError::Forbidden(
            "CV does not belong to user".to_string(),
        ));
    }

    let country = resolve_country(request.country.as_deref());

    let scored = engine::analyze(&cv.raw_text, &request.job_description);
    info!(
        "Engine scores for CV {}: match={} ats={} ghost={:.2}",
        cv.id, scored.match_score, scored.ats_readability_score, scored.ghosting_probability
    );

    let prompt = build_analysis_prompt(&PromptContext {
        cv_text: &cv.raw_text,
        jd_text: &request.job_description,
        country: Some(&country),
        company: request.company.as_deref(),
        job_title: request.job_title.as_deref(),
    });
    let ai = fetch_ai_candidate(llm, &prompt).await;

    let (result_json, source) = finalize_report(&scored, ai)?;
    match source {
        ResultSource::Ai => info!("Using AI commentary for CV {} (scores from engine)", cv.id),
        ResultSource::Engine => info!("Using engine-only report for CV {}", cv.id),
    }

    let insight = insight_from_report(&country, &result_json, &scored);

    let mut tx = pool.begin().await?;

    let row: AnalysisRow = sqlx::query_as(
        r#"
        INSERT INTO analyses
            (id, user_id, cv_id, job_title, company, country, job_description, result_json)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8::json)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(cv.id)
    .bind(&request.job_title)
    .bind(&request.company)
    .bind(&country)
    .bind(&request.job_description)
    .bind(result_json.to_string())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO insight_events
            (id, country, role_guess, seniority_guess, match_score,
             ats_readability_score, missing_skills)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&insight.country)
    .bind(&insight.role_guess)
    .bind(&insight.seniority_guess)
    .bind(insight.match_score)
    .bind(insight.ats_readability_score)
    .bind(&insight.missing_skills)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Stored analysis {} for user {}", row.id, user_id);
    Ok(AnalyzeResponse::from(row))
}

/// Returns the caller's analyses, newest first.
pub async fn list_analyses(pool: &PgPool, user_id: Uuid) -> Result<Vec<AnalyzeResponse>, AppError> {
    let rows = sqlx::query_as::<_, AnalysisRow>(
        "SELECT * FROM analyses WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AnalyzeResponse::from).collect())
}

/// Best-effort model commentary. Every failure becomes `None`.
pub async fn fetch_ai_candidate(llm: &LlmClient, prompt: &str) -> Option<AiCandidate> {
    let content = match llm.complete(JSON_ONLY_SYSTEM, prompt).await {
        Ok(content) => content,
        Err(e) => {
            warn!("AI commentary unavailable: {e}");
            return None;
        }
    };

    let trimmed = content.trim();
    debug!("AI raw output (first 250): {}", preview(trimmed, 250));

    let candidate = AiCandidate::parse(trimmed);
    if candidate.is_none() {
        warn!("AI output had no usable JSON report; falling back to engine");
    }
    candidate
}

/// Picks the final document: the AI candidate with engine scores, or the engine report.
pub fn finalize_report(
    scored: &AnalysisResult,
    ai: Option<AiCandidate>,
) -> Result<(Value, ResultSource), AppError> {
    match ai {
        Some(candidate) => Ok((candidate.merge_scores(scored.scores()), ResultSource::Ai)),
        None => {
            let value = serde_json::to_value(scored).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to serialize engine report: {e}"))
            })?;
            Ok((value, ResultSource::Engine))
        }
    }
}

pub fn resolve_country(country: Option<&str>) -> String {
    match country.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_COUNTRY.to_string(),
    }
}

/// Reads the insight fields from the final report. Scores always come from the engine.
pub fn insight_from_report(country: &str, report: &Value, scored: &AnalysisResult) -> NewInsightEvent {
    let text = |key: &str| report.get(key).and_then(Value::as_str).map(str::to_string);

    let missing_skills = report
        .get("missing_skills")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });

    NewInsightEvent {
        country: country.to_string(),
        role_guess: text("role_guess"),
        seniority_guess: text("seniority_guess"),
        match_score: scored.match_score as i32,
        ats_readability_score: scored.ats_readability_score as i32,
        missing_skills,
    }
}
