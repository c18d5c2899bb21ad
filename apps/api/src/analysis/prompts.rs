// Prompt template for the recruiter commentary call.

/// Longest slice of CV or job-description text placed in a prompt.
pub const MAX_PROMPT_TEXT_CHARS: usize = 12_000;

pub const DEFAULT_COUNTRY: &str = "TR";
const UNKNOWN: &str = "Unknown";

/// Replace `{country}`, `{company}`, `{job_title}` before sending.
/// The CV and job description are appended after it.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are a brutally honest senior technical recruiter + ATS expert.

TASK:
Analyze the CV vs Job Description and return ONLY valid JSON (no markdown, no extra text).

LANGUAGE RULES:
- Use Turkish for reasons/actions
- missing_skills must be technical terms in English (e.g., "spring security", "docker", "kafka")
- Be realistic and strict (do not be overly positive)

OUTPUT JSON SCHEMA (MUST match keys exactly):
{
  "ghosting_probability": 0.00,
  "match_score": 0,
  "ats_readability_score": 0,
  "seniority_guess": "JR",
  "role_guess": "string",
  "top_rejection_reasons": [{"reason":"string","confidence":0.0}],
  "missing_skills": ["string"],
  "fixes": [{"area":"string","action":"string"}],
  "rewrite_suggestions": [{"original":"string","improved":"string"}]
}

CONTEXT:
Country: {country}
Company: {company}
JobTitle: {job_title}
"#;

pub struct PromptContext<'a> {
    pub cv_text: &'a str,
    pub jd_text: &'a str,
    pub country: Option<&'a str>,
    pub company: Option<&'a str>,
    pub job_title: Option<&'a str>,
}

pub fn build_analysis_prompt(ctx: &PromptContext<'_>) -> String {
    let header = ANALYSIS_PROMPT_TEMPLATE
        .replace("{country}", or_default(ctx.country, DEFAULT_COUNTRY))
        .replace("{company}", or_default(ctx.company, UNKNOWN))
        .replace("{job_title}", or_default(ctx.job_title, UNKNOWN));

    // user text is appended, never run through replace()
    format!(
        "{header}\nCV TEXT:\n<<<\n{cv}\n>>>\n\nJOB DESCRIPTION:\n<<<\n{jd}\n>>>\n\nReturn ONLY JSON now.\n",
        cv = truncate_chars(ctx.cv_text, MAX_PROMPT_TEXT_CHARS),
        jd = truncate_chars(ctx.jd_text, MAX_PROMPT_TEXT_CHARS),
    )
}

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

/// Borrowed prefix of at most `max` characters, cut on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(cv: &'a str, jd: &'a str) -> PromptContext<'a> {
        PromptContext {
            cv_text: cv,
            jd_text: jd,
            country: None,
            company: None,
            job_title: None,
        }
    }

    #[test]
    fn test_defaults_for_missing_context() {
        let prompt = build_analysis_prompt(&ctx("cv", "jd"));
        assert!(prompt.contains("Country: TR"));
        assert!(prompt.contains("Company: Unknown"));
        assert!(prompt.contains("JobTitle: Unknown"));
    }

    #[test]
    fn test_blank_values_fall_back_and_values_are_trimmed() {
        let prompt = build_analysis_prompt(&PromptContext {
            country: Some("  DE "),
            company: Some("   "),
            job_title: Some(" Backend Engineer "),
            ..ctx("cv", "jd")
        });
        assert!(prompt.contains("Country: DE\n"));
        assert!(prompt.contains("Company: Unknown"));
        assert!(prompt.contains("JobTitle: Backend Engineer\n"));
    }

    #[test]
    fn test_texts_are_embedded_and_truncated() {
        let long_cv = "é".repeat(MAX_PROMPT_TEXT_CHARS + 500);
        let prompt = build_analysis_prompt(&ctx(&long_cv, "Rust and Kafka"));
        assert!(prompt.contains("Rust and Kafka"));
        assert_eq!(prompt.matches('é').count(), MAX_PROMPT_TEXT_CHARS);
    }

    #[test]
    fn test_placeholder_text_in_user_input_is_not_expanded() {
        let prompt = build_analysis_prompt(&ctx("my {country} cv", "the {company} jd"));
        assert!(prompt.contains("my {country} cv"));
        assert!(prompt.contains("the {company} jd"));
        assert!(prompt.trim_end().ends_with("Return ONLY JSON now."));
    }

    #[test]
    fn test_truncate_chars_short_text_untouched() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }
}
