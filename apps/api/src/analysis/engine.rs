//! Deterministic scorer: keyword overlap, a readability estimate and the
//! ghosting-probability heuristic. Pure functions with no I/O.
//!
//! Algorithm:
//! 1. Lower-case the CV and the job description.
//! 2. Split the JD on runs outside `[a-z0-9+#.]`, drop stop words and
//!    tokens that don't look like technology terms.
//! 3. Rank by frequency (ties keep first-seen order), keep the top 25.
//! 4. match_score = matched / max(1, |keywords|) × 100, rounded.
//! 5. ghosting_probability = 0.35 + (1 − match/100) × 0.45 + (1 − ats/100) × 0.20

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::models::{AnalysisResult, Fix, RejectionReason, RewriteSuggestion};

pub const MAX_KEYWORDS: usize = 25;
pub const MAX_MISSING_SKILLS: usize = 10;

const STOP_WORDS: &[&str] = &[
    "and", "or", "the", "with", "for", "to", "in", "of", "a", "an", "on", "as", "is", "are", "we",
    "you", "our", "your", "will", "be", "at",
];

static TOKEN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9+#.]+").expect("token separator regex is valid"));

/// Starts with a letter, followed by 1–20 characters from `[a-z0-9+#.]`.
static TECH_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9+#.]{1,20}$").expect("tech-like regex is valid"));

const BASE_PROBABILITY: f64 = 0.35;
const MATCH_WEIGHT: f64 = 0.45;
const READABILITY_WEIGHT: f64 = 0.20;

/// A keyword extracted from a job description.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordEntry {
    pub keyword: String,
    pub frequency: u32,
}

/// Ranked, de-duplicated keywords. Descending frequency, at most `MAX_KEYWORDS`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordSet {
    entries: Vec<KeywordEntry>,
}

impl KeywordSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.keyword.as_str())
    }
}

/// Outcome of checking a keyword set against CV text.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub matched: usize,
    pub total: usize,
    /// Unmatched keywords in ranked order, capped at `MAX_MISSING_SKILLS`.
    pub missing: Vec<String>,
}

/// Extracts the keyword set from an already lower-cased job description.
pub fn extract_keywords(jd_lower: &str) -> KeywordSet {
    let mut entries: Vec<KeywordEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in TOKEN_SEPARATOR.split(jd_lower) {
        if token.chars().count() < 2 || STOP_WORDS.contains(&token) || !TECH_LIKE.is_match(token)
        {
            continue;
        }
        match index.get(token) {
            Some(&i) => entries[i].frequency += 1,
            None => {
                index.insert(token, entries.len());
                entries.push(KeywordEntry {
                    keyword: token.to_string(),
                    frequency: 1,
                });
            }
        }
    }

    // sort_by is stable: equal frequencies keep first-seen order
    entries.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    entries.truncate(MAX_KEYWORDS);

    KeywordSet { entries }
}

/// Literal substring check of every keyword against the lower-cased CV.
pub fn match_keywords(keywords: &KeywordSet, cv_lower: &str) -> KeywordMatch {
    let mut matched = 0;
    let mut missing = Vec::new();

    for keyword in keywords.keywords() {
        if cv_lower.contains(keyword) {
            matched += 1;
        } else {
            missing.push(keyword.to_string());
        }
    }
    missing.truncate(MAX_MISSING_SKILLS);

    KeywordMatch {
        matched,
        total: keywords.len(),
        missing,
    }
}

pub fn compute_match_score(matched: usize, total: usize) -> u32 {
    let total = total.max(1);
    ((matched as f64 * 100.0) / total as f64).round() as u32
}

/// ATS readability proxy on the raw CV text. Always in [10, 100].
pub fn estimate_readability(cv_text: &str) -> u32 {
    if cv_text.trim().is_empty() {
        return 20;
    }

    let len = cv_text.chars().count();
    let mut score: i32 = 80;

    if len > 12_000 {
        score -= 15;
    }
    if len > 20_000 {
        score -= 15;
    }
    if cv_text.contains('\0') {
        score -= 20;
    }

    score.clamp(10, 100) as u32
}

/// Clamped to [0, 1] and rounded to two decimals.
pub fn compute_ghosting_probability(match_score: u32, ats_readability_score: u32) -> f64 {
    let raw = BASE_PROBABILITY
        + (1.0 - f64::from(match_score) / 100.0) * MATCH_WEIGHT
        + (1.0 - f64::from(ats_readability_score) / 100.0) * READABILITY_WEIGHT;
    round2(raw.clamp(0.0, 1.0))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Two-tier guess. Scores from 55 to 74 were once meant to be a separate
/// band but map to "JR" like everything below 75.
pub fn guess_seniority(match_score: u32) -> &'static str {
    if match_score >= 75 {
        "MID"
    } else {
        "JR"
    }
}

/// First match wins: backend, frontend, then qa/test.
pub fn guess_role(jd_text: &str) -> &'static str {
    let jd = jd_text.to_lowercase();
    if jd.contains("backend") {
        "Backend Developer"
    } else if jd.contains("frontend") {
        "Frontend Developer"
    } else if jd.contains("qa") || jd.contains("test") {
        "QA / Test Automation"
    } else {
        "Software Developer"
    }
}

/// Scores a CV against a job description and fills in template commentary.
pub fn analyze(cv_text: &str, jd_text: &str) -> AnalysisResult {
    let cv_lower = cv_text.to_lowercase();
    let jd_lower = jd_text.to_lowercase();

    let keywords = extract_keywords(&jd_lower);
    let keyword_match = match_keywords(&keywords, &cv_lower);

    let match_score = compute_match_score(keyword_match.matched, keyword_match.total);
    let ats_readability_score = estimate_readability(cv_text);
    let ghosting_probability = compute_ghosting_probability(match_score, ats_readability_score);

    AnalysisResult {
        ghosting_probability,
        match_score,
        ats_readability_score,
        seniority_guess: guess_seniority(match_score).to_string(),
        role_guess: guess_role(jd_text).to_string(),
        top_rejection_reasons: template_reasons(),
        missing_skills: keyword_match.missing,
        fixes: template_fixes(),
        rewrite_suggestions: template_rewrites(),
    }
}

fn template_reasons() -> Vec<RejectionReason> {
    vec![
        RejectionReason {
            reason: "İlan anahtar kelimeleri CV'de eksik".to_string(),
            confidence: 0.74,
        },
        RejectionReason {
            reason: "Deneyim maddeleri ölçülebilir sonuç içermiyor olabilir".to_string(),
            confidence: 0.62,
        },
    ]
}

fn template_fixes() -> Vec<Fix> {
    [
        ("Özet", "İlanla aynı role odaklı 1 satırlık net özet ekle"),
        (
            "Skills",
            "Eksik teknolojileri varsa skills'e ekle; yoksa 'Learning' bölümüne koy",
        ),
        (
            "Deneyim",
            "Her maddeyi etki + metrik ile yaz (örn: %20 hızlandı)",
        ),
    ]
    .into_iter()
    .map(|(area, action)| Fix {
        area: area.to_string(),
        action: action.to_string(),
    })
    .collect()
}

fn template_rewrites() -> Vec<RewriteSuggestion> {
    vec![RewriteSuggestion {
        original: "Developed APIs".to_string(),
        improved: "Built REST APIs and improved response times via caching and indexing"
            .to_string(),
    }]
}
