// src/analysis/parse.rs
// =============================================================================
// This module turns a language-model reply into a RepositoryAnalysis.
//
// Models are asked for a JSON object, but they often wrap it in a markdown
// code fence or add a sentence before it. So we:
// 1. Take the text between the first '{' and the last '}'
// 2. Parse that as JSON with every field optional
// 3. If anything goes wrong, fall back to a fixed "irregular format" record
//    that keeps the start of the raw reply as its summary
//
// A RepositoryAnalysis always exists, whatever the model sent back.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How much of an unparsable reply is kept as the summary
const RAW_SUMMARY_CHARS: usize = 200;

/// What the language model found in one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    pub technologies: Vec<String>,
    pub skills: Vec<String>,
    pub achievements: Vec<String>,
    pub summary: String,
}

// The reply shape we asked for, with everything optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAnalysis {
    technologies: Vec<String>,
    skills: Vec<String>,
    achievements: Vec<String>,
    summary: String,
}

impl RepositoryAnalysis {
    // Record used when the reply came back but wasn't the JSON we asked for
    pub fn irregular(raw: &str) -> Self {
        let head: String = raw.chars().take(RAW_SUMMARY_CHARS).collect();
        Self {
            technologies: Vec::new(),
            skills: vec!["AI analysis completed but format irregular".to_string()],
            achievements: vec!["Repository analyzed with partial results".to_string()],
            summary: format!("{head}..."),
        }
    }

    // Record used when there was no reply at all
    pub fn failed(reason: &str) -> Self {
        Self {
            technologies: Vec::new(),
            skills: Vec::new(),
            achievements: Vec::new(),
            summary: format!("Analysis failed: {reason}"),
        }
    }
}

// Parses a model reply, never failing
//
// Parameters:
//   raw: the reply text exactly as the model sent it
//
// Returns: the parsed analysis, or RepositoryAnalysis::irregular(raw)
pub fn parse_reply(raw: &str) -> RepositoryAnalysis {
    let parsed = json_object_span(raw).and_then(|json| match serde_json::from_str::<RawAnalysis>(json) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(error = %e, "Model reply is not the expected JSON");
            None
        }
    });

    match parsed {
        Some(parsed) => RepositoryAnalysis {
            technologies: unique(parsed.technologies),
            skills: unique(parsed.skills),
            achievements: unique(parsed.achievements),
            summary: parsed.summary.trim().to_string(),
        },
        None => RepositoryAnalysis::irregular(raw),
    }
}

// The slice from the first '{' to the last '}', if there is one
fn json_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

// Trims, drops empty strings and duplicates, keeps first-seen order
fn unique(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let reply = r#"{
            "technologies": ["Python", "Flask"],
            "skills": ["REST API design"],
            "achievements": ["Built a URL shortener"],
            "summary": "A small web service."
        }"#;
        let analysis = parse_reply(reply);
        assert_eq!(analysis.technologies, vec!["Python", "Flask"]);
        assert_eq!(analysis.skills, vec!["REST API design"]);
        assert_eq!(analysis.achievements, vec!["Built a URL shortener"]);
        assert_eq!(analysis.summary, "A small web service.");
    }

    #[test]
    fn test_parse_fenced_json_with_chatter() {
        let reply = "Here is the analysis:\n```json\n{\"technologies\": [\"Rust\"], \"summary\": \"CLI\"}\n```";
        let analysis = parse_reply(reply);
        assert_eq!(analysis.technologies, vec!["Rust"]);
        assert!(analysis.skills.is_empty());
        assert_eq!(analysis.summary, "CLI");
    }

    #[test]
    fn test_duplicates_are_removed_in_order() {
        let reply = r#"{"skills": ["Testing", " Testing ", "", "Docs", "Testing"]}"#;
        assert_eq!(parse_reply(reply).skills, vec!["Testing", "Docs"]);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let analysis = parse_reply("not valid json{{");
        assert_eq!(analysis.summary, "not valid json{{...");
        assert_eq!(analysis.skills, vec!["AI analysis completed but format irregular"]);
        assert_eq!(analysis.achievements, vec!["Repository analyzed with partial results"]);
        assert!(analysis.technologies.is_empty());
    }

    #[test]
    fn test_fallback_summary_keeps_first_200_chars() {
        let raw = "word ".repeat(100);
        let analysis = parse_reply(&raw);
        let expected: String = raw.chars().take(200).collect();
        assert_eq!(analysis.summary, format!("{expected}..."));
    }

    #[test]
    fn test_wrong_field_types_fall_back() {
        let analysis = parse_reply(r#"{"skills": "just one string"}"#);
        assert_eq!(analysis.skills, vec!["AI analysis completed but format irregular"]);
    }

    #[test]
    fn test_failed_record() {
        let analysis = RepositoryAnalysis::failed("HTTP 500");
        assert_eq!(analysis.summary, "Analysis failed: HTTP 500");
        assert!(analysis.skills.is_empty());
    }
}
