//! Query Synthesizer — compresses `SearchPreferences` into a short
//! natural-language search string via the text-generation collaborator.
//!
//! The collaborator's output is untrusted free text: it may arrive wrapped in
//! code fences or quotes, or span several lines. All cleanup happens here,
//! locally.

use tracing::info;

use crate::errors::AppError;
use crate::jobs::prefs::SearchPreferences;
use crate::jobs::prompts::JOB_QUERY_PROMPT_TEMPLATE;
use crate::llm_client::TextGenerator;

/// Generates the single upstream search query for `prefs`.
/// Collaborator failure is fatal for the request (no automatic retry here).
pub async fn synthesize(
    textgen: &dyn TextGenerator,
    prefs: &SearchPreferences,
) -> Result<String, AppError> {
    let serialized = serde_json::to_string_pretty(prefs)
        .map_err(|e| AppError::Synthesis(format!("failed to serialize preferences: {e}")))?;
    let prompt = JOB_QUERY_PROMPT_TEMPLATE.replace("{prefs}", &serialized);

    let raw = textgen
        .complete(&prompt)
        .await
        .map_err(|e| AppError::Synthesis(format!("query generation failed: {e}")))?;

    let query = sanitize_query(&raw);
    if query.is_empty() {
        return Err(AppError::Synthesis(
            "model returned an empty query".to_string(),
        ));
    }

    info!("Synthesized job query: {query}");
    Ok(query)
}

/// Cleans model output into a single-line query: code fences stripped,
/// first non-empty line kept, surrounding quotes removed.
pub fn sanitize_query(raw: &str) -> String {
    let without_fences = raw.replace("```", "");
    let line = without_fences
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    line.trim_matches('"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testutil::StubTextGen;

    fn prefs() -> SearchPreferences {
        SearchPreferences {
            skills: vec!["react".to_string(), "node".to_string()],
            experience_years: 3,
            city: Some("Pune".to_string()),
            country: "in".to_string(),
            role: None,
            remote: false,
            employment_types: None,
        }
    }

    #[test]
    fn test_sanitize_strips_code_fences() {
        let raw = "```\nReact Developer jobs in India\n```";
        assert_eq!(sanitize_query(raw), "React Developer jobs in India");
    }

    #[test]
    fn test_sanitize_strips_surrounding_quotes() {
        assert_eq!(
            sanitize_query("\"Data Analyst jobs in New York\""),
            "Data Analyst jobs in New York"
        );
    }

    #[test]
    fn test_sanitize_keeps_first_nonempty_line() {
        let raw = "\n\nPython Developer remote jobs\nHere is why I chose it...";
        assert_eq!(sanitize_query(raw), "Python Developer remote jobs");
    }

    #[test]
    fn test_sanitize_all_whitespace_is_empty() {
        assert_eq!(sanitize_query("  \n \n"), "");
    }

    #[tokio::test]
    async fn test_synthesize_sanitizes_model_output() {
        let textgen = StubTextGen::ok("```\n\"React Developer jobs in India\"\n```");
        let query = synthesize(&textgen, &prefs()).await.unwrap();
        assert_eq!(query, "React Developer jobs in India");
    }

    #[tokio::test]
    async fn test_synthesize_embeds_preferences_in_prompt() {
        let textgen = StubTextGen::ok("React Developer jobs in Pune");
        synthesize(&textgen, &prefs()).await.unwrap();
        let prompt = textgen.last_prompt().unwrap();
        assert!(prompt.contains("react"));
        assert!(prompt.contains("Pune"));
    }

    #[tokio::test]
    async fn test_synthesize_failure_is_fatal() {
        let textgen = StubTextGen::failing();
        let err = synthesize(&textgen, &prefs()).await.unwrap_err();
        assert!(matches!(err, AppError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_synthesize_rejects_empty_output() {
        let textgen = StubTextGen::ok("``````");
        let err = synthesize(&textgen, &prefs()).await.unwrap_err();
        assert!(matches!(err, AppError::Synthesis(_)));
    }
}
