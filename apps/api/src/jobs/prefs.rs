//! Preference Normalizer — turns raw request parameters plus the caller's
//! latest parsed résumé into a canonical `SearchPreferences` value.

use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::ResumeProvider;

/// Canonical search preferences for one in-flight request. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPreferences {
    pub skills: Vec<String>,
    pub experience_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub remote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_types: Option<Vec<String>>,
}

/// First occurrence of `key` in the raw query pairs. A repeated parameter
/// (`?city=a&city=b`) coerces to its first value.
pub fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Splits a comma-separated employment-type filter into a set.
/// Returns `None` when nothing usable remains.
pub fn split_employment_types(raw: &str) -> Option<Vec<String>> {
    let types: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if types.is_empty() {
        None
    } else {
        Some(types)
    }
}

/// Builds `SearchPreferences` for `user_id` from the raw query pairs and the
/// caller's most recent résumé. Fails fast when no résumé exists or the
/// extracted skill list is empty — the pipeline must not reach the ranker
/// with zero skills.
pub async fn normalize(
    resumes: &dyn ResumeProvider,
    user_id: Uuid,
    params: &[(String, String)],
    default_country: &str,
) -> Result<SearchPreferences, AppError> {
    let profile = resumes
        .latest_for(user_id)
        .await?
        .ok_or_else(|| AppError::Validation("Upload a resume first".to_string()))?;

    if profile.skills.is_empty() {
        return Err(AppError::Validation(
            "No skills found in resume".to_string(),
        ));
    }

    Ok(SearchPreferences {
        skills: profile.skills,
        experience_years: profile.experience_count,
        city: first_param(params, "city").map(str::to_string),
        country: first_param(params, "country")
            .map(str::to_string)
            .unwrap_or_else(|| default_country.to_string()),
        role: first_param(params, "role").map(str::to_string),
        remote: first_param(params, "remote") == Some("true"),
        employment_types: first_param(params, "type").and_then(split_employment_types),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testutil::FakeResumes;
    use crate::resume::ResumeProfile;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn provider_with_skills(user_id: Uuid, skills: &[&str]) -> FakeResumes {
        FakeResumes::with_profile(
            user_id,
            ResumeProfile {
                skills: skills.iter().map(|s| s.to_string()).collect(),
                experience_count: 2,
            },
        )
    }

    #[test]
    fn test_first_param_takes_first_occurrence() {
        let params = pairs(&[("city", "Pune"), ("city", "Mumbai")]);
        assert_eq!(first_param(&params, "city"), Some("Pune"));
        assert_eq!(first_param(&params, "role"), None);
    }

    #[test]
    fn test_split_employment_types_trims_and_drops_empties() {
        assert_eq!(
            split_employment_types("FULLTIME, PARTTIME,,INTERN"),
            Some(vec![
                "FULLTIME".to_string(),
                "PARTTIME".to_string(),
                "INTERN".to_string()
            ])
        );
        assert_eq!(split_employment_types(" , "), None);
    }

    #[tokio::test]
    async fn test_normalize_builds_preferences_from_params_and_resume() {
        let user_id = Uuid::new_v4();
        let resumes = provider_with_skills(user_id, &["react", "node"]);
        let params = pairs(&[
            ("city", "Pune"),
            ("role", "Frontend Developer"),
            ("remote", "true"),
            ("type", "FULLTIME,INTERN"),
        ]);

        let prefs = normalize(&resumes, user_id, &params, "in").await.unwrap();
        assert_eq!(prefs.skills, vec!["react", "node"]);
        assert_eq!(prefs.experience_years, 2);
        assert_eq!(prefs.city.as_deref(), Some("Pune"));
        assert_eq!(prefs.country, "in");
        assert_eq!(prefs.role.as_deref(), Some("Frontend Developer"));
        assert!(prefs.remote);
        assert_eq!(
            prefs.employment_types,
            Some(vec!["FULLTIME".to_string(), "INTERN".to_string()])
        );
    }

    #[tokio::test]
    async fn test_normalize_defaults_country_and_remote() {
        let user_id = Uuid::new_v4();
        let resumes = provider_with_skills(user_id, &["python"]);

        let prefs = normalize(&resumes, user_id, &[], "in").await.unwrap();
        assert_eq!(prefs.country, "in");
        assert!(!prefs.remote);
        assert_eq!(prefs.employment_types, None);
    }

    #[tokio::test]
    async fn test_normalize_rejects_missing_resume() {
        let resumes = FakeResumes::empty();
        let err = normalize(&resumes, Uuid::new_v4(), &[], "in")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("resume")));
    }

    #[tokio::test]
    async fn test_normalize_rejects_empty_skill_list() {
        let user_id = Uuid::new_v4();
        let resumes = provider_with_skills(user_id, &[]);
        let err = normalize(&resumes, user_id, &[], "in").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("skills")));
    }
}
