//! Relevance Ranker — scores and orders postings by overlap between résumé
//! skills and posting text.

use serde::{Deserialize, Serialize};

use crate::models::job::JobPostingRow;

/// A posting annotated with its skill overlap. Purely computed, never
/// persisted (except inside a serialized cache entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPosting {
    #[serde(flatten)]
    pub job: JobPostingRow,
    pub matched_skills: Vec<String>,
    /// `round(100 * matched / total)`, in [0, 100].
    pub match_score: u8,
}

/// Scores every posting against `skills` and sorts descending by score.
///
/// The sort is stable: equal scores keep the input order, so a
/// newest-posted-first input surfaces equally relevant postings newest-first.
/// A skill counts as matched when it appears, lowercased, as a substring of
/// the posting's title + description + highlights blob.
pub fn rank(postings: Vec<JobPostingRow>, skills: &[String]) -> Vec<RankedPosting> {
    let lowercase_skills: Vec<String> = skills.iter().map(|s| s.to_lowercase()).collect();

    let mut ranked: Vec<RankedPosting> = postings
        .into_iter()
        .map(|job| {
            let blob =
                format!("{} {} {}", job.title, job.description, job.highlights).to_lowercase();
            let matched_skills: Vec<String> = lowercase_skills
                .iter()
                .filter(|skill| blob.contains(skill.as_str()))
                .cloned()
                .collect();
            let match_score = score(matched_skills.len(), lowercase_skills.len());
            RankedPosting {
                job,
                matched_skills,
                match_score,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    ranked
}

/// Zero skills cannot reach the ranker (the normalizer fails fast), but the
/// division is guarded anyway.
fn score(matched: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((matched as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testutil::sample_row;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partial_overlap_scores_half() {
        let row = sample_row("j1", "React Engineer", "We need strong React experience.");
        let ranked = rank(vec![row], &skills(&["react", "node"]));
        assert_eq!(ranked[0].matched_skills, vec!["react"]);
        assert_eq!(ranked[0].match_score, 50);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let row = sample_row("j1", "Backend Developer", "Experience with NODE.js required.");
        let ranked = rank(vec![row], &skills(&["Node"]));
        assert_eq!(ranked[0].match_score, 100);
        assert_eq!(ranked[0].matched_skills, vec!["node"]);
    }

    #[test]
    fn test_highlights_participate_in_matching() {
        let mut row = sample_row("j1", "Developer", "Great team.");
        row.highlights = serde_json::json!({"Qualifications": ["3+ years of Kubernetes"]});
        let ranked = rank(vec![row], &skills(&["kubernetes"]));
        assert_eq!(ranked[0].match_score, 100);
    }

    #[test]
    fn test_descending_order_with_stable_ties() {
        // Ten skills; blobs matching 3, 9, 9, and 1 of them → 30, 90, 90, 10.
        let all: Vec<String> = (0..10).map(|i| format!("skill{i}")).collect();
        let blob = |n: usize| {
            all[..n]
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        };
        let rows = vec![
            sample_row("thirty", "t", &blob(3)),
            sample_row("ninety-first", "t", &blob(9)),
            sample_row("ninety-second", "t", &blob(9)),
            sample_row("ten", "t", &blob(1)),
        ];

        let ranked = rank(rows, &all);
        let order: Vec<&str> = ranked.iter().map(|r| r.job.external_id.as_str()).collect();
        assert_eq!(order, vec!["ninety-first", "ninety-second", "thirty", "ten"]);
        let scores: Vec<u8> = ranked.iter().map(|r| r.match_score).collect();
        assert_eq!(scores, vec![90, 90, 30, 10]);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let row = sample_row("j1", "Chef", "Cooking pasta.");
        let ranked = rank(vec![row], &skills(&["rust"]));
        assert_eq!(ranked[0].match_score, 0);
        assert!(ranked[0].matched_skills.is_empty());
    }

    #[test]
    fn test_empty_skill_list_does_not_divide_by_zero() {
        let row = sample_row("j1", "Chef", "Cooking pasta.");
        let ranked = rank(vec![row], &[]);
        assert_eq!(ranked[0].match_score, 0);
    }
}
