use crate::db::models::PeerReviewAssignment;
use crate::db::types::ReviewStatus;

/// Mean of completed reviews' totals. No completed reviews yields `None`
/// rather than 0.0, so an unreviewed submission never reads as a zero grade.
pub(crate) fn average_peer_grade(reviews: &[PeerReviewAssignment]) -> Option<f64> {
    let totals: Vec<f64> = reviews
        .iter()
        .filter(|review| review.status == ReviewStatus::Completed)
        .filter_map(|review| review.total_score)
        .collect();

    if totals.is_empty() {
        return None;
    }
    Some(totals.iter().sum::<f64>() / totals.len() as f64)
}

/// A rubric total is the plain sum of criterion scores; criteria are not
/// weighted.
pub(crate) fn rubric_total(rubric_scores: &std::collections::HashMap<String, f64>) -> f64 {
    rubric_scores.values().sum()
}

/// Picks reviewers for a submission from the cohort roster. The submitter and
/// anyone already assigned are excluded; the least-loaded members (fewest open
/// reviews, ties broken by id for determinism) are preferred.
pub(crate) fn select_reviewers(
    candidates: &[(String, i64)],
    submitter_id: &str,
    already_assigned: &[String],
    reviewers_per_submission: i32,
) -> Vec<String> {
    let mut eligible: Vec<&(String, i64)> = candidates
        .iter()
        .filter(|(id, _)| id != submitter_id)
        .filter(|(id, _)| !already_assigned.contains(id))
        .collect();

    eligible.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    eligible
        .into_iter()
        .take(reviewers_per_submission.max(0) as usize)
        .map(|(id, _)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use time::macros::datetime;
    use uuid::Uuid;

    fn review(status: ReviewStatus, total_score: Option<f64>) -> PeerReviewAssignment {
        PeerReviewAssignment {
            id: Uuid::new_v4().to_string(),
            submission_id: "submission-1".to_string(),
            reviewer_id: Uuid::new_v4().to_string(),
            status,
            rubric_scores: sqlx::types::Json(HashMap::new()),
            total_score,
            feedback: None,
            assigned_at: datetime!(2026-03-10 10:00:00),
            completed_at: total_score.map(|_| datetime!(2026-03-11 10:00:00)),
        }
    }

    #[test]
    fn no_completed_reviews_yields_none() {
        assert_eq!(average_peer_grade(&[]), None);
        let pending = vec![
            review(ReviewStatus::Pending, None),
            review(ReviewStatus::InProgress, None),
        ];
        assert_eq!(average_peer_grade(&pending), None);
    }

    #[test]
    fn average_ignores_incomplete_reviews() {
        let reviews = vec![
            review(ReviewStatus::Completed, Some(80.0)),
            review(ReviewStatus::Completed, Some(90.0)),
            review(ReviewStatus::Pending, None),
        ];
        assert_eq!(average_peer_grade(&reviews), Some(85.0));
    }

    #[test]
    fn rubric_total_sums_criteria() {
        let mut rubric = HashMap::new();
        rubric.insert("clarity".to_string(), 8.0);
        rubric.insert("correctness".to_string(), 9.5);
        rubric.insert("style".to_string(), 7.0);
        assert_eq!(rubric_total(&rubric), 24.5);
    }

    #[test]
    fn reviewer_selection_excludes_submitter_and_prefers_least_loaded() {
        let candidates = vec![
            ("alice".to_string(), 3),
            ("bob".to_string(), 0),
            ("carol".to_string(), 1),
            ("dave".to_string(), 0),
        ];
        let picked = select_reviewers(&candidates, "carol", &[], 2);
        assert_eq!(picked, vec!["bob".to_string(), "dave".to_string()]);
    }

    #[test]
    fn reviewer_selection_skips_already_assigned() {
        let candidates = vec![
            ("alice".to_string(), 0),
            ("bob".to_string(), 0),
            ("carol".to_string(), 2),
        ];
        let picked = select_reviewers(&candidates, "dave", &["alice".to_string()], 2);
        assert_eq!(picked, vec!["bob".to_string(), "carol".to_string()]);
    }

    #[test]
    fn reviewer_selection_handles_small_rosters() {
        let candidates = vec![("alice".to_string(), 0)];
        let picked = select_reviewers(&candidates, "bob", &[], 3);
        assert_eq!(picked, vec!["alice".to_string()]);
        assert!(select_reviewers(&candidates, "alice", &[], 3).is_empty());
    }
}
