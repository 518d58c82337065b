use crate::db::types::RiskLevel;

// Fixed policy weights. Deliberately a heuristic, not a validated model:
// completion 40%, average score 30%, streak up to 20 points, time up to 10.
const COMPLETION_WEIGHT: f64 = 0.4;
const AVERAGE_SCORE_WEIGHT: f64 = 0.3;
const STREAK_POINTS_PER_DAY: f64 = 5.0;
const STREAK_POINTS_MAX: f64 = 20.0;
const TIME_POINTS_PER_HOUR: f64 = 2.0;
const TIME_POINTS_MAX: f64 = 10.0;

/// Combines completion, scores, streak and time spent into a bounded 0-100
/// engagement score. Stays in range for any input, including absurdly large
/// time totals.
pub(crate) fn engagement_score(
    completion_percentage: f64,
    average_score: Option<f64>,
    current_streak: i32,
    total_time_spent_seconds: i64,
) -> i32 {
    let mut score = completion_percentage.max(0.0) * COMPLETION_WEIGHT;

    if let Some(average) = average_score {
        score += average.max(0.0) * AVERAGE_SCORE_WEIGHT;
    }

    score += (current_streak.max(0) as f64 * STREAK_POINTS_PER_DAY).min(STREAK_POINTS_MAX);

    let time_hours = total_time_spent_seconds.max(0) as f64 / 3600.0;
    score += (time_hours * TIME_POINTS_PER_HOUR).min(TIME_POINTS_MAX);

    (score as i32).clamp(0, 100)
}

/// Maps completion and engagement to a risk category, first match wins. The
/// thresholds are OR'd on purpose: low engagement flags a student even when
/// raw completion looks fine.
pub(crate) fn classify_risk(completion_percentage: f64, engagement_score: i32) -> RiskLevel {
    if completion_percentage < 25.0 || engagement_score < 30 {
        RiskLevel::Critical
    } else if completion_percentage < 50.0 || engagement_score < 50 {
        RiskLevel::High
    } else if completion_percentage < 75.0 || engagement_score < 70 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_marks_everywhere_caps_at_hundred() {
        let score = engagement_score(100.0, Some(100.0), 30, 1_000_000);
        assert_eq!(score, 100);
    }

    #[test]
    fn weights_add_up() {
        // 50% completion, 80 average, 2-day streak, 3 hours:
        // 20 + 24 + 10 + 6 = 60.
        let score = engagement_score(50.0, Some(80.0), 2, 3 * 3600);
        assert_eq!(score, 60);
    }

    #[test]
    fn no_scored_work_contributes_zero() {
        let score = engagement_score(50.0, None, 0, 0);
        assert_eq!(score, 20);
    }

    #[test]
    fn streak_component_caps_at_twenty() {
        let short = engagement_score(0.0, None, 4, 0);
        assert_eq!(short, 20);
        let long = engagement_score(0.0, None, 400, 0);
        assert_eq!(long, 20);
    }

    #[test]
    fn time_component_caps_at_ten() {
        let score = engagement_score(0.0, None, 0, i64::MAX);
        assert_eq!(score, 10);
    }

    #[test]
    fn adversarial_inputs_stay_in_range() {
        assert_eq!(engagement_score(-50.0, Some(-10.0), -3, -100), 0);
        assert_eq!(engagement_score(f64::MAX, Some(f64::MAX), i32::MAX, i64::MAX), 100);
    }

    #[test]
    fn risk_critical_on_low_completion_or_engagement() {
        assert_eq!(classify_risk(10.0, 90), RiskLevel::Critical);
        assert_eq!(classify_risk(90.0, 20), RiskLevel::Critical);
    }

    #[test]
    fn risk_high_band() {
        assert_eq!(classify_risk(40.0, 80), RiskLevel::High);
        assert_eq!(classify_risk(90.0, 45), RiskLevel::High);
    }

    #[test]
    fn risk_medium_band() {
        assert_eq!(classify_risk(60.0, 90), RiskLevel::Medium);
        assert_eq!(classify_risk(90.0, 65), RiskLevel::Medium);
    }

    #[test]
    fn risk_low_requires_both_healthy() {
        assert_eq!(classify_risk(80.0, 75), RiskLevel::Low);
        assert_eq!(classify_risk(75.0, 70), RiskLevel::Low);
    }

    #[test]
    fn risk_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(classify_risk(55.5, 62), RiskLevel::Medium);
        }
    }
}
