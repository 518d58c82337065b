use time::PrimitiveDateTime;

use crate::db::types::GradeLetter;

pub(crate) const PASS_THRESHOLD: f64 = 70.0;

const TIER_1_CAP: f64 = 100.0;
const TIER_2_CAP: f64 = 65.0;
const TIER_3_CAP: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TierResolution {
    pub(crate) tier: i16,
    pub(crate) cap_percentage: f64,
}

/// Resolves which deadline tier applies at `now`. Deadline boundaries are
/// inclusive, and a missing deadline falls through to the next tier. Past all
/// deadlines the submission still lands on tier 3 with the lowest cap; a
/// submission is never rejected for lateness.
pub(crate) fn resolve_tier(
    now: PrimitiveDateTime,
    tier_1_deadline: Option<PrimitiveDateTime>,
    tier_2_deadline: Option<PrimitiveDateTime>,
    tier_3_deadline: Option<PrimitiveDateTime>,
) -> TierResolution {
    if let Some(deadline) = tier_1_deadline {
        if now <= deadline {
            return TierResolution { tier: 1, cap_percentage: TIER_1_CAP };
        }
    }
    if let Some(deadline) = tier_2_deadline {
        if now <= deadline {
            return TierResolution { tier: 2, cap_percentage: TIER_2_CAP };
        }
    }
    if let Some(deadline) = tier_3_deadline {
        if now <= deadline {
            return TierResolution { tier: 3, cap_percentage: TIER_3_CAP };
        }
    }
    TierResolution { tier: 3, cap_percentage: TIER_3_CAP }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GradedScore {
    pub(crate) percentage: f64,
    pub(crate) passed: bool,
    pub(crate) letter: GradeLetter,
}

/// Applies a raw score against `max_score`, clamps by the tier cap when one
/// is present, and derives pass/fail plus the letter grade. Returns `None`
/// when `max_score` is not positive: the submission stays ungraded instead of
/// dividing by zero.
pub(crate) fn grade(
    raw_score: f64,
    max_score: f64,
    tier_cap_percentage: Option<f64>,
) -> Option<GradedScore> {
    if max_score <= 0.0 {
        return None;
    }

    let raw_percentage = raw_score / max_score * 100.0;
    let capped = match tier_cap_percentage {
        Some(cap) => raw_percentage.min(cap),
        None => raw_percentage,
    };
    let percentage = capped.min(100.0).max(0.0);

    Some(GradedScore {
        percentage,
        passed: percentage >= PASS_THRESHOLD,
        letter: letter_for(percentage),
    })
}

pub(crate) fn letter_for(percentage: f64) -> GradeLetter {
    if percentage >= 90.0 {
        GradeLetter::A
    } else if percentage >= 80.0 {
        GradeLetter::B
    } else if percentage >= 70.0 {
        GradeLetter::C
    } else if percentage >= 60.0 {
        GradeLetter::D
    } else {
        GradeLetter::F
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const T1: PrimitiveDateTime = datetime!(2026-03-01 23:59:59);
    const T2: PrimitiveDateTime = datetime!(2026-03-08 23:59:59);
    const T3: PrimitiveDateTime = datetime!(2026-03-15 23:59:59);

    #[test]
    fn tier_one_before_first_deadline() {
        let resolved = resolve_tier(datetime!(2026-02-20 12:00:00), Some(T1), Some(T2), Some(T3));
        assert_eq!(resolved, TierResolution { tier: 1, cap_percentage: 100.0 });
    }

    #[test]
    fn tier_one_boundary_is_inclusive() {
        let resolved = resolve_tier(T1, Some(T1), Some(T2), Some(T3));
        assert_eq!(resolved.tier, 1);
        assert_eq!(resolved.cap_percentage, 100.0);
    }

    #[test]
    fn tier_two_between_deadlines() {
        let resolved = resolve_tier(datetime!(2026-03-04 08:00:00), Some(T1), Some(T2), Some(T3));
        assert_eq!(resolved, TierResolution { tier: 2, cap_percentage: 65.0 });
    }

    #[test]
    fn tier_three_after_second_deadline() {
        let resolved = resolve_tier(datetime!(2026-03-10 08:00:00), Some(T1), Some(T2), Some(T3));
        assert_eq!(resolved, TierResolution { tier: 3, cap_percentage: 50.0 });
    }

    #[test]
    fn past_all_deadlines_still_tier_three() {
        let resolved = resolve_tier(datetime!(2026-04-01 00:00:00), Some(T1), Some(T2), Some(T3));
        assert_eq!(resolved, TierResolution { tier: 3, cap_percentage: 50.0 });
    }

    #[test]
    fn missing_deadline_falls_through() {
        // No tier-1 deadline configured: an early submission lands on tier 2.
        let resolved = resolve_tier(datetime!(2026-02-20 12:00:00), None, Some(T2), Some(T3));
        assert_eq!(resolved.tier, 2);

        let resolved = resolve_tier(datetime!(2026-02-20 12:00:00), None, None, None);
        assert_eq!(resolved, TierResolution { tier: 3, cap_percentage: 50.0 });
    }

    #[test]
    fn grade_without_cap() {
        let outcome = grade(85.0, 100.0, None).expect("graded");
        assert_eq!(outcome.percentage, 85.0);
        assert!(outcome.passed);
        assert_eq!(outcome.letter, GradeLetter::B);
    }

    #[test]
    fn tier_cap_clamps_percentage_and_fails_pass_check() {
        // 95/100 under a tier-2 cap: capped to 65%, which is below the pass
        // threshold but above the D cutoff.
        let outcome = grade(95.0, 100.0, Some(65.0)).expect("graded");
        assert_eq!(outcome.percentage, 65.0);
        assert!(!outcome.passed);
        assert_eq!(outcome.letter, GradeLetter::D);
    }

    #[test]
    fn capped_percentage_never_exceeds_cap_or_hundred() {
        let outcome = grade(150.0, 100.0, Some(50.0)).expect("graded");
        assert_eq!(outcome.percentage, 50.0);

        let outcome = grade(150.0, 100.0, None).expect("graded");
        assert_eq!(outcome.percentage, 100.0);
    }

    #[test]
    fn passed_tracks_seventy_percent_boundary() {
        let outcome = grade(70.0, 100.0, None).expect("graded");
        assert!(outcome.passed);
        assert_eq!(outcome.letter, GradeLetter::C);

        let outcome = grade(69.9, 100.0, None).expect("graded");
        assert!(!outcome.passed);
    }

    #[test]
    fn zero_max_score_stays_ungraded() {
        assert!(grade(10.0, 0.0, None).is_none());
        assert!(grade(10.0, -5.0, Some(65.0)).is_none());
    }

    #[test]
    fn letter_thresholds() {
        assert_eq!(letter_for(90.0), GradeLetter::A);
        assert_eq!(letter_for(89.9), GradeLetter::B);
        assert_eq!(letter_for(80.0), GradeLetter::B);
        assert_eq!(letter_for(70.0), GradeLetter::C);
        assert_eq!(letter_for(60.0), GradeLetter::D);
        assert_eq!(letter_for(59.9), GradeLetter::F);
    }
}
