use std::collections::HashSet;

use super::weights::Weights;
use crate::{Project, Student};

/// Score used when one side carries no information: an absent requirement
/// or preference is a partial match, not a perfect one.
pub const NEUTRAL_SCORE: f64 = 0.50;

/// Pairwise compatibility of one student with one project, decomposed into
/// the three sub-scores the combined value is built from. Every component
/// lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompatibilityScore {
    pub skills: f64,
    pub interests: f64,
    pub work_type: f64,
    pub total: f64,
}

/// Share of the project's required skills the student covers.
pub fn skills_score(student: &Student, project: &Project) -> f64 {
    overlap_ratio(&student.skills, &project.required_skills)
}

/// Share of the project's keywords present among the student's interests.
pub fn interests_score(student: &Student, project: &Project) -> f64 {
    overlap_ratio(&student.interests, &project.keywords)
}

/// 1.0 on an explicit work-type match, neutral otherwise (including either
/// side unset, so missing preference data is never penalized as zero).
pub fn work_type_score(student: &Student, project: &Project) -> f64 {
    match (student.preferred_work_type, project.work_type) {
        (Some(preferred), Some(actual)) if preferred == actual => 1.0,
        _ => NEUTRAL_SCORE,
    }
}

/// Compute the full compatibility score for one pair with pre-normalized
/// weights. Pure and deterministic; safe to call concurrently.
pub fn compatibility(student: &Student, project: &Project, weights: &Weights) -> CompatibilityScore {
    let skills = skills_score(student, project);
    let interests = interests_score(student, project);
    let work_type = work_type_score(student, project);

    let total = clamp01(round6(
        skills * weights.skills + interests * weights.interests + work_type * weights.work_type,
    ));

    CompatibilityScore {
        skills,
        interests,
        work_type,
        total,
    }
}

fn overlap_ratio(held: &[i64], wanted: &[i64]) -> f64 {
    let wanted: HashSet<i64> = wanted.iter().copied().collect();
    if wanted.is_empty() {
        return NEUTRAL_SCORE;
    }
    if held.is_empty() {
        return 0.0;
    }

    let matched = held
        .iter()
        .copied()
        .collect::<HashSet<_>>()
        .intersection(&wanted)
        .count();

    clamp01(round6(matched as f64 / wanted.len() as f64))
}

/// Round half-up to six fractional digits. Scores are non-negative, so
/// `f64::round` (half away from zero) matches the stored precision.
pub(crate) fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

pub(crate) fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;
    use crate::WorkType;

    fn base_student() -> Student {
        Student {
            id: 1,
            skills: vec![1, 2, 3],
            interests: vec![10, 11],
            preferred_work_type: Some(WorkType::Developpement),
        }
    }

    fn base_project() -> Project {
        Project {
            id: 100,
            title: "Compiler playground".into(),
            work_type: Some(WorkType::Developpement),
            min_students: 1,
            max_students: 3,
            required_skills: vec![1, 2],
            keywords: vec![10, 12],
        }
    }

    #[test]
    fn full_skill_coverage_scores_one() {
        let score = skills_score(&base_student(), &base_project());
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_required_skills_is_neutral_for_everyone() {
        let mut project = base_project();
        project.required_skills.clear();

        assert_eq!(skills_score(&base_student(), &project), NEUTRAL_SCORE);

        let mut unskilled = base_student();
        unskilled.skills.clear();
        assert_eq!(skills_score(&unskilled, &project), NEUTRAL_SCORE);
    }

    #[test]
    fn empty_student_skills_against_requirements_score_zero() {
        let mut student = base_student();
        student.skills.clear();

        assert_eq!(skills_score(&student, &base_project()), 0.0);
    }

    #[test]
    fn partial_interest_overlap_is_a_ratio() {
        let score = interests_score(&base_student(), &base_project());
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn work_type_mismatch_is_neutral_not_zero() {
        let mut student = base_student();
        student.preferred_work_type = Some(WorkType::Recherche);
        assert_eq!(work_type_score(&student, &base_project()), NEUTRAL_SCORE);

        student.preferred_work_type = None;
        assert_eq!(work_type_score(&student, &base_project()), NEUTRAL_SCORE);

        let mut project = base_project();
        project.work_type = None;
        assert_eq!(work_type_score(&base_student(), &project), NEUTRAL_SCORE);
    }

    #[test]
    fn combined_score_stays_in_unit_interval() {
        let score = compatibility(&base_student(), &base_project(), &DEFAULT_WEIGHTS);

        for component in [score.skills, score.interests, score.work_type, score.total] {
            assert!((0.0..=1.0).contains(&component), "component {component} out of range");
        }

        // 1.0 * 0.5 + 0.5 * 0.3 + 1.0 * 0.2
        assert!((score.total - 0.85).abs() < 1e-9);
    }

    #[test]
    fn rounding_keeps_six_fractional_digits() {
        let mut project = base_project();
        project.required_skills = vec![1, 2, 4];

        let score = compatibility(&base_student(), &project, &DEFAULT_WEIGHTS);
        assert!((score.skills - 0.666667).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&score.total));
    }

    #[test]
    fn exact_ratios_combine_without_drift() {
        let mut project = base_project();
        project.required_skills = vec![1, 2, 3, 4];

        let score = compatibility(&base_student(), &project, &DEFAULT_WEIGHTS);
        // 0.75 * 0.5 + 0.5 * 0.3 + 1.0 * 0.2
        assert!((score.skills - 0.75).abs() < 1e-9);
        assert!((score.total - 0.725).abs() < 1e-9);
    }

    #[test]
    fn duplicate_identifiers_do_not_inflate_the_ratio() {
        let mut student = base_student();
        student.skills = vec![1, 1, 1];
        let mut project = base_project();
        project.required_skills = vec![1, 2];

        assert!((skills_score(&student, &project) - 0.5).abs() < 1e-9);
    }
}
