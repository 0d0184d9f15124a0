use std::cmp::Ordering;

use super::scoring::{compatibility, CompatibilityScore};
use super::weights::Weights;
use crate::{Project, Student};

/// One project in a student's recommendation list. `rank` is dense and
/// 1-based; rank 1 carries the highest combined score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedProject {
    pub project_id: i64,
    pub rank: u32,
    pub score: CompatibilityScore,
}

/// Score a student against every project and return the descending ranking.
/// Ties are broken by ascending project id so reruns over identical inputs
/// produce identical rankings.
pub fn rank_projects(student: &Student, projects: &[Project], weights: &Weights) -> Vec<RankedProject> {
    let mut scored: Vec<(i64, CompatibilityScore)> = projects
        .iter()
        .map(|project| (project.id, compatibility(student, project, weights)))
        .collect();

    scored.sort_by(|a, b| {
        match b.1.total.partial_cmp(&a.1.total).unwrap_or(Ordering::Equal) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        }
    });

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (project_id, score))| RankedProject {
            project_id,
            rank: (index + 1) as u32,
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;

    fn student() -> Student {
        Student {
            id: 1,
            skills: vec![1, 2],
            interests: vec![],
            preferred_work_type: None,
        }
    }

    fn project(id: i64, required_skills: Vec<i64>) -> Project {
        Project {
            id,
            title: format!("project {id}"),
            min_students: 1,
            max_students: 2,
            required_skills,
            ..Project::default()
        }
    }

    #[test]
    fn ranks_are_dense_and_ordered_by_score() {
        let projects = vec![
            project(10, vec![9]),       // no overlap
            project(11, vec![1, 2]),    // full overlap
            project(12, vec![1, 9]),    // half overlap
        ];

        let ranked = rank_projects(&student(), &projects, &DEFAULT_WEIGHTS);

        assert_eq!(ranked.len(), 3);
        let ranks: Vec<u32> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(ranked[0].project_id, 11);
        assert_eq!(ranked[1].project_id, 12);
        assert_eq!(ranked[2].project_id, 10);
        assert!(ranked[0].score.total >= ranked[1].score.total);
        assert!(ranked[1].score.total >= ranked[2].score.total);
    }

    #[test]
    fn equal_scores_order_by_ascending_project_id() {
        let projects = vec![
            project(42, vec![1]),
            project(7, vec![2]),
            project(19, vec![1]),
        ];

        let ranked = rank_projects(&student(), &projects, &DEFAULT_WEIGHTS);

        let ids: Vec<i64> = ranked.iter().map(|r| r.project_id).collect();
        assert_eq!(ids, vec![7, 19, 42]);
    }

    #[test]
    fn reruns_produce_identical_rankings() {
        let projects = vec![
            project(3, vec![1, 5]),
            project(1, vec![2]),
            project(2, vec![1, 5]),
        ];

        let first = rank_projects(&student(), &projects, &DEFAULT_WEIGHTS);
        let second = rank_projects(&student(), &projects, &DEFAULT_WEIGHTS);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_project_set_yields_empty_ranking() {
        assert!(rank_projects(&student(), &[], &DEFAULT_WEIGHTS).is_empty());
    }
}
