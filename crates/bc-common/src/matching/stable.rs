//! Capacitated deferred acceptance.
//!
//! Students propose to projects in descending order of their compatibility
//! score; a full project keeps a proposal only when it strictly beats the
//! weakest current occupant. The same student→project score serves as both
//! sides' preference order, so projects cannot rank students independently
//! of the pairwise formula.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use super::scoring::{compatibility, CompatibilityScore};
use super::weights::Weights;
use crate::{Project, Student};

/// All pairwise scores for one run, computed once and read-only afterwards.
#[derive(Debug, Default)]
pub struct ScoreMatrix {
    scores: HashMap<(i64, i64), CompatibilityScore>,
}

impl ScoreMatrix {
    pub fn insert(&mut self, student_id: i64, project_id: i64, score: CompatibilityScore) {
        self.scores.insert((student_id, project_id), score);
    }

    pub fn get(&self, student_id: i64, project_id: i64) -> Option<&CompatibilityScore> {
        self.scores.get(&(student_id, project_id))
    }

    pub fn merge(&mut self, other: ScoreMatrix) {
        self.scores.extend(other.scores);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn total(&self, student_id: i64, project_id: i64) -> f64 {
        self.get(student_id, project_id).map(|s| s.total).unwrap_or(0.0)
    }
}

/// Score every pair sequentially. Callers that want parallelism build
/// partial matrices per student chunk and [`ScoreMatrix::merge`] them.
pub fn build_score_matrix(
    students: &[Student],
    projects: &[Project],
    weights: &Weights,
) -> ScoreMatrix {
    let mut matrix = ScoreMatrix::default();
    for student in students {
        for project in projects {
            matrix.insert(student.id, project.id, compatibility(student, project, weights));
        }
    }
    matrix
}

/// One seated student in a project's final roster. `rank` is the student's
/// 1-based position within that roster, descending by score.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub student_id: i64,
    pub rank: u32,
    pub score: CompatibilityScore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRoster {
    pub project_id: i64,
    pub placements: Vec<Placement>,
}

/// Run the proposal loop to completion and return one roster per project,
/// in project input order. Students who exhaust their preference list stay
/// unmatched; rosters never exceed `Project::capacity`.
pub fn solve(students: &[Student], projects: &[Project], matrix: &ScoreMatrix) -> Vec<ProjectRoster> {
    let preferences = build_preferences(students, projects, matrix);

    let capacities: HashMap<i64, usize> =
        projects.iter().map(|p| (p.id, p.capacity())).collect();
    let mut rosters: HashMap<i64, Vec<i64>> =
        projects.iter().map(|p| (p.id, Vec::new())).collect();
    let mut next_proposal: HashMap<i64, usize> =
        students.iter().map(|s| (s.id, 0)).collect();

    let mut free: VecDeque<i64> = students.iter().map(|s| s.id).collect();

    while let Some(student_id) = free.pop_front() {
        let Some(prefs) = preferences.get(&student_id) else {
            continue;
        };

        let index = next_proposal.get(&student_id).copied().unwrap_or(0);
        if index >= prefs.len() {
            // Proposed everywhere already; permanently unmatched.
            continue;
        }

        let project_id = prefs[index];
        next_proposal.insert(student_id, index + 1);

        let Some(roster) = rosters.get_mut(&project_id) else {
            free.push_back(student_id);
            continue;
        };
        let capacity = capacities.get(&project_id).copied().unwrap_or(1);

        if roster.len() < capacity {
            roster.push(student_id);
            continue;
        }

        match worst_occupant(roster, project_id, matrix) {
            Some(worst_id) if matrix.total(student_id, project_id) > matrix.total(worst_id, project_id) => {
                roster.retain(|&id| id != worst_id);
                roster.push(student_id);
                free.push_back(worst_id);
            }
            _ => free.push_back(student_id),
        }
    }

    projects
        .iter()
        .map(|project| {
            let mut seated = rosters.remove(&project.id).unwrap_or_default();
            seated.sort_by(|&a, &b| {
                match matrix
                    .total(b, project.id)
                    .partial_cmp(&matrix.total(a, project.id))
                    .unwrap_or(Ordering::Equal)
                {
                    Ordering::Equal => a.cmp(&b),
                    other => other,
                }
            });

            let placements = seated
                .into_iter()
                .enumerate()
                .map(|(index, student_id)| Placement {
                    student_id,
                    rank: (index + 1) as u32,
                    score: matrix
                        .get(student_id, project.id)
                        .copied()
                        .unwrap_or_default(),
                })
                .collect();

            ProjectRoster {
                project_id: project.id,
                placements,
            }
        })
        .collect()
}

/// Warnings for projects whose final roster stays below `min_students`.
/// The lower bound is never enforced by the proposal loop itself.
pub fn under_capacity_warnings(projects: &[Project], rosters: &[ProjectRoster]) -> Vec<String> {
    let seated: HashMap<i64, usize> = rosters
        .iter()
        .map(|r| (r.project_id, r.placements.len()))
        .collect();

    projects
        .iter()
        .filter_map(|project| {
            let count = seated.get(&project.id).copied().unwrap_or(0);
            let minimum = project.min_students.max(0) as usize;
            (count < minimum).then(|| {
                format!(
                    "Project {} ({}) filled {count} of {minimum} minimum seats",
                    project.id, project.title
                )
            })
        })
        .collect()
}

/// Each student's proposal order: project ids by descending score, ties by
/// ascending project id.
fn build_preferences(
    students: &[Student],
    projects: &[Project],
    matrix: &ScoreMatrix,
) -> HashMap<i64, Vec<i64>> {
    students
        .iter()
        .map(|student| {
            let mut order: Vec<i64> = projects.iter().map(|p| p.id).collect();
            order.sort_by(|&a, &b| {
                match matrix
                    .total(student.id, b)
                    .partial_cmp(&matrix.total(student.id, a))
                    .unwrap_or(Ordering::Equal)
                {
                    Ordering::Equal => a.cmp(&b),
                    other => other,
                }
            });
            (student.id, order)
        })
        .collect()
}

/// The occupant a newcomer must beat: lowest score first, and among equal
/// scores the highest student id, so the lowest id is the one retained.
fn worst_occupant(roster: &[i64], project_id: i64, matrix: &ScoreMatrix) -> Option<i64> {
    roster.iter().copied().min_by(|&a, &b| {
        match matrix
            .total(a, project_id)
            .partial_cmp(&matrix.total(b, project_id))
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Equal => b.cmp(&a),
            other => other,
        }
    })
}
