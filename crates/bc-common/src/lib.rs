pub mod api;
pub mod db;
pub mod logging;
pub mod matching;
pub mod session;
pub mod strategy;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Kind of work a project revolves around. Students may declare a
/// preference; projects may declare what they are.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkType {
    Developpement,
    Recherche,
    Analyse,
    Veille,
    Conception,
    Documentation,
    Test,
    Mixte,
}

// Read-only snapshots the engine works on. Skill and interest identifiers
// reference the shared catalog; the engine never resolves them to labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Student {
    pub id: i64,
    pub skills: Vec<i64>,
    pub interests: Vec<i64>,
    pub preferred_work_type: Option<WorkType>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub work_type: Option<WorkType>,
    pub min_students: i32,
    pub max_students: i32,
    pub required_skills: Vec<i64>,
    pub keywords: Vec<i64>,
}

impl Project {
    /// Seats the stable matcher may fill. The lower bound is reporting-only.
    pub fn capacity(&self) -> usize {
        self.max_students.max(1) as usize
    }
}
