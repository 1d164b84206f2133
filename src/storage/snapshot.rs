use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::Catalog;
use crate::error::StoreError;
use crate::models::{Course, CourseId, Evaluation, Lecture, LectureId, Student, StudentId};

/// Catalog held in memory, usually read from a JSON export:
///
/// ```json
/// {
///   "courses":     [{"id": 1, "code": "CSE101", "name": "Algorithms", "type": "major_required",
///                    "grade": 2, "credit": 3, "department": "CSE"}],
///   "lectures":    [{"id": 10, "course": 1, "year": 2024, "semester": "1", "number": "001",
///                    "instructor": "Lee",
///                    "time_slots": [{"day_of_week": "mon", "start_time": "11:00", "end_time": "12:15"}]}],
///   "evaluations": [{"author": 7, "lecture": 10, "rate": 4, "comment": "good"}],
///   "students":    [{"id": 7, "grade": 2, "college": "Engineering", "department": "CSE"}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl Snapshot {
    pub fn from_json(json_str: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json_str)?)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }
}

impl Catalog for Snapshot {
    fn courses(&self) -> Result<Vec<Course>, StoreError> {
        Ok(self.courses.clone())
    }

    fn lectures_of(
        &self,
        courses: &[CourseId],
        year: i32,
        semester: char,
    ) -> Result<Vec<Lecture>, StoreError> {
        let wanted: HashSet<CourseId> = courses.iter().copied().collect();
        Ok(self
            .lectures
            .iter()
            .filter(|l| l.year == year && l.semester == semester && wanted.contains(&l.course))
            .cloned()
            .collect())
    }

    fn evaluations_of(&self, lecture: LectureId) -> Result<Vec<Evaluation>, StoreError> {
        Ok(self.evaluations.iter().filter(|e| e.lecture == lecture).cloned().collect())
    }
}
