//! Collaborators of the recommender: a read-only catalog and the store of
//! generated timetables.

mod snapshot;
mod sqlite;

pub use snapshot::Snapshot;
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::models::{
    Course, CourseId, Evaluation, Lecture, LectureId, NewTimetable, StudentId, Timetable,
};

/// Read-only catalog queries needed by a recommendation run.
pub trait Catalog {
    /// Every course, in a stable order.
    fn courses(&self) -> Result<Vec<Course>, StoreError>;

    /// Lectures of the given courses offered in `year`/`semester`, time
    /// slots attached, in a stable order.
    fn lectures_of(
        &self,
        courses: &[CourseId],
        year: i32,
        semester: char,
    ) -> Result<Vec<Lecture>, StoreError>;

    fn evaluations_of(&self, lecture: LectureId) -> Result<Vec<Evaluation>, StoreError>;
}

/// Persistence of recommended timetables.
pub trait TimetableStore {
    /// Deletes every recommended timetable of `owner` and creates `tables`,
    /// as one atomic step. Returns the created records in input order.
    fn replace_recommended(
        &mut self,
        owner: StudentId,
        tables: &[NewTimetable],
    ) -> Result<Vec<Timetable>, StoreError>;

    fn recommended_for(&self, owner: StudentId) -> Result<Vec<Timetable>, StoreError>;
}
