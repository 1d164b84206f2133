// Root of the `ttrec` timetable recommender.
// Re-exports the types used by the binary and the integration tests.
pub mod algorithm;
pub mod api_json;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use algorithm::{BoundPolicy, Recommender, SearchLimits};
pub use api_json::{Blocks, RawOptions, RecommendOptions};
pub use config::{Config, RecommendSettings};
pub use error::{CatalogError, OptionsError, RecommendError, StoreError};
pub use models::{
    Course, CourseType, Evaluation, Lecture, NewTimetable, Student, TimeSlot, Timetable, Weekday,
};
pub use storage::{Catalog, Snapshot, SqliteStore, TimetableStore};
