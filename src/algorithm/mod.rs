// Search core: overlap checks, pool resolution, scoring, seeds, branch and
// bound, and the run that ties them together.
pub mod branch_bound;
pub mod conflict;
pub mod pool;
pub mod recommend;
pub mod scorer;
pub mod seeds;

pub use branch_bound::{Incumbent, SearchLimits, SearchOutcome, search_from_seed};
pub use conflict::{are_serial, lectures_conflict, overlaps};
pub use pool::PoolLecture;
pub use recommend::Recommender;
pub use scorer::{Bound, BoundPolicy, ScoringContext, Weights, score, upper_bound};
pub use seeds::{SeedEntry, course_seed_score, seed_order, select_seeds};
