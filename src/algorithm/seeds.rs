//! Seed selection: a bounded top-k over a cheap static course heuristic.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::models::{Course, CourseType, Student};

pub const DEFAULT_SEED_COUNT: usize = 10;

/// Static desirability of a course for the student.
pub fn course_seed_score(course: &Course, student: &Student) -> i64 {
    if student.not_recommends.contains(&course.id) {
        return 0;
    }

    let mut score = -(i64::from(course.grade) - i64::from(student.grade)).abs();
    let same_department =
        matches!((&course.department, &student.department), (Some(a), Some(b)) if a == b);

    match course.course_type {
        CourseType::MajorRequired if same_department => score += 8,
        CourseType::MajorElective if same_department => score += 4,
        CourseType::GeneralEducation => score += 2,
        _ => {}
    }
    score
}

#[derive(Debug, Clone, Copy)]
pub struct SeedEntry<'a> {
    pub score: i64,
    /// Position in the catalog listing; earlier courses win ties.
    pub position: usize,
    pub course: &'a Course,
}

/// Total order of seed candidates: score, then catalog position.
pub fn seed_order(a: &SeedEntry<'_>, b: &SeedEntry<'_>) -> Ordering {
    a.score
        .cmp(&b.score)
        .then_with(|| b.position.cmp(&a.position))
}

impl PartialEq for SeedEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        seed_order(self, other) == Ordering::Equal
    }
}

impl Eq for SeedEntry<'_> {}

impl PartialOrd for SeedEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SeedEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        seed_order(self, other)
    }
}

/// Keeps the `k` best courses with a min-heap of size `k`. Single pass,
/// O(C log k). Returned best first.
pub fn select_seeds<'a>(courses: &'a [Course], k: usize, student: &Student) -> Vec<SeedEntry<'a>> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<SeedEntry<'a>>> = BinaryHeap::with_capacity(k + 1);
    for (position, course) in courses.iter().enumerate() {
        heap.push(Reverse(SeedEntry {
            score: course_seed_score(course, student),
            position,
            course,
        }));
        if heap.len() > k {
            heap.pop();
        }
    }
    heap.into_sorted_vec().into_iter().map(|Reverse(e)| e).collect()
}
