//! Search pool: lectures joined with their course, their slots in minutes
//! and their average evaluation rate, resolved once per run.

use crate::algorithm::conflict::{Span, clock_to_minutes};
use crate::api_json::{BLOCK_CELL_MINUTES, Blocks, RecommendOptions};
use crate::error::CatalogError;
use crate::models::{Course, CourseType, Evaluation, Lecture};

/// Slots starting before this minute count as first period (10:00).
pub const FIRST_PERIOD_END: u16 = 10 * 60;

/// Highest rate an evaluation may carry.
pub const MAX_RATE: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct PoolLecture {
    pub lecture: Lecture,
    pub course: Course,
    pub spans: Vec<Span>,
    pub average_rate: Option<f64>,
}

impl PoolLecture {
    pub fn resolve(
        lecture: Lecture,
        course: Course,
        evaluations: &[Evaluation],
    ) -> Result<Self, CatalogError> {
        if lecture.course != course.id {
            return Err(CatalogError::UnknownCourse {
                lecture: lecture.id,
                course: lecture.course,
            });
        }

        let mut spans = Vec::with_capacity(lecture.time_slots.len());
        for slot in &lecture.time_slots {
            let start = clock_to_minutes(&slot.start_time).ok_or_else(|| CatalogError::InvalidTime {
                lecture: lecture.id,
                value: slot.start_time.clone(),
            })?;
            let end = clock_to_minutes(&slot.end_time).ok_or_else(|| CatalogError::InvalidTime {
                lecture: lecture.id,
                value: slot.end_time.clone(),
            })?;
            if end <= start {
                return Err(CatalogError::EmptySlot {
                    lecture: lecture.id,
                    start: slot.start_time.clone(),
                    end: slot.end_time.clone(),
                });
            }
            spans.push(Span { day: slot.day_of_week, start, end });
        }

        let mut total: u32 = 0;
        for ev in evaluations {
            if ev.rate > MAX_RATE {
                return Err(CatalogError::RateOutOfRange { lecture: lecture.id, rate: ev.rate });
            }
            total += u32::from(ev.rate);
        }
        let average_rate = if evaluations.is_empty() {
            None
        } else {
            Some(f64::from(total) / evaluations.len() as f64)
        };

        Ok(PoolLecture { lecture, course, spans, average_rate })
    }

    pub fn credit(&self) -> u32 {
        self.course.credit
    }

    pub fn first_period_slots(&self) -> usize {
        self.spans.iter().filter(|s| s.start < FIRST_PERIOD_END).count()
    }

    /// True if some slot overlaps a forbidden cell of its weekday.
    pub fn hits_block(&self, blocks: &Blocks) -> bool {
        self.spans.iter().any(|span| {
            blocks.for_day(span.day).iter().any(|&start| {
                let cell = Span { day: span.day, start, end: start + BLOCK_CELL_MINUTES };
                span.intersects(&cell)
            })
        })
    }

    /// Whether the requested category flags allow this lecture.
    pub fn category_allowed(&self, options: &RecommendOptions) -> bool {
        match self.course.course_type {
            CourseType::MajorRequired => options.major_required,
            CourseType::MajorElective => options.major_elective,
            CourseType::GeneralEducation => options.general_education,
            CourseType::Other => true,
        }
    }
}

/// Drops lectures the request rules out: forbidden blocks and disabled
/// categories. Order of the remaining lectures is kept.
pub fn retain_allowed(pool: Vec<PoolLecture>, options: &RecommendOptions) -> Vec<PoolLecture> {
    pool.into_iter()
        .filter(|p| p.category_allowed(options) && !p.hits_block(&options.blocks))
        .collect()
}
