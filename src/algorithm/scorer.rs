//! Desirability score of a lecture set and the pruning bound derived from it.

use serde::{Deserialize, Serialize};

use crate::algorithm::conflict::precedes_closely;
use crate::algorithm::pool::{MAX_RATE, PoolLecture};
use crate::api_json::RecommendOptions;
use crate::models::{CourseId, CourseType, Student};
use std::collections::BTreeSet;

/// Per-criterion weights. All weights are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weights {
    pub credit: f64,
    pub first_period: f64,
    pub serial_lectures: f64,
    pub evaluation: f64,
    /// Carried for the `avoid_void` option; no term of [`score`] reads it.
    pub void_lectures: f64,
}

impl Weights {
    pub fn from_options(options: &RecommendOptions) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Weights {
            credit: 1.0,
            first_period: flag(options.avoid_first),
            serial_lectures: flag(options.avoid_successive),
            evaluation: 1.0,
            void_lectures: flag(options.avoid_void),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringContext {
    pub department: Option<String>,
    pub major: Option<String>,
    /// Courses the student opted out of; they never earn affinity bonuses.
    pub not_recommends: BTreeSet<CourseId>,
    pub weights: Weights,
    pub expected_credit: u32,
}

impl ScoringContext {
    pub fn new(student: &Student, options: &RecommendOptions) -> Self {
        ScoringContext {
            department: student.department.clone(),
            major: student.major.clone(),
            not_recommends: student.not_recommends.clone(),
            weights: Weights::from_options(options),
            expected_credit: options.credit,
        }
    }

    fn same_department(&self, dept: &Option<String>) -> bool {
        matches!((dept, &self.department), (Some(a), Some(b)) if a == b)
    }

    fn same_major(&self, major: &Option<String>) -> bool {
        matches!((major, &self.major), (Some(a), Some(b)) if a == b)
    }
}

/// Score of one lecture per credit unit, before the first-period penalty.
pub fn unit_score(lecture: &PoolLecture, ctx: &ScoringContext) -> f64 {
    let course = &lecture.course;
    let mut s = 0.0;

    if course.course_type == CourseType::GeneralEducation {
        s += 1.0;
    }
    let opted_out = ctx.not_recommends.contains(&course.id);
    if !opted_out && ctx.same_department(&course.department) {
        s += 2.0;
    }
    if !opted_out && ctx.same_major(&course.major) {
        s += 3.0;
        match course.course_type {
            CourseType::MajorElective => s += 3.0,
            CourseType::MajorRequired => s += 6.0,
            _ => {}
        }
    }
    if let Some(rate) = lecture.average_rate {
        s -= (f64::from(MAX_RATE) - rate) * ctx.weights.evaluation;
    }
    s
}

/// Number of ordered pairs (a, b) where a slot of `a` ends shortly before
/// a slot of `b` starts on the same day. A pair that is serial both ways
/// counts twice.
pub fn serial_pairs(lectures: &[&PoolLecture]) -> usize {
    let mut n = 0;
    for (i, a) in lectures.iter().enumerate() {
        for (j, b) in lectures.iter().enumerate() {
            if i != j && precedes_closely(a, b) {
                n += 1;
            }
        }
    }
    n
}

pub fn total_credit(lectures: &[&PoolLecture]) -> u32 {
    lectures.iter().map(|l| l.credit()).sum()
}

/// Desirability of a lecture set. May be negative.
pub fn score(lectures: &[&PoolLecture], ctx: &ScoringContext) -> f64 {
    let w = &ctx.weights;
    let mut total = 0.0;

    for lecture in lectures {
        total -= w.first_period * lecture.first_period_slots() as f64;
        total += unit_score(lecture, ctx) * f64::from(lecture.credit());
    }

    total -= w.serial_lectures * serial_pairs(lectures) as f64;

    let distance = (i64::from(total_credit(lectures)) - i64::from(ctx.expected_credit)).abs();
    total -= w.credit * distance as f64;
    total
}

/// How child states are bounded during branch and bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundPolicy {
    /// The partial set's own score.
    #[default]
    Reference,
    /// Own score plus the best gain per credit the pool can offer, times the
    /// remaining budget. Never underestimates a reachable leaf.
    Optimistic,
}

/// Bound prepared for one pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Reference,
    Optimistic { gain_per_credit: f64 },
}

impl Bound {
    pub fn new(policy: BoundPolicy, pool: &[PoolLecture], ctx: &ScoringContext) -> Self {
        match policy {
            BoundPolicy::Reference => Bound::Reference,
            BoundPolicy::Optimistic => {
                // Adding c credits below the budget shrinks the distance
                // term by exactly c; penalties only lower the gain.
                let best = pool
                    .iter()
                    .map(|l| unit_score(l, ctx) + ctx.weights.credit)
                    .fold(0.0_f64, f64::max);
                Bound::Optimistic { gain_per_credit: best }
            }
        }
    }
}

/// Estimate of the best score reachable by extending `lectures` within the
/// credit budget.
pub fn upper_bound(lectures: &[&PoolLecture], ctx: &ScoringContext, bound: &Bound) -> f64 {
    let own = score(lectures, ctx);
    match bound {
        Bound::Reference => own,
        Bound::Optimistic { gain_per_credit } => {
            let remaining = ctx.expected_credit.saturating_sub(total_credit(lectures));
            own + f64::from(remaining) * gain_per_credit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::pool::tests::{course, lecture};
    use crate::api_json::Blocks;
    use crate::models::{Evaluation, Weekday};

    fn options(credit: u32, avoid_first: bool, avoid_successive: bool) -> RecommendOptions {
        RecommendOptions {
            year: 2024,
            semester: '1',
            avoid_successive,
            avoid_void: false,
            avoid_first,
            major_required: true,
            major_elective: true,
            general_education: true,
            credit,
            blocks: Blocks::default(),
        }
    }

    fn ctx(credit: u32, avoid_first: bool, avoid_successive: bool) -> ScoringContext {
        ScoringContext {
            department: Some("CSE".to_string()),
            major: Some("CS".to_string()),
            not_recommends: BTreeSet::new(),
            weights: Weights::from_options(&options(credit, avoid_first, avoid_successive)),
            expected_credit: credit,
        }
    }

    fn pool_lecture(
        id: i64,
        course_type: CourseType,
        credit: u32,
        dept: Option<&str>,
        major: Option<&str>,
        slots: &[(Weekday, &str, &str)],
        rates: &[u8],
    ) -> PoolLecture {
        let mut c = course(id, course_type, credit);
        c.department = dept.map(str::to_string);
        c.major = major.map(str::to_string);
        let evs: Vec<Evaluation> = rates
            .iter()
            .map(|&rate| Evaluation { author: 1, lecture: id, rate, comment: String::new() })
            .collect();
        PoolLecture::resolve(lecture(id, id, slots), c, &evs).unwrap()
    }

    #[test]
    fn test_unit_score_bonuses_stack() {
        let c = ctx(15, false, false);
        let req = pool_lecture(1, CourseType::MajorRequired, 3, Some("CSE"), Some("CS"), &[], &[]);
        let elec = pool_lecture(2, CourseType::MajorElective, 3, Some("CSE"), Some("CS"), &[], &[]);
        let gen_ed = pool_lecture(3, CourseType::GeneralEducation, 2, None, None, &[], &[]);
        let dept_only = pool_lecture(4, CourseType::MajorRequired, 3, Some("CSE"), None, &[], &[]);
        assert_eq!(unit_score(&req, &c), 2.0 + 3.0 + 6.0);
        assert_eq!(unit_score(&elec, &c), 2.0 + 3.0 + 3.0);
        assert_eq!(unit_score(&gen_ed, &c), 1.0);
        assert_eq!(unit_score(&dept_only, &c), 2.0);
    }

    #[test]
    fn test_missing_profile_fields_never_match() {
        let mut c = ctx(15, false, false);
        c.department = None;
        c.major = None;
        let no_dept = pool_lecture(1, CourseType::MajorRequired, 3, None, None, &[], &[]);
        assert_eq!(unit_score(&no_dept, &c), 0.0);
    }

    #[test]
    fn test_opted_out_course_earns_no_affinity() {
        let mut c = ctx(15, false, false);
        c.not_recommends.insert(1);
        let req = pool_lecture(1, CourseType::MajorRequired, 3, Some("CSE"), Some("CS"), &[], &[]);
        let gen_ed = pool_lecture(3, CourseType::GeneralEducation, 2, Some("CSE"), None, &[], &[]);
        assert_eq!(unit_score(&req, &c), 0.0);
        assert_eq!(unit_score(&gen_ed, &c), 1.0 + 2.0);
    }

    #[test]
    fn test_evaluation_penalty_scales_with_credit() {
        let c = ctx(3, false, false);
        let rated = pool_lecture(1, CourseType::Other, 3, None, None, &[], &[4, 3]);
        // (5 - 3.5) * 1 per credit, three credits, on budget
        assert_eq!(score(&[&rated], &c), -4.5);
        let unrated = pool_lecture(2, CourseType::Other, 3, None, None, &[], &[]);
        assert_eq!(score(&[&unrated], &c), 0.0);
    }

    #[test]
    fn test_first_period_charged_per_slot() {
        let early = pool_lecture(
            1,
            CourseType::Other,
            3,
            None,
            None,
            &[
                (Weekday::Mon, "09:00", "10:15"),
                (Weekday::Wed, "09:00", "10:15"),
                (Weekday::Fri, "10:00", "11:00"),
            ],
            &[],
        );
        assert_eq!(score(&[&early], &ctx(3, true, false)), -2.0);
        assert_eq!(score(&[&early], &ctx(3, false, false)), 0.0);
    }

    #[test]
    fn test_serial_pair_counted_per_direction() {
        let a_slots = [(Weekday::Mon, "10:00", "11:00"), (Weekday::Tue, "13:00", "14:00")];
        let b_slots = [(Weekday::Mon, "11:15", "12:00"), (Weekday::Tue, "12:00", "12:45")];
        let a = pool_lecture(1, CourseType::Other, 3, None, None, &a_slots, &[]);
        let b = pool_lecture(2, CourseType::Other, 3, None, None, &b_slots, &[]);
        assert_eq!(serial_pairs(&[&a, &b]), 2);
        assert_eq!(score(&[&a, &b], &ctx(6, false, true)), -2.0);
        assert_eq!(score(&[&a, &b], &ctx(6, false, false)), 0.0);
    }

    #[test]
    fn test_credit_distance() {
        let a = pool_lecture(1, CourseType::Other, 3, None, None, &[], &[]);
        assert_eq!(score(&[&a], &ctx(15, false, false)), -12.0);
        assert_eq!(score(&[], &ctx(15, false, false)), -15.0);
    }

    #[test]
    fn test_optimistic_bound_dominates_reference() {
        let c = ctx(9, false, false);
        let req = pool_lecture(1, CourseType::MajorRequired, 3, Some("CSE"), Some("CS"), &[], &[]);
        let other = pool_lecture(2, CourseType::Other, 3, None, None, &[], &[]);
        let pool = vec![req.clone(), other.clone()];
        let reference = Bound::new(BoundPolicy::Reference, &pool, &c);
        let optimistic = Bound::new(BoundPolicy::Optimistic, &pool, &c);
        assert_eq!(optimistic, Bound::Optimistic { gain_per_credit: 12.0 });

        let partial = [&other];
        assert_eq!(upper_bound(&partial, &c, &reference), score(&partial, &c));
        // 6 credits left at 12 per credit
        assert_eq!(upper_bound(&partial, &c, &optimistic), score(&partial, &c) + 72.0);
        assert!(upper_bound(&partial, &c, &optimistic) >= score(&[&other, &req], &c));
    }
}
