//! Branch and bound over lecture sets grown from a single seed lecture.
//!
//! At every node all feasible one-lecture extensions are generated and
//! bounded; they are then visited best bound first, and a child is entered
//! only while its bound strictly beats the incumbent. A node is evaluated
//! when some candidate would overflow the credit budget, or when nothing
//! can be added to it at all.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::algorithm::conflict::lectures_conflict;
use crate::algorithm::pool::PoolLecture;
use crate::algorithm::scorer::{Bound, ScoringContext, score, upper_bound};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Nodes a single seed search may expand before it stops early.
    pub max_nodes: Option<u64>,
}

/// Best set found so far, as indices into the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Incumbent {
    pub lectures: Vec<usize>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// `None` when the seed alone exceeds the credit budget.
    pub best: Option<Incumbent>,
    pub nodes: u64,
    pub truncated: bool,
}

struct Run<'a> {
    pool: &'a [PoolLecture],
    ctx: &'a ScoringContext,
    bound: &'a Bound,
    limits: SearchLimits,
    incumbent: Incumbent,
    nodes: u64,
    truncated: bool,
}

impl Run<'_> {
    fn offer(&mut self, current: &[usize], value: f64) {
        if value > self.incumbent.score {
            self.incumbent = Incumbent { lectures: current.to_vec(), score: value };
        }
    }

    fn branch(&mut self, current: &mut Vec<usize>, credit: u32) {
        self.nodes += 1;
        if let Some(max) = self.limits.max_nodes {
            if self.nodes > max {
                self.truncated = true;
                return;
            }
        }

        let pool = self.pool;
        let mut set: Vec<&PoolLecture> = current.iter().map(|&i| &pool[i]).collect();
        let mut children: Vec<(usize, f64)> = Vec::new();
        let mut overflow = false;

        for (idx, cand) in pool.iter().enumerate() {
            if set.iter().any(|l| lectures_conflict(l, cand)) {
                continue;
            }
            if credit + cand.credit() <= self.ctx.expected_credit {
                set.push(cand);
                children.push((idx, upper_bound(&set, self.ctx, self.bound)));
                set.pop();
            } else {
                overflow = true;
            }
        }

        if overflow || children.is_empty() {
            let value = score(&set, self.ctx);
            self.offer(current, value);
        }

        // stable: equal bounds keep pool order
        children.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (idx, child_bound) in children {
            if self.truncated {
                break;
            }
            if child_bound > self.incumbent.score {
                current.push(idx);
                self.branch(current, credit + pool[idx].credit());
                current.pop();
            }
        }
    }
}

/// Best lecture set reachable from `pool[seed]`. The incumbent starts as the
/// seed alone, so the result is never worse than the seed by itself.
pub fn search_from_seed(
    pool: &[PoolLecture],
    seed: usize,
    ctx: &ScoringContext,
    bound: &Bound,
    limits: SearchLimits,
) -> SearchOutcome {
    let seed_credit = pool[seed].credit();
    if seed_credit > ctx.expected_credit {
        return SearchOutcome { best: None, nodes: 0, truncated: false };
    }

    let mut run = Run {
        pool,
        ctx,
        bound,
        limits,
        incumbent: Incumbent { lectures: vec![seed], score: score(&[&pool[seed]], ctx) },
        nodes: 0,
        truncated: false,
    };
    let mut current = vec![seed];
    run.branch(&mut current, seed_credit);

    if run.truncated {
        warn!(
            lecture = pool[seed].lecture.id,
            nodes = run.nodes,
            "node limit reached, keeping best set found so far"
        );
    }

    SearchOutcome { best: Some(run.incumbent), nodes: run.nodes, truncated: run.truncated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::conflict::overlaps;
    use crate::algorithm::pool::tests::{course, lecture};
    use crate::algorithm::scorer::{BoundPolicy, Weights, total_credit};
    use crate::models::{Course, CourseType, Weekday};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    fn ctx(expected_credit: u32) -> ScoringContext {
        ScoringContext {
            department: Some("CSE".to_string()),
            major: Some("CS".to_string()),
            not_recommends: BTreeSet::new(),
            weights: Weights {
                credit: 1.0,
                first_period: 1.0,
                serial_lectures: 1.0,
                evaluation: 1.0,
                void_lectures: 0.0,
            },
            expected_credit,
        }
    }

    fn pool_entry(id: i64, c: Course, slot: (Weekday, &str, &str)) -> PoolLecture {
        PoolLecture::resolve(lecture(id, c.id, &[slot]), c, &[]).unwrap()
    }

    /// Same tree, no pruning: every node is expanded and the same nodes are
    /// evaluated. Returns the best score and every set reaching it, each
    /// sorted.
    fn exhaustive(
        pool: &[PoolLecture],
        seed: usize,
        ctx: &ScoringContext,
    ) -> (f64, Vec<Vec<usize>>) {
        fn walk(
            pool: &[PoolLecture],
            current: &mut Vec<usize>,
            credit: u32,
            ctx: &ScoringContext,
            leaves: &mut Vec<(Vec<usize>, f64)>,
        ) {
            let set: Vec<&PoolLecture> = current.iter().map(|&i| &pool[i]).collect();
            let mut children = Vec::new();
            let mut overflow = false;
            for (idx, cand) in pool.iter().enumerate() {
                if set.iter().any(|l| lectures_conflict(l, cand)) {
                    continue;
                }
                if credit + cand.credit() <= ctx.expected_credit {
                    children.push(idx);
                } else {
                    overflow = true;
                }
            }
            if overflow || children.is_empty() {
                leaves.push((current.clone(), score(&set, ctx)));
            }
            for idx in children {
                current.push(idx);
                walk(pool, current, credit + pool[idx].credit(), ctx, leaves);
                current.pop();
            }
        }

        let mut leaves = vec![(vec![seed], score(&[&pool[seed]], ctx))];
        walk(pool, &mut vec![seed], pool[seed].credit(), ctx, &mut leaves);
        let best = leaves.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
        let mut sets: Vec<Vec<usize>> = leaves
            .into_iter()
            .filter(|(_, v)| (v - best).abs() < 1e-9)
            .map(|(mut set, _)| {
                set.sort_unstable();
                set
            })
            .collect();
        sets.sort();
        sets.dedup();
        (best, sets)
    }

    fn synthetic_pool(rng: &mut SmallRng, n: usize) -> Vec<PoolLecture> {
        const TYPES: [CourseType; 4] = [
            CourseType::MajorRequired,
            CourseType::MajorElective,
            CourseType::GeneralEducation,
            CourseType::Other,
        ];
        const STARTS: [&str; 6] = ["09:00", "09:30", "10:30", "12:00", "13:00", "14:30"];
        const ENDS: [&str; 6] = ["10:15", "10:45", "11:45", "13:15", "14:15", "15:45"];
        (0..n)
            .map(|i| {
                // a few lectures share a course so same-course exclusion is exercised
                let course_id = rng.random_range(1..n as i64);
                let credit = 1 + (course_id as u32 % 3);
                let mut c = course(course_id, TYPES[(course_id as usize) % 4], credit);
                if course_id % 2 == 0 {
                    c.department = Some("CSE".to_string());
                }
                if course_id % 3 == 0 {
                    c.major = Some("CS".to_string());
                }
                let day = Weekday::ALL[rng.random_range(0..3)];
                let t = rng.random_range(0..STARTS.len());
                let l = lecture(i as i64 + 1, course_id, &[(day, STARTS[t], ENDS[t])]);
                PoolLecture::resolve(l, c, &[]).unwrap()
            })
            .collect()
    }

    #[test]
    fn optimistic_bound_matches_exhaustive_search() {
        let mut rng = SmallRng::seed_from_u64(42);
        for round in 0..40 {
            let n = 3 + (round % 6);
            let pool = synthetic_pool(&mut rng, n);
            let c = ctx(4 + (round as u32 % 6));
            let bound = Bound::new(BoundPolicy::Optimistic, &pool, &c);
            for seed in 0..pool.len() {
                let outcome = search_from_seed(&pool, seed, &c, &bound, SearchLimits::default());
                if pool[seed].credit() > c.expected_credit {
                    assert_eq!(outcome.best, None, "round {round} seed {seed}");
                    continue;
                }
                let (want, optimal_sets) = exhaustive(&pool, seed, &c);
                let best = outcome.best.unwrap();
                assert!(
                    (best.score - want).abs() < 1e-9,
                    "round {round} seed {seed}: {} vs {want}",
                    best.score
                );
                assert_eq!(best.lectures[0], seed);

                let mut found = best.lectures.clone();
                found.sort_unstable();
                assert!(
                    optimal_sets.contains(&found),
                    "round {round} seed {seed}: {found:?} not among {optimal_sets:?}"
                );
                let set: Vec<&PoolLecture> = best.lectures.iter().map(|&i| &pool[i]).collect();
                assert!(!overlaps(&set));
                assert!(total_credit(&set) <= c.expected_credit);
            }
        }
    }

    #[test]
    fn unique_optimum_is_the_returned_set() {
        let mut a = course(1, CourseType::MajorRequired, 3);
        a.department = Some("CSE".to_string());
        a.major = Some("CS".to_string());
        let b = course(2, CourseType::GeneralEducation, 3);
        let d = course(3, CourseType::Other, 3);
        let pool = vec![
            pool_entry(1, a, (Weekday::Tue, "12:00", "13:15")),
            pool_entry(2, b, (Weekday::Wed, "12:00", "13:15")),
            pool_entry(3, d, (Weekday::Wed, "12:30", "13:45")),
        ];
        let c = ctx(6);
        let (_, optimal_sets) = exhaustive(&pool, 0, &c);
        assert_eq!(optimal_sets, vec![vec![0, 1]]);

        for policy in [BoundPolicy::Reference, BoundPolicy::Optimistic] {
            let bound = Bound::new(policy, &pool, &c);
            let best = search_from_seed(&pool, 0, &c, &bound, SearchLimits::default())
                .best
                .unwrap();
            assert_eq!(best.lectures, vec![0, 1], "{policy:?}");
        }
    }

    #[test]
    fn seed_kept_when_nothing_fits() {
        let mut a = course(1, CourseType::MajorRequired, 3);
        a.department = Some("CSE".to_string());
        let b = course(2, CourseType::Other, 15);
        let pool = vec![
            pool_entry(1, a, (Weekday::Mon, "11:00", "12:15")),
            pool_entry(2, b, (Weekday::Mon, "12:00", "13:15")),
        ];
        let c = ctx(15);
        let bound = Bound::new(BoundPolicy::Reference, &pool, &c);

        let from_a = search_from_seed(&pool, 0, &c, &bound, SearchLimits::default());
        let best = from_a.best.unwrap();
        assert_eq!(best.lectures, vec![0]);
        // department bonus 2 per credit, 12 credits short of budget
        assert_eq!(best.score, 6.0 - 12.0);

        let from_b = search_from_seed(&pool, 1, &c, &bound, SearchLimits::default());
        assert_eq!(from_b.best.unwrap().lectures, vec![1]);
    }

    #[test]
    fn oversized_seed_yields_nothing() {
        let big = course(1, CourseType::Other, 20);
        let pool = vec![PoolLecture::resolve(lecture(1, 1, &[]), big, &[]).unwrap()];
        let c = ctx(18);
        let outcome = search_from_seed(&pool, 0, &c, &Bound::Reference, SearchLimits::default());
        assert_eq!(outcome.best, None);
        assert_eq!(outcome.nodes, 0);
    }

    #[test]
    fn node_limit_truncates_search() {
        let mut rng = SmallRng::seed_from_u64(7);
        let pool = synthetic_pool(&mut rng, 8);
        let c = ctx(9);
        let bound = Bound::new(BoundPolicy::Optimistic, &pool, &c);
        let limited = search_from_seed(&pool, 0, &c, &bound, SearchLimits { max_nodes: Some(1) });
        assert!(limited.nodes <= 2);
        let best = limited.best.unwrap();
        assert_eq!(best.lectures[0], 0);
        let full = search_from_seed(&pool, 0, &c, &bound, SearchLimits::default());
        assert!(full.best.unwrap().score >= best.score);
    }
}
