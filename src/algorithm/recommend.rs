//! Recommendation run: options, seeds, search pool, one search per pool
//! lecture, then the best sets are kept and persisted for the student.

use std::collections::HashMap;
use std::panic;
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

use crate::algorithm::branch_bound::{SearchOutcome, search_from_seed};
use crate::algorithm::conflict::overlaps;
use crate::algorithm::pool::{PoolLecture, retain_allowed};
use crate::algorithm::scorer::{Bound, ScoringContext, total_credit};
use crate::algorithm::seeds::select_seeds;
use crate::api_json::{RawOptions, RecommendOptions};
use crate::config::RecommendSettings;
use crate::error::{CatalogError, RecommendError};
use crate::models::{Course, CourseId, NewTimetable, Student, Timetable};
use crate::storage::{Catalog, TimetableStore};

#[derive(Debug, Clone, Default)]
pub struct Recommender {
    settings: RecommendSettings,
}

impl Recommender {
    pub fn new(settings: RecommendSettings) -> Self {
        Recommender { settings }
    }

    pub fn settings(&self) -> &RecommendSettings {
        &self.settings
    }

    /// Parses `raw`, searches and replaces the student's recommended
    /// timetables. Nothing is written when the options are invalid or the
    /// catalog cannot be read.
    pub fn recommend<S>(
        &self,
        store: &mut S,
        raw: &RawOptions,
        student: &Student,
    ) -> Result<Vec<Timetable>, RecommendError>
    where
        S: Catalog + TimetableStore,
    {
        let options = RecommendOptions::parse(raw)?;
        let tables = self.plan(&*store, &options, student)?;
        self.persist(store, student, tables)
    }

    /// Same as [`Recommender::recommend`] with catalog and store kept apart.
    pub fn recommend_with<C, S>(
        &self,
        catalog: &C,
        store: &mut S,
        raw: &RawOptions,
        student: &Student,
    ) -> Result<Vec<Timetable>, RecommendError>
    where
        C: Catalog + ?Sized,
        S: TimetableStore + ?Sized,
    {
        let options = RecommendOptions::parse(raw)?;
        let tables = self.plan(catalog, &options, student)?;
        self.persist(store, student, tables)
    }

    fn persist<S>(
        &self,
        store: &mut S,
        student: &Student,
        tables: Vec<NewTimetable>,
    ) -> Result<Vec<Timetable>, RecommendError>
    where
        S: TimetableStore + ?Sized,
    {
        let created = store.replace_recommended(student.id, &tables)?;
        info!(student = student.id, tables = created.len(), "recommended timetables stored");
        Ok(created)
    }

    /// Computes the timetables to store, best first, without touching the
    /// store.
    pub fn plan<C>(
        &self,
        catalog: &C,
        options: &RecommendOptions,
        student: &Student,
    ) -> Result<Vec<NewTimetable>, RecommendError>
    where
        C: Catalog + ?Sized,
    {
        let started = Instant::now();
        let courses = catalog.courses()?;
        let seeds = select_seeds(&courses, self.settings.seed_count, student);
        let seed_ids: Vec<CourseId> = seeds.iter().map(|s| s.course.id).collect();
        debug!(student = student.id, seeds = ?seed_ids, "seed courses selected");

        let pool = build_pool(catalog, &courses, &seed_ids, options)?;
        info!(
            student = student.id,
            year = options.year,
            semester = %options.semester,
            seeds = seed_ids.len(),
            pool = pool.len(),
            "search pool ready"
        );

        let ctx = ScoringContext::new(student, options);
        let bound = Bound::new(self.settings.bound, &pool, &ctx);
        let outcomes = self.search_all(&pool, &ctx, &bound);

        let mut found: Vec<(Vec<usize>, f64)> = Vec::new();
        for (seed, outcome) in outcomes.into_iter().enumerate() {
            debug!(
                lecture = pool[seed].lecture.id,
                nodes = outcome.nodes,
                score = outcome.best.as_ref().map(|b| b.score),
                "seed searched"
            );
            if let Some(best) = outcome.best {
                let set: Vec<&PoolLecture> = best.lectures.iter().map(|&i| &pool[i]).collect();
                assert!(!overlaps(&set), "search returned a conflicting lecture set");
                assert!(
                    total_credit(&set) <= ctx.expected_credit,
                    "search returned a set over the credit budget"
                );
                found.push((best.lectures, best.score));
            }
        }

        // stable: equal scores keep seed order
        found.sort_by(|a, b| b.1.total_cmp(&a.1));
        found.truncate(self.settings.top_n);

        let tables: Vec<NewTimetable> = found
            .into_iter()
            .enumerate()
            .map(|(i, (lectures, score))| NewTimetable {
                title: format!("table {}", i),
                year: options.year,
                semester: options.semester,
                lectures: lectures.iter().map(|&idx| pool[idx].lecture.id).collect(),
                score,
            })
            .collect();

        info!(
            student = student.id,
            tables = tables.len(),
            best = tables.first().map(|t| t.score),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "recommendation planned"
        );
        Ok(tables)
    }

    fn search_all(
        &self,
        pool: &[PoolLecture],
        ctx: &ScoringContext,
        bound: &Bound,
    ) -> Vec<SearchOutcome> {
        let limits = self.settings.limits;
        if !self.settings.parallel || pool.len() < 2 {
            return (0..pool.len())
                .map(|seed| search_from_seed(pool, seed, ctx, bound, limits))
                .collect();
        }

        let workers = num_cpus::get().clamp(1, pool.len());
        let chunk = pool.len().div_ceil(workers);
        let seeds: Vec<usize> = (0..pool.len()).collect();
        debug!(workers, chunk, "searching seeds in parallel");

        thread::scope(|s| {
            let handles: Vec<_> = seeds
                .chunks(chunk)
                .map(|part| {
                    s.spawn(move || {
                        part.iter()
                            .map(|&seed| search_from_seed(pool, seed, ctx, bound, limits))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            // joined in spawn order, so results keep seed order
            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(part) => part,
                    Err(payload) => panic::resume_unwind(payload),
                })
                .collect()
        })
    }
}

/// Lectures of the seed courses for the requested term, resolved and
/// filtered by the request's blocks and category flags.
fn build_pool<C>(
    catalog: &C,
    courses: &[Course],
    seed_ids: &[CourseId],
    options: &RecommendOptions,
) -> Result<Vec<PoolLecture>, RecommendError>
where
    C: Catalog + ?Sized,
{
    if seed_ids.is_empty() {
        return Ok(Vec::new());
    }
    let by_id: HashMap<CourseId, &Course> = courses.iter().map(|c| (c.id, c)).collect();
    let lectures = catalog.lectures_of(seed_ids, options.year, options.semester)?;

    let mut pool = Vec::with_capacity(lectures.len());
    for lecture in lectures {
        let course = match by_id.get(&lecture.course) {
            Some(c) => (*c).clone(),
            None => {
                let err = CatalogError::UnknownCourse {
                    lecture: lecture.id,
                    course: lecture.course,
                };
                return Err(err.into());
            }
        };
        let evaluations = catalog.evaluations_of(lecture.id)?;
        pool.push(PoolLecture::resolve(lecture, course, &evaluations)?);
    }

    let total = pool.len();
    let pool = retain_allowed(pool, options);
    if pool.len() < total {
        debug!(removed = total - pool.len(), "lectures filtered by blocks or categories");
    }
    Ok(pool)
}
