use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use super::{Catalog, Snapshot, TimetableStore};
use crate::error::StoreError;
use crate::models::{
    Course, CourseId, CourseType, Evaluation, Lecture, LectureId, NewTimetable, Student, StudentId,
    TimeSlot, Timetable, Weekday,
};

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Kind tag of timetables generated by the recommender.
const RECOMMENDED: &str = "recommended";

/// SQLite-backed catalog and timetable store.
pub struct SqliteStore {
    conn: Connection,
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn char_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<char> {
    let text: String = row.get(idx)?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(conversion_error(idx, format!("expected a single character, got {:?}", text))),
    }
}

fn weekday_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Weekday> {
    let text: String = row.get(idx)?;
    text.parse::<Weekday>().map_err(|e| conversion_error(idx, e))
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(SqliteStore { conn })
    }

    /// Inserts (or updates) every record of the snapshot in one transaction.
    pub fn import_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for c in &snapshot.courses {
            tx.execute(
                "INSERT INTO courses (id, code, name, type, field, grade, credit, college, department, major)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET code = excluded.code, name = excluded.name, type = excluded.type,
                   field = excluded.field, grade = excluded.grade, credit = excluded.credit,
                   college = excluded.college, department = excluded.department, major = excluded.major",
                params![
                    c.id,
                    c.code,
                    c.name,
                    c.course_type.as_str(),
                    c.field,
                    c.grade,
                    c.credit,
                    c.college,
                    c.department,
                    c.major
                ],
            )?;
        }
        for l in &snapshot.lectures {
            tx.execute(
                "INSERT INTO lectures (id, course_id, year, semester, number, instructor)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET course_id = excluded.course_id, year = excluded.year,
                   semester = excluded.semester, number = excluded.number, instructor = excluded.instructor",
                params![l.id, l.course, l.year, l.semester.to_string(), l.number, l.instructor],
            )?;
            tx.execute("DELETE FROM time_slots WHERE lecture_id = ?1", [l.id])?;
            for slot in &l.time_slots {
                tx.execute(
                    "INSERT INTO time_slots (lecture_id, day_of_week, start_time, end_time, classroom)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        l.id,
                        slot.day_of_week.as_str(),
                        slot.start_time,
                        slot.end_time,
                        slot.classroom
                    ],
                )?;
            }
        }
        let lecture_ids: HashSet<LectureId> =
            snapshot.evaluations.iter().map(|e| e.lecture).collect();
        for id in lecture_ids {
            tx.execute("DELETE FROM evaluations WHERE lecture_id = ?1", [id])?;
        }
        for e in &snapshot.evaluations {
            tx.execute(
                "INSERT INTO evaluations (author_id, lecture_id, rate, comment) VALUES (?1, ?2, ?3, ?4)",
                params![e.author, e.lecture, e.rate, e.comment],
            )?;
        }
        for s in &snapshot.students {
            tx.execute(
                "INSERT INTO students (id, grade, college, department, major) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET grade = excluded.grade, college = excluded.college,
                   department = excluded.department, major = excluded.major",
                params![s.id, s.grade, s.college, s.department, s.major],
            )?;
            tx.execute("DELETE FROM not_recommends WHERE student_id = ?1", [s.id])?;
            for course in &s.not_recommends {
                tx.execute(
                    "INSERT INTO not_recommends (student_id, course_id) VALUES (?1, ?2)",
                    params![s.id, course],
                )?;
            }
        }
        tx.commit()?;
        info!(
            courses = snapshot.courses.len(),
            lectures = snapshot.lectures.len(),
            evaluations = snapshot.evaluations.len(),
            students = snapshot.students.len(),
            "snapshot imported"
        );
        Ok(())
    }

    pub fn student(&self, id: StudentId) -> Result<Option<Student>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, grade, college, department, major FROM students WHERE id = ?1",
                [id],
                |row| {
                    Ok(Student {
                        id: row.get(0)?,
                        grade: row.get(1)?,
                        college: row.get(2)?,
                        department: row.get(3)?,
                        major: row.get(4)?,
                        not_recommends: BTreeSet::new(),
                    })
                },
            )
            .optional()?;
        let Some(mut student) = row else {
            return Ok(None);
        };
        let mut stmt = self
            .conn
            .prepare("SELECT course_id FROM not_recommends WHERE student_id = ?1")?;
        let rows = stmt.query_map([id], |row| row.get::<_, CourseId>(0))?;
        for course in rows {
            student.not_recommends.insert(course?);
        }
        Ok(Some(student))
    }

    fn time_slots_of(&self, lecture: LectureId) -> Result<Vec<TimeSlot>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT day_of_week, start_time, end_time, classroom FROM time_slots WHERE lecture_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([lecture], |row| {
            Ok(TimeSlot {
                day_of_week: weekday_column(row, 0)?,
                start_time: row.get(1)?,
                end_time: row.get(2)?,
                classroom: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for slot in rows {
            out.push(slot?);
        }
        Ok(out)
    }

    fn lectures_of_timetable(&self, timetable: i64) -> Result<Vec<LectureId>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT lecture_id FROM timetable_lectures WHERE timetable_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map([timetable], |row| row.get::<_, LectureId>(0))?;
        let mut out = Vec::new();
        for id in rows {
            out.push(id?);
        }
        Ok(out)
    }
}

impl Catalog for SqliteStore {
    fn courses(&self) -> Result<Vec<Course>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, name, type, field, grade, credit, college, department, major FROM courses ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let tag: String = row.get(3)?;
            Ok(Course {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
                course_type: CourseType::from_tag(&tag),
                field: row.get(4)?,
                grade: row.get(5)?,
                credit: row.get(6)?,
                college: row.get(7)?,
                department: row.get(8)?,
                major: row.get(9)?,
            })
        })?;
        let mut out = Vec::new();
        for c in rows {
            out.push(c?);
        }
        Ok(out)
    }

    fn lectures_of(
        &self,
        courses: &[CourseId],
        year: i32,
        semester: char,
    ) -> Result<Vec<Lecture>, StoreError> {
        let wanted: HashSet<CourseId> = courses.iter().copied().collect();
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, year, semester, number, instructor FROM lectures
             WHERE year = ?1 AND semester = ?2 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![year, semester.to_string()], |row| {
            Ok(Lecture {
                id: row.get(0)?,
                course: row.get(1)?,
                year: row.get(2)?,
                semester: char_column(row, 3)?,
                number: row.get(4)?,
                instructor: row.get(5)?,
                time_slots: Vec::new(),
            })
        })?;
        let mut out = Vec::new();
        for lecture in rows {
            let mut lecture = lecture?;
            if !wanted.contains(&lecture.course) {
                continue;
            }
            lecture.time_slots = self.time_slots_of(lecture.id)?;
            out.push(lecture);
        }
        Ok(out)
    }

    fn evaluations_of(&self, lecture: LectureId) -> Result<Vec<Evaluation>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT author_id, lecture_id, rate, comment FROM evaluations WHERE lecture_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([lecture], |row| {
            Ok(Evaluation {
                author: row.get(0)?,
                lecture: row.get(1)?,
                rate: row.get(2)?,
                comment: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for e in rows {
            out.push(e?);
        }
        Ok(out)
    }
}

impl TimetableStore for SqliteStore {
    fn replace_recommended(
        &mut self,
        owner: StudentId,
        tables: &[NewTimetable],
    ) -> Result<Vec<Timetable>, StoreError> {
        let created_at = Utc::now();
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM timetable_lectures WHERE timetable_id IN
               (SELECT id FROM timetables WHERE owner_id = ?1 AND kind = ?2)",
            params![owner, RECOMMENDED],
        )?;
        let removed = tx.execute(
            "DELETE FROM timetables WHERE owner_id = ?1 AND kind = ?2",
            params![owner, RECOMMENDED],
        )?;

        let mut created = Vec::with_capacity(tables.len());
        for t in tables {
            tx.execute(
                "INSERT INTO timetables (owner_id, kind, title, year, semester, score, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    owner,
                    RECOMMENDED,
                    t.title,
                    t.year,
                    t.semester.to_string(),
                    t.score,
                    created_at
                ],
            )?;
            let id = tx.last_insert_rowid();
            for (position, lecture) in t.lectures.iter().enumerate() {
                tx.execute(
                    "INSERT INTO timetable_lectures (timetable_id, position, lecture_id) VALUES (?1, ?2, ?3)",
                    params![id, position as i64, lecture],
                )?;
            }
            created.push(Timetable {
                id,
                owner,
                title: t.title.clone(),
                year: t.year,
                semester: t.semester,
                lectures: t.lectures.clone(),
                score: t.score,
                created_at,
            });
        }
        tx.commit()?;
        debug!(owner, removed, created = created.len(), "recommended timetables replaced");
        Ok(created)
    }

    fn recommended_for(&self, owner: StudentId) -> Result<Vec<Timetable>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, year, semester, score, created_at FROM timetables
             WHERE owner_id = ?1 AND kind = ?2 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![owner, RECOMMENDED], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
                char_column(row, 3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, DateTime<Utc>>(5)?,
            ))
        })?;
        let mut headers = Vec::new();
        for r in rows {
            headers.push(r?);
        }

        let mut lectures: HashMap<i64, Vec<LectureId>> = HashMap::new();
        for (id, ..) in &headers {
            lectures.insert(*id, self.lectures_of_timetable(*id)?);
        }

        Ok(headers
            .into_iter()
            .map(|(id, title, year, semester, score, created_at)| Timetable {
                id,
                owner,
                title,
                year,
                semester,
                lectures: lectures.remove(&id).unwrap_or_default(),
                score,
                created_at,
            })
            .collect())
    }
}
