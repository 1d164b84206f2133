// Core data: catalog entries, students and generated timetables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub type CourseId = i64;
pub type LectureId = i64;
pub type StudentId = i64;
pub type TimetableId = i64;

/// Day of a time slot. Accepts English names and the single-character
/// Korean forms used by the catalog exports (`월`, `화`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Monday is 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        let day = match token.as_str() {
            "mon" | "monday" | "월" => Weekday::Mon,
            "tue" | "tuesday" | "화" => Weekday::Tue,
            "wed" | "wednesday" | "수" => Weekday::Wed,
            "thu" | "thursday" | "목" => Weekday::Thu,
            "fri" | "friday" | "금" => Weekday::Fri,
            "sat" | "saturday" | "토" => Weekday::Sat,
            "sun" | "sunday" | "일" => Weekday::Sun,
            _ => return Err(format!("unknown day of week {:?}", s)),
        };
        Ok(day)
    }
}

impl TryFrom<String> for Weekday {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Weekday> for String {
    fn from(day: Weekday) -> Self {
        day.as_str().to_string()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category tag of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    #[serde(alias = "전필")]
    MajorRequired,
    #[serde(alias = "전선")]
    MajorElective,
    #[serde(alias = "교양")]
    GeneralEducation,
    #[serde(other)]
    Other,
}

impl CourseType {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseType::MajorRequired => "major_required",
            CourseType::MajorElective => "major_elective",
            CourseType::GeneralEducation => "general_education",
            CourseType::Other => "other",
        }
    }

    /// Lenient tag lookup used when reading rows back from storage.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "major_required" | "전필" => CourseType::MajorRequired,
            "major_elective" | "전선" => CourseType::MajorElective,
            "general_education" | "교양" => CourseType::GeneralEducation,
            _ => CourseType::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub grade: u8,
    pub college: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub not_recommends: BTreeSet<CourseId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub course_type: CourseType,
    #[serde(default)]
    pub field: Option<String>,
    pub grade: u8,
    pub credit: u32,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
}

/// `start_time`/`end_time` are zero-padded `HH:MM` strings as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day_of_week: Weekday,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub classroom: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: LectureId,
    pub course: CourseId,
    pub year: i32,
    pub semester: char,
    pub number: String,
    pub instructor: String,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub author: StudentId,
    pub lecture: LectureId,
    pub rate: u8,
    #[serde(default)]
    pub comment: String,
}

/// A recommendation ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTimetable {
    pub title: String,
    pub year: i32,
    pub semester: char,
    pub lectures: Vec<LectureId>,
    pub score: f64,
}

/// A persisted recommended timetable owned by a student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timetable {
    pub id: TimetableId,
    pub owner: StudentId,
    pub title: String,
    pub year: i32,
    pub semester: char,
    pub lectures: Vec<LectureId>,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}
