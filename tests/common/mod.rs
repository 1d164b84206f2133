#![allow(dead_code)]

use serde_json::{Value, json};
use ttrec::algorithm::conflict::clock_to_minutes;
use ttrec::{Lecture, RawOptions, Snapshot, SqliteStore, Student};

pub fn raw_options(credit: u32) -> RawOptions {
    options_from(json!({
        "year": 2024,
        "semester": "1",
        "avoid_successive": false,
        "avoid_void": false,
        "avoid_first": false,
        "jeonpil": true,
        "jeonseon": true,
        "gyoyang": true,
        "credit": credit,
        "blocks": ""
    }))
}

pub fn options_from(v: Value) -> RawOptions {
    v.as_object().cloned().expect("options must be a JSON object")
}

pub fn store_with(snapshot: &Snapshot) -> SqliteStore {
    let mut store = SqliteStore::open_in_memory().expect("in-memory sqlite");
    store.import_snapshot(snapshot).expect("import snapshot");
    store
}

pub fn student(store: &SqliteStore, id: i64) -> Student {
    store.student(id).expect("query student").expect("student exists")
}

/// Twelve courses, two sections each, spread over the week. Sections of the
/// same course never share a time so there is plenty to choose from.
pub fn campus() -> Snapshot {
    let types = ["major_required", "major_elective", "general_education", "other"];
    let days = ["mon", "tue", "wed", "thu", "fri"];
    let starts = ["09:00", "10:30", "12:00", "13:30", "15:00", "16:30"];

    let mut courses = Vec::new();
    let mut lectures = Vec::new();
    let mut evaluations = Vec::new();
    for c in 0..12usize {
        let id = c as i64 + 1;
        let department = if c % 3 == 0 { "CSE" } else { "MATH" };
        let major: Option<&str> = if c % 2 == 0 { Some("CS") } else { None };
        courses.push(json!({
            "id": id,
            "code": format!("CSE{:03}", 100 + c),
            "name": format!("Course {}", id),
            "type": types[c % types.len()],
            "grade": 1 + (c % 4),
            "credit": 2 + (c % 2),
            "department": department,
            "major": major
        }));
        for s in 0..2usize {
            let lecture_id = id * 10 + s as i64;
            let k = c * 2 + s;
            let start = starts[k % starts.len()];
            let (h, m) = start.split_once(':').unwrap();
            let end_min = h.parse::<u32>().unwrap() * 60 + m.parse::<u32>().unwrap() + 75;
            let end = format!("{:02}:{:02}", end_min / 60, end_min % 60);
            lectures.push(json!({
                "id": lecture_id,
                "course": id,
                "year": 2024,
                "semester": "1",
                "number": format!("{:03}", s + 1),
                "instructor": format!("Prof {}", k),
                "time_slots": [
                    {"day_of_week": days[k % days.len()], "start_time": start, "end_time": end},
                    {"day_of_week": days[(k + 2) % days.len()], "start_time": start, "end_time": end}
                ]
            }));
            if k % 3 != 0 {
                let rate = 1 + (k % 5);
                evaluations.push(json!({"author": 900, "lecture": lecture_id, "rate": rate}));
            }
        }
    }

    let snapshot = json!({
        "courses": courses,
        "lectures": lectures,
        "evaluations": evaluations,
        "students": [
            {"id": 1, "grade": 2, "college": "Engineering", "department": "CSE", "major": "CS"},
            {"id": 2, "grade": 3, "college": "Science", "department": "MATH", "not_recommends": [1, 2]}
        ]
    });
    serde_json::from_value(snapshot).expect("valid snapshot")
}

/// True if two lectures share a course or overlap on some day.
pub fn clash(a: &Lecture, b: &Lecture) -> bool {
    if a.course == b.course {
        return true;
    }
    a.time_slots.iter().any(|x| {
        b.time_slots.iter().any(|y| {
            let xs = clock_to_minutes(&x.start_time).unwrap();
            let xe = clock_to_minutes(&x.end_time).unwrap();
            let ys = clock_to_minutes(&y.start_time).unwrap();
            let ye = clock_to_minutes(&y.end_time).unwrap();
            x.day_of_week == y.day_of_week && xs < ye && ys < xe
        })
    })
}
