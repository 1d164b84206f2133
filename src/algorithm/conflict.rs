// Clock parsing and overlap checks between lectures and their time slots.
use crate::algorithm::pool::PoolLecture;
use crate::models::Weekday;

/// A slot ending less than this many minutes before another one starts on
/// the same day makes the two lectures "serial". Back-to-back slots count.
pub const SERIAL_GAP_MINUTES: u16 = 30;

/// Minutes since midnight of a zero-padded `HH:MM` string.
pub fn clock_to_minutes(t: &str) -> Option<u16> {
    let (hh, mm) = t.trim().split_once(':')?;
    if hh.is_empty() || mm.len() != 2 {
        return None;
    }
    let hh = hh.parse::<u16>().ok()?;
    let mm = mm.parse::<u16>().ok()?;
    if hh > 23 || mm > 59 {
        return None;
    }
    Some(hh * 60 + mm)
}

/// A time slot resolved to minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub day: Weekday,
    pub start: u16,
    pub end: u16,
}

impl Span {
    /// Half-open intersection on the same day.
    pub fn intersects(&self, other: &Span) -> bool {
        self.day == other.day && self.start < other.end && other.start < self.end
    }

    /// True if `self` ends on the same day less than the serial gap before
    /// `next` starts.
    pub fn closely_precedes(&self, next: &Span) -> bool {
        self.day == next.day
            && self.end <= next.start
            && next.start < self.end + SERIAL_GAP_MINUTES
    }
}

/// True if the two lectures cannot be taken together: same course, or any
/// pair of their slots intersect.
pub fn lectures_conflict(a: &PoolLecture, b: &PoolLecture) -> bool {
    if a.course.id == b.course.id {
        return true;
    }
    a.spans
        .iter()
        .any(|sa| b.spans.iter().any(|sb| sa.intersects(sb)))
}

/// True if any two lectures of the set conflict.
pub fn overlaps(lectures: &[&PoolLecture]) -> bool {
    for (i, a) in lectures.iter().enumerate() {
        for b in &lectures[i + 1..] {
            if lectures_conflict(a, b) {
                return true;
            }
        }
    }
    false
}

/// Directional check: some slot of `first` closely precedes a slot of `second`.
pub fn precedes_closely(first: &PoolLecture, second: &PoolLecture) -> bool {
    first
        .spans
        .iter()
        .any(|sa| second.spans.iter().any(|sb| sa.closely_precedes(sb)))
}

/// True if the lectures are scheduled back to back in either direction.
pub fn are_serial(a: &PoolLecture, b: &PoolLecture) -> bool {
    precedes_closely(a, b) || precedes_closely(b, a)
}
