use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::OptionsError;
use crate::models::Weekday;

/// Keys every recommendation request must carry.
pub const REQUIRED_OPTIONS: [&str; 10] = [
	"year",
	"semester",
	"avoid_successive",
	"avoid_void",
	"avoid_first",
	"jeonpil",
	"jeonseon",
	"gyoyang",
	"credit",
	"blocks",
];

/// Flat option map as received from the request layer.
pub type RawOptions = Map<String, Value>;

/// Length of one forbidden cell of the timetable grid.
pub const BLOCK_CELL_MINUTES: u16 = 30;

/// Forbidden grid cells per weekday, Monday first. Each entry is the start
/// of a cell, in minutes since midnight; the cell covers
/// `[start, start + BLOCK_CELL_MINUTES)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Blocks {
	days: Vec<Vec<u16>>,
}

impl Blocks {
	/// Parses `"H:M,H:M|H:M|..."`: segment i lists the starts of the
	/// forbidden cells of weekday i. Empty segments (and an empty string)
	/// forbid nothing.
	pub fn parse(s: &str) -> Result<Self, OptionsError> {
		let s = s.trim();
		if s.is_empty() {
			return Ok(Blocks::default());
		}
		let segments: Vec<&str> = s.split('|').collect();
		if segments.len() > Weekday::ALL.len() {
			return Err(OptionsError::invalid(
				"blocks",
				format!("{} day segments, at most 7 allowed", segments.len()),
			));
		}
		let mut days = Vec::with_capacity(segments.len());
		for segment in segments {
			let segment = segment.trim();
			if segment.is_empty() {
				days.push(Vec::new());
				continue;
			}
			let mut times = Vec::new();
			for tok in segment.split(',') {
				times.push(parse_block_time(tok)?);
			}
			days.push(times);
		}
		Ok(Blocks { days })
	}

	pub fn for_day(&self, day: Weekday) -> &[u16] {
		self.days.get(day.index()).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn is_empty(&self) -> bool {
		self.days.iter().all(Vec::is_empty)
	}
}

fn parse_block_time(tok: &str) -> Result<u16, OptionsError> {
	let bad = || OptionsError::invalid("blocks", format!("bad time {:?}", tok));
	let (h, m) = tok.trim().split_once(':').ok_or_else(bad)?;
	let h = h.trim().parse::<u16>().map_err(|_| bad())?;
	let m = m.trim().parse::<u16>().map_err(|_| bad())?;
	if h > 23 || m > 59 {
		return Err(bad());
	}
	Ok(h * 60 + m)
}

/// Typed options of a recommendation request.
///
/// # Expected JSON
/// ```json
/// {
///   "year": "2024",
///   "semester": "1",
///   "avoid_successive": "true",
///   "avoid_void": "false",
///   "avoid_first": "true",
///   "jeonpil": "true",
///   "jeonseon": "true",
///   "gyoyang": "true",
///   "credit": "18",
///   "blocks": "9:00,9:30||||"
/// }
/// ```
/// Values may be strings (as form posts deliver them) or native JSON
/// numbers and booleans.
///
/// - `jeonpil` / `jeonseon` / `gyoyang`: allow major-required, major-elective
///   and general-education lectures respectively.
/// - `credit`: credit budget of a timetable.
/// - `blocks`: see [`Blocks::parse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendOptions {
	pub year: i32,
	pub semester: char,
	pub avoid_successive: bool,
	pub avoid_void: bool,
	pub avoid_first: bool,
	pub major_required: bool,
	pub major_elective: bool,
	pub general_education: bool,
	pub credit: u32,
	pub blocks: Blocks,
}

impl RecommendOptions {
	/// Validates presence of every required key, then coerces each value.
	/// Nothing is parsed unless all keys are present.
	pub fn parse(raw: &RawOptions) -> Result<Self, OptionsError> {
		let missing: Vec<String> = REQUIRED_OPTIONS
			.iter()
			.filter(|k| !raw.contains_key(**k))
			.map(|k| k.to_string())
			.collect();
		if !missing.is_empty() {
			return Err(OptionsError::MissingOptions { missing });
		}
		let get = |k: &str| field(raw, k);

		let year = as_int(get("year"), "year")?;
		let year = i32::try_from(year)
			.ok()
			.filter(|y| *y > 0)
			.ok_or_else(|| OptionsError::invalid("year", "must be a positive year"))?;

		let credit = as_int(get("credit"), "credit")?;
		let credit = u32::try_from(credit)
			.ok()
			.filter(|c| *c > 0)
			.ok_or_else(|| OptionsError::invalid("credit", "must be a positive integer"))?;

		let blocks = match get("blocks") {
			Value::String(s) => Blocks::parse(s)?,
			Value::Null => Blocks::default(),
			other => {
				let reason = format!("expected a string, got {}", other);
				return Err(OptionsError::invalid("blocks", reason));
			}
		};

		Ok(RecommendOptions {
			year,
			semester: as_semester(get("semester"))?,
			avoid_successive: as_flag(get("avoid_successive"), "avoid_successive")?,
			avoid_void: as_flag(get("avoid_void"), "avoid_void")?,
			avoid_first: as_flag(get("avoid_first"), "avoid_first")?,
			major_required: as_flag(get("jeonpil"), "jeonpil")?,
			major_elective: as_flag(get("jeonseon"), "jeonseon")?,
			general_education: as_flag(get("gyoyang"), "gyoyang")?,
			credit,
			blocks,
		})
	}

	/// Parses a JSON object body into options.
	pub fn from_json(json_str: &str) -> Result<Self, OptionsError> {
		let raw: RawOptions = serde_json::from_str(json_str)
			.map_err(|e| OptionsError::invalid("options", e.to_string()))?;
		Self::parse(&raw)
	}
}

// presence checked by the caller
fn field<'a>(raw: &'a RawOptions, key: &str) -> &'a Value {
	&raw[key]
}

fn as_int(v: &Value, field: &str) -> Result<i64, OptionsError> {
	match v {
		Value::Number(n) => n
			.as_i64()
			.ok_or_else(|| OptionsError::invalid(field, format!("{} is not an integer", n))),
		Value::String(s) => s
			.trim()
			.parse::<i64>()
			.map_err(|_| OptionsError::invalid(field, format!("{:?} is not an integer", s))),
		other => Err(OptionsError::invalid(field, format!("expected an integer, got {}", other))),
	}
}

fn as_flag(v: &Value, field: &str) -> Result<bool, OptionsError> {
	match v {
		Value::Bool(b) => Ok(*b),
		Value::Number(n) => match n.as_i64() {
			Some(0) => Ok(false),
			Some(1) => Ok(true),
			_ => Err(OptionsError::invalid(field, format!("{} is not 0 or 1", n))),
		},
		Value::String(s) => match s.trim().to_lowercase().as_str() {
			"true" | "1" | "yes" | "on" => Ok(true),
			"false" | "0" | "no" | "off" | "" => Ok(false),
			_ => Err(OptionsError::invalid(field, format!("{:?} is not a boolean", s))),
		},
		other => Err(OptionsError::invalid(field, format!("expected a boolean, got {}", other))),
	}
}

fn as_semester(v: &Value) -> Result<char, OptionsError> {
	let text = match v {
		Value::String(s) => s.trim().to_string(),
		Value::Number(n) => n.to_string(),
		other => {
			let reason = format!("expected a code, got {}", other);
			return Err(OptionsError::invalid("semester", reason));
		}
	};
	let mut chars = text.chars();
	match (chars.next(), chars.next()) {
		(Some(c), None) => Ok(c),
		_ => Err(OptionsError::invalid(
			"semester",
			format!("{:?} is not a single-character code", text),
		)),
	}
}
