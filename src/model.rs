use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Room number as it appears in the sheet's first column. Always >= 1.
pub type RoomId = u32;

/// Inclusive date range `[start, end]`.
///
/// An inverted range (`start > end`) is kept as-is and contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Occupancy state of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Occupied,
    Booked,
    /// Anything outside the recognized vocabulary, lower-cased. Rendered empty.
    Unrecognized(String),
}

impl Status {
    /// Parse sheet text. Accepts the English names and the sheet's
    /// Indonesian labels (`terisi`, `booking`).
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "occupied" | "terisi" => Status::Occupied,
            "booked" | "booking" => Status::Booked,
            _ => Status::Unrecognized(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Occupied => "occupied",
            Status::Booked => "booked",
            Status::Unrecognized(s) => s,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the occupancy sheet after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    pub room_id: RoomId,
    pub range: DateRange,
    pub status: Status,
    pub note: String,
}

impl OccupancyRecord {
    pub fn new(room_id: RoomId, start: NaiveDate, end: NaiveDate, status: Status, note: impl Into<String>) -> Self {
        Self {
            room_id,
            range: DateRange::new(start, end),
            status,
            note: note.into(),
        }
    }

    pub fn covers(&self, room_id: RoomId, date: NaiveDate) -> bool {
        self.room_id == room_id && self.range.contains(date)
    }
}

/// What a grid cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    Filled,
    Reserved,
    Empty,
}

impl Indicator {
    pub fn for_status(status: &Status) -> Self {
        match status {
            Status::Occupied => Indicator::Filled,
            Status::Booked => Indicator::Reserved,
            Status::Unrecognized(_) => Indicator::Empty,
        }
    }

    /// Single-character symbol used by the text renderer.
    pub fn symbol(&self) -> char {
        match self {
            Indicator::Filled => 'T',
            Indicator::Reserved => 'B',
            Indicator::Empty => '.',
        }
    }
}
