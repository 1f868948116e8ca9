use chrono::NaiveDate;

use crate::model::*;

use super::error::RowRejection;

/// Loosely-typed values for the four required columns plus the note, as
/// pulled out of either upstream format.
#[derive(Debug, Default)]
pub(super) struct RawRow {
    pub room_id: RawRoomId,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Default)]
pub(super) enum RawRoomId {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl RawRow {
    /// Validate and convert. Every required field must be present and
    /// parseable. A present but blank status is kept and renders empty.
    ///
    /// Dates that only parse day-first add a note to `warnings`.
    pub fn into_record(self, row: usize, warnings: &mut Vec<String>) -> Result<OccupancyRecord, RowRejection> {
        let room_id = match self.room_id {
            RawRoomId::Missing => return Err(RowRejection::Missing("room_id")),
            RawRoomId::Number(n) => {
                room_id_from_number(n).ok_or_else(|| RowRejection::BadRoomId(n.to_string()))?
            }
            RawRoomId::Text(s) => room_id_from_text(&s).ok_or(RowRejection::BadRoomId(s))?,
        };
        let start = required_date(self.start_date, "start_date", row, warnings)?;
        let end = required_date(self.end_date, "end_date", row, warnings)?;
        let status = self.status.ok_or(RowRejection::Missing("status"))?;

        Ok(OccupancyRecord::new(
            room_id,
            start,
            end,
            Status::parse(&status),
            self.note.unwrap_or_default(),
        ))
    }
}

fn required_date(
    raw: Option<String>,
    field: &'static str,
    row: usize,
    warnings: &mut Vec<String>,
) -> Result<NaiveDate, RowRejection> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or(RowRejection::Missing(field))?;
    match read_date(&raw) {
        Some((date, DateOrder::DayFirst)) => {
            warnings.push(format!("row {row}: {field} {raw:?} read day-first as {date}"));
            Ok(date)
        }
        Some((date, _)) => Ok(date),
        None => Err(RowRejection::BadDate { field, value: raw }),
    }
}

pub(super) fn room_id_from_number(n: f64) -> Option<RoomId> {
    if n.is_finite() && n.fract() == 0.0 && n >= 1.0 && n <= RoomId::MAX as f64 {
        Some(n as RoomId)
    } else {
        None
    }
}

pub(super) fn room_id_from_text(s: &str) -> Option<RoomId> {
    let s = s.trim();
    match s.parse::<RoomId>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(_) => s.parse::<f64>().ok().and_then(room_id_from_number),
    }
}

/// Field order a date string was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DateOrder {
    YearFirst,
    MonthFirst,
    /// `DD/MM/YYYY`, only when month-first cannot parse.
    DayFirst,
}

/// Accepts `YYYY-MM-DD` (optionally followed by a time), `YYYY/MM/DD`,
/// `M/D/YYYY`, and the table endpoint's `Date(y,m,d)` literal whose month
/// is zero-based. `DD/MM/YYYY` is accepted only when the month-first
/// reading is impossible, e.g. `15/09/2025`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    read_date(raw).map(|(date, _)| date)
}

pub(super) fn read_date(raw: &str) -> Option<(NaiveDate, DateOrder)> {
    let s = raw.trim();
    if let Some(args) = s.strip_prefix("Date(").and_then(|r| r.strip_suffix(')')) {
        return parse_date_literal(args).map(|d| (d, DateOrder::YearFirst));
    }
    for (fmt, order) in [
        ("%Y-%m-%d", DateOrder::YearFirst),
        ("%Y/%m/%d", DateOrder::YearFirst),
        ("%m/%d/%Y", DateOrder::MonthFirst),
        ("%d/%m/%Y", DateOrder::DayFirst),
    ] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some((d, order));
        }
    }
    // "2025-09-01T00:00:00", "2025-09-01 08:00"
    let head = s.get(..10)?;
    match s.as_bytes().get(10) {
        Some(b'T') | Some(b' ') => NaiveDate::parse_from_str(head, "%Y-%m-%d")
            .ok()
            .map(|d| (d, DateOrder::YearFirst)),
        _ => None,
    }
}

fn parse_date_literal(args: &str) -> Option<NaiveDate> {
    let mut parts = args.split(',').map(|p| p.trim().parse::<i64>());
    let year = parts.next()?.ok()?;
    let month0 = parts.next()?.ok()?;
    let day = parts.next()?.ok()?;
    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month0 + 1).ok()?,
        u32::try_from(day).ok()?,
    )
}
