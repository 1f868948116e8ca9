use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::YearMonth;
use crate::model::*;

// ── Grid Resolver ─────────────────────────────────────────────────

/// One resolved (room, day) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub date: NaiveDate,
    pub indicator: Indicator,
    /// Index into the record slice the grid was resolved from.
    pub record: Option<usize>,
}

/// Room × day matrix for one month. Rows are rooms `1..=rooms`, columns are
/// days `1..=days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    month: YearMonth,
    rooms: u32,
    days: u32,
    cells: Vec<Cell>,
}

/// Resolve every (room, day) cell of `month` against `records`.
///
/// The first record in slice order covering a cell wins; later overlapping
/// records are ignored for that cell.
pub fn resolve(records: &[OccupancyRecord], month: YearMonth, rooms: u32) -> Grid {
    let days = month.days();
    let mut cells = Vec::with_capacity((rooms as usize).saturating_mul(days as usize));

    for room in 1..=rooms {
        // Narrow to this room's records once, keeping ingestion order.
        let candidates: Vec<(usize, &OccupancyRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.room_id == room)
            .collect();

        for day in 1..=days {
            let Some(date) = month.date(day) else { continue };
            let hit = candidates.iter().find(|(_, r)| r.range.contains(date));
            let cell = match hit {
                Some((idx, r)) => Cell {
                    date,
                    indicator: Indicator::for_status(&r.status),
                    record: Some(*idx),
                },
                None => Cell {
                    date,
                    indicator: Indicator::Empty,
                    record: None,
                },
            };
            cells.push(cell);
        }
    }

    Grid {
        month,
        rooms,
        days,
        cells,
    }
}

impl Grid {
    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn rooms(&self) -> u32 {
        self.rooms
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell for `room` (1-based) on `day` (1-based).
    pub fn cell(&self, room: RoomId, day: u32) -> Option<&Cell> {
        if room == 0 || room > self.rooms || day == 0 || day > self.days {
            return None;
        }
        let idx = (room - 1) as usize * self.days as usize + (day - 1) as usize;
        self.cells.get(idx)
    }

    pub fn indicator(&self, room: RoomId, day: u32) -> Option<Indicator> {
        self.cell(room, day).map(|c| c.indicator)
    }

    /// Rows in room order, each paired with its room number.
    pub fn rows(&self) -> impl Iterator<Item = (RoomId, &[Cell])> {
        let days = self.days.max(1) as usize;
        self.cells
            .chunks(days)
            .enumerate()
            .map(|(i, row)| (i as RoomId + 1, row))
    }

    pub fn count(&self, indicator: Indicator) -> usize {
        self.cells.iter().filter(|c| c.indicator == indicator).count()
    }

    /// Hover text for a cell: the matched record's note and status, or the
    /// empty date.
    pub fn describe(&self, records: &[OccupancyRecord], room: RoomId, day: u32) -> Option<String> {
        let cell = self.cell(room, day)?;
        let text = match cell.record.and_then(|i| records.get(i)) {
            Some(r) if r.note.is_empty() => format!("No notes ({})", r.status),
            Some(r) => format!("{} ({})", r.note, r.status),
            None => format!("Empty - {}", cell.date.format("%d/%m/%Y")),
        };
        Some(text)
    }
}
