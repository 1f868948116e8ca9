use std::fmt::Write;

use crate::ingest::DataSource;
use crate::model::Indicator;
use crate::session::{MonthView, Phase, SessionSnapshot};

pub const LEGEND: &str = "T = occupied   B = booked   . = empty";

/// Plain-text calendar for a terminal. While loading, only the month label
/// is shown.
pub fn snapshot(snap: &SessionSnapshot) -> String {
    match (snap.phase, snap.view()) {
        (Phase::Ready, Some(view)) => month_view(view),
        _ => format!("{}\nLoading calendar data...\n", snap.label()),
    }
}

pub fn month_view(view: &MonthView) -> String {
    let mut out = String::new();
    let source = match view.source {
        DataSource::Live(strategy) => format!("live, {strategy}"),
        DataSource::Fallback => "fallback data".to_string(),
    };
    let _ = writeln!(out, "{} ({source})", view.label());
    let _ = writeln!(out, "{LEGEND}");
    out.push('\n');

    out.push_str("Room");
    for day in 1..=view.grid.days() {
        let _ = write!(out, "{day:>3}");
    }
    out.push('\n');

    for (room, cells) in view.grid.rows() {
        let _ = write!(out, "{room:>4}");
        for cell in cells {
            let _ = write!(out, "{:>3}", cell.indicator.symbol());
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "\n{} occupied, {} booked, {} empty cells",
        view.grid.count(Indicator::Filled),
        view.grid.count(Indicator::Reserved),
        view.grid.count(Indicator::Empty)
    );
    out
}

/// Record list and ingestion trace, for diagnosing what the sheet returned.
pub fn debug_panel(view: &MonthView, sheet_id: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Data loaded: {} records", view.records.len());
    let _ = writeln!(out, "Viewing month: {} ({})", view.month, view.label());
    let _ = writeln!(out, "Sheet ID: {sheet_id}");
    for r in &view.records {
        let _ = writeln!(
            out,
            "  Room {}: {} -> {} ({}) - {}",
            r.room_id, r.range.start, r.range.end, r.status, r.note
        );
    }
    out.push_str(&view.trace.summary());
    out
}
