use super::coerce::{RawRoomId, RawRow};
use super::error::RowRejection;
use super::Parsed;

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Parse a flat delimited export. The first line is a header and is
/// discarded; quoting characters are stripped, not interpreted.
pub(super) fn parse(body: &str) -> Parsed {
    let mut parsed = Parsed::default();
    for (i, line) in body.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        parsed.push(i, parse_line(line));
    }
    parsed
}

fn parse_line(line: &str) -> Result<RawRow, RowRejection> {
    let cols: Vec<String> = line
        .split(DELIMITER)
        .map(|c| c.replace(QUOTE, ""))
        .collect();
    if cols.len() < 4 {
        return Err(RowRejection::TooFewColumns(cols.len()));
    }
    let mut cols = cols.into_iter();
    let mut next = || cols.next().filter(|c| !c.trim().is_empty());

    let room_id = next().map_or(RawRoomId::Missing, RawRoomId::Text);
    Ok(RawRow {
        room_id,
        start_date: next(),
        end_date: next(),
        status: next(),
        note: next(),
    })
}
