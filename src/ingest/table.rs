use serde::Deserialize;
use serde_json::Value;

use super::coerce::{RawRoomId, RawRow};
use super::error::StrategyError;
use super::Parsed;

/// Callback the table endpoint wraps its JSON payload in.
const CALLBACK_MARKER: &str = "google.visualization.Query.setResponse(";

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<PayloadError>,
    #[serde(default)]
    table: Option<Table>,
}

#[derive(Debug, Deserialize)]
struct PayloadError {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    detailed_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Table {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    c: Option<Vec<Option<TableCell>>>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

/// Strip the callback envelope, returning the JSON text inside it.
/// A bare JSON object passes through unchanged.
pub(super) fn strip_envelope(text: &str) -> Result<&str, StrategyError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }
    let inner = if let Some(pos) = trimmed.find(CALLBACK_MARKER) {
        &trimmed[pos + CALLBACK_MARKER.len()..]
    } else if let Some(pos) = trimmed.find('(') {
        &trimmed[pos + 1..]
    } else {
        return Err(StrategyError::Envelope("no callback invocation found".into()));
    };
    let inner = inner.trim_end();
    let inner = inner.strip_suffix(';').unwrap_or(inner).trim_end();
    inner
        .strip_suffix(')')
        .ok_or_else(|| StrategyError::Envelope("unterminated callback invocation".into()))
}

/// Parse a structured-table response body.
pub(super) fn parse(body: &str) -> Result<Parsed, StrategyError> {
    let json = strip_envelope(body)?;
    let payload: Payload =
        serde_json::from_str(json).map_err(|e| StrategyError::Payload(e.to_string()))?;

    if payload.status.as_deref() == Some("error") {
        let detail = payload
            .errors
            .first()
            .and_then(|e| e.detailed_message.clone().or_else(|| e.reason.clone()))
            .unwrap_or_else(|| "unknown error".into());
        return Err(StrategyError::Payload(format!("upstream reported error: {detail}")));
    }

    let table = payload.table.ok_or(StrategyError::EmptyTable)?;
    if table.rows.is_empty() {
        return Err(StrategyError::EmptyTable);
    }

    let mut parsed = Parsed::default();
    for (i, row) in table.rows.into_iter().enumerate() {
        let cells = row.c.unwrap_or_default();
        parsed.push(i, Ok(raw_row(&cells)));
    }
    Ok(parsed)
}

fn raw_row(cells: &[Option<TableCell>]) -> RawRow {
    let value = |i: usize| cells.get(i).and_then(|c| c.as_ref()).map(|c| &c.v);

    let room_id = match value(0) {
        Some(Value::Number(n)) => n.as_f64().map_or(RawRoomId::Missing, RawRoomId::Number),
        Some(v) => text(v).map_or(RawRoomId::Missing, RawRoomId::Text),
        None => RawRoomId::Missing,
    };

    RawRow {
        room_id,
        start_date: value(1).and_then(text),
        end_date: value(2).and_then(text),
        status: value(3).and_then(text),
        note: value(4).and_then(text),
    }
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::error::RowRejection;
    use crate::model::{Indicator, Status};
    use chrono::NaiveDate;

    fn wrap(json: &str) -> String {
        format!("/*O_o*/\n{CALLBACK_MARKER}{json});")
    }

    #[test]
    fn strips_callback_envelope() {
        let body = wrap(r#"{"a":1}"#);
        assert_eq!(strip_envelope(&body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn strips_unknown_callback_name() {
        assert_eq!(strip_envelope(r#"cb({"a":1});"#).unwrap(), r#"{"a":1}"#);
        assert_eq!(strip_envelope("cb({\"a\":1})\n").unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn bare_json_passes_through() {
        assert_eq!(strip_envelope(r#" {"a":1} "#).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn envelope_errors() {
        assert!(matches!(strip_envelope("<html>nope</html>"), Err(StrategyError::Envelope(_))));
        assert!(matches!(strip_envelope("cb({\"a\":1}"), Err(StrategyError::Envelope(_))));
    }

    #[test]
    fn parses_rows_and_skips_incomplete() {
        let body = wrap(
            r#"{"version":"0.6","status":"ok","table":{"cols":[],"rows":[
                {"c":[{"v":1.0},{"v":"Date(2025,8,1)","f":"9/1/2025"},{"v":"2025-09-10"},{"v":"Terisi"},{"v":"Long stay"}]},
                {"c":[{"v":2.0},{"v":"2025-09-11"},{"v":"2025-09-25"},null,{"v":"no status"}]},
                {"c":[{"v":"3"},{"v":"2025-09-02"},{"v":"2025-09-04"},{"v":"booked"}]},
                {"c":null}
            ]}}"#,
        );
        let parsed = parse(&body).unwrap();
        assert_eq!(parsed.records.len(), 2);
        let first = &parsed.records[0];
        assert_eq!(first.room_id, 1);
        assert_eq!(first.range.start, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(first.status, Status::Occupied);
        assert_eq!(first.note, "Long stay");
        assert_eq!(parsed.records[1].room_id, 3);
        assert_eq!(parsed.records[1].note, "");

        assert_eq!(parsed.rejected.len(), 2);
        assert_eq!(parsed.rejected[0].row, 1);
        assert_eq!(parsed.rejected[0].reason, RowRejection::Missing("status"));
        assert_eq!(parsed.rejected[1].reason, RowRejection::Missing("room_id"));
    }

    #[test]
    fn empty_status_row_is_kept_and_wins_its_cells() {
        let body = wrap(
            r#"{"table":{"rows":[
                {"c":[{"v":1},{"v":"2025-09-01"},{"v":"2025-09-10"},{"v":""}]},
                {"c":[{"v":1},{"v":"2025-09-01"},{"v":"2025-09-10"},{"v":"occupied"}]}
            ]}}"#,
        );
        let parsed = parse(&body).unwrap();
        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.records[0].status, Status::Unrecognized(String::new()));

        let month = crate::calendar::YearMonth::new(2025, 8).unwrap();
        let grid = crate::grid::resolve(&parsed.records, month, 10);
        assert_eq!(grid.indicator(1, 5), Some(Indicator::Empty));
        assert_eq!(grid.cell(1, 5).unwrap().record, Some(0));
    }

    #[test]
    fn null_cell_value_counts_as_missing() {
        let body = wrap(
            r#"{"table":{"rows":[{"c":[{"v":1},{"v":null},{"v":"2025-09-10"},{"v":"booked"}]}]}}"#,
        );
        let parsed = parse(&body).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.rejected[0].reason, RowRejection::Missing("start_date"));
    }

    #[test]
    fn missing_or_empty_table() {
        assert_eq!(parse(&wrap(r#"{"status":"ok"}"#)).unwrap_err(), StrategyError::EmptyTable);
        assert_eq!(
            parse(&wrap(r#"{"table":{"rows":[]}}"#)).unwrap_err(),
            StrategyError::EmptyTable
        );
    }

    #[test]
    fn upstream_error_status() {
        let body = wrap(
            r#"{"status":"error","errors":[{"reason":"access_denied","detailed_message":"Sheet is private"}]}"#,
        );
        let err = parse(&body).unwrap_err();
        assert_eq!(err, StrategyError::Payload("upstream reported error: Sheet is private".into()));
    }

    #[test]
    fn malformed_json_is_payload_error() {
        assert!(matches!(parse(&wrap("{not json")), Err(StrategyError::Payload(_))));
    }
}
