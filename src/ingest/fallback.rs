use crate::calendar::YearMonth;
use crate::model::*;

/// Demonstration records shown when no live source answers. Dates are
/// anchored to `month`, never to today.
pub fn records(month: YearMonth) -> Vec<OccupancyRecord> {
    // Every month has at least 28 days.
    let day = |d: u32| month.date(d).unwrap_or_else(|| month.first_day());
    vec![
        OccupancyRecord::new(1, day(1), day(10), Status::Occupied, "Long-term tenant (fallback)"),
        OccupancyRecord::new(1, day(15), day(20), Status::Booked, "Deposit received (fallback)"),
        OccupancyRecord::new(2, day(11), day(25), Status::Booked, "Deposit pending (fallback)"),
    ]
}
