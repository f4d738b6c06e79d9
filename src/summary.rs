use chrono::NaiveDate;

use crate::dates::DateWindow;
use crate::models::{AttendanceRecord, AttendanceStatus, AttendanceSummary};

/// Counts the records dated inside `[start, end]`. An inverted range matches nothing.
pub fn compute_summary(
    records: &[AttendanceRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> AttendanceSummary {
    let window = DateWindow::new(start, end);

    records
        .iter()
        .filter(|record| window.contains(record.date))
        .fold(AttendanceSummary::default(), |mut summary, record| {
            summary.total += 1;
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
            }
            summary
        })
}
