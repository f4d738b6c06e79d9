use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::dates::{self, DateWindow};
use crate::models::{AlertEntry, AttendanceRecord, WindowKind};

pub const WEEKLY_THRESHOLD: usize = 2;
pub const MONTHLY_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    pub today: NaiveDate,
    pub week: DateWindow,
    pub month: DateWindow,
    pub weekly: Vec<AlertEntry>,
    pub monthly: Vec<AlertEntry>,
}

struct StudentAbsences<'a> {
    record: &'a AttendanceRecord,
    week: usize,
    month: usize,
}

/// Flags students with recurring absences in the week and month containing `today`.
///
/// Only absent records are considered. A single absence can count toward both
/// windows. Each list is ordered by descending count; students with equal
/// counts keep the order in which they first appear in `records`.
pub fn compute_alerts(records: &[AttendanceRecord], today: NaiveDate) -> AlertReport {
    let week = dates::week_window(today);
    let month = dates::month_window(today);
    tracing::debug!(%today, week_start = %week.start, week_end = %week.end, month_start = %month.start, month_end = %month.end, records = records.len(), "computing attendance alerts");

    let mut order: Vec<StudentAbsences> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for record in records.iter().filter(|record| record.is_absent()) {
        let slot = *index.entry(record.student_id).or_insert_with(|| {
            order.push(StudentAbsences {
                record,
                week: 0,
                month: 0,
            });
            order.len() - 1
        });

        let entry = &mut order[slot];
        if week.contains(record.date) {
            entry.week += 1;
        }
        if month.contains(record.date) {
            entry.month += 1;
        }
    }

    let weekly = collect(&order, WindowKind::Weekly, |absences| absences.week);
    let monthly = collect(&order, WindowKind::Monthly, |absences| absences.month);
    tracing::debug!(weekly = weekly.len(), monthly = monthly.len(), "alerts computed");

    AlertReport {
        today,
        week,
        month,
        weekly,
        monthly,
    }
}

fn collect(
    absences: &[StudentAbsences],
    window: WindowKind,
    count_of: impl Fn(&StudentAbsences) -> usize,
) -> Vec<AlertEntry> {
    let threshold = match window {
        WindowKind::Weekly => WEEKLY_THRESHOLD,
        WindowKind::Monthly => MONTHLY_THRESHOLD,
    };

    let mut entries: Vec<AlertEntry> = absences
        .iter()
        .filter(|student| count_of(student) >= threshold)
        .map(|student| {
            let count = count_of(student);
            AlertEntry {
                student_id: student.record.student_id,
                student_name: student.record.student_name.clone(),
                grade_name: student.record.grade_name.clone(),
                absence_count: count,
                window,
                reason: reason(window, count),
            }
        })
        .collect();

    // sort_by is stable, so ties keep encounter order.
    entries.sort_by(|a, b| b.absence_count.cmp(&a.absence_count));
    entries
}

pub fn reason(window: WindowKind, count: usize) -> String {
    match window {
        WindowKind::Weekly => format!("{count} absences this week"),
        WindowKind::Monthly => format!("{count} absences this month"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{absent, date, present};

    // 2024-01-10 is a Wednesday; its week is 2024-01-08..=2024-01-14.
    fn wednesday() -> NaiveDate {
        date(2024, 1, 10)
    }

    #[test]
    fn two_absences_this_week_raise_a_weekly_alert() {
        let ana = Uuid::new_v4();
        let records = vec![
            absent(ana, "Ana", date(2024, 1, 8)),
            absent(ana, "Ana", date(2024, 1, 9)),
        ];

        let report = compute_alerts(&records, wednesday());
        assert_eq!(report.weekly.len(), 1);
        assert_eq!(report.weekly[0].student_id, ana);
        assert_eq!(report.weekly[0].absence_count, 2);
        assert_eq!(report.weekly[0].window, WindowKind::Weekly);
        assert_eq!(report.weekly[0].reason, "2 absences this week");
        assert!(report.monthly.is_empty());
    }

    #[test]
    fn one_absence_this_week_is_not_flagged() {
        let ana = Uuid::new_v4();
        let records = vec![absent(ana, "Ana", date(2024, 1, 8))];

        let report = compute_alerts(&records, wednesday());
        assert!(report.weekly.is_empty());
        assert!(report.monthly.is_empty());
    }

    #[test]
    fn present_records_are_ignored() {
        let ana = Uuid::new_v4();
        let records = vec![
            present(ana, "Ana", date(2024, 1, 8)),
            present(ana, "Ana", date(2024, 1, 9)),
            absent(ana, "Ana", date(2024, 1, 10)),
        ];

        let report = compute_alerts(&records, wednesday());
        assert!(report.weekly.is_empty());
    }

    #[test]
    fn three_absences_this_month_raise_a_monthly_alert() {
        let ben = Uuid::new_v4();
        let records = vec![
            absent(ben, "Ben", date(2024, 1, 1)),
            absent(ben, "Ben", date(2024, 1, 10)),
            absent(ben, "Ben", date(2024, 1, 20)),
        ];

        // 2024-01-25 is a Thursday; its week starts 2024-01-22.
        let report = compute_alerts(&records, date(2024, 1, 25));
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.monthly[0].absence_count, 3);
        assert_eq!(report.monthly[0].reason, "3 absences this month");
        assert!(report.weekly.is_empty());
    }

    #[test]
    fn absences_can_count_toward_both_windows() {
        let ben = Uuid::new_v4();
        let records = vec![
            absent(ben, "Ben", date(2024, 1, 2)),
            absent(ben, "Ben", date(2024, 1, 22)),
            absent(ben, "Ben", date(2024, 1, 23)),
        ];

        let report = compute_alerts(&records, date(2024, 1, 25));
        assert_eq!(report.weekly.len(), 1);
        assert_eq!(report.weekly[0].absence_count, 2);
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.monthly[0].absence_count, 3);
    }

    #[test]
    fn monthly_only_when_week_count_is_below_threshold() {
        let ben = Uuid::new_v4();
        let records = vec![
            absent(ben, "Ben", date(2024, 1, 2)),
            absent(ben, "Ben", date(2024, 1, 3)),
            absent(ben, "Ben", date(2024, 1, 4)),
            absent(ben, "Ben", date(2024, 1, 23)),
        ];

        let report = compute_alerts(&records, date(2024, 1, 25));
        assert!(report.weekly.is_empty());
        assert_eq!(report.monthly[0].absence_count, 4);
    }

    #[test]
    fn week_boundary_days_are_included() {
        let ana = Uuid::new_v4();
        let records = vec![
            absent(ana, "Ana", date(2024, 1, 7)),
            absent(ana, "Ana", date(2024, 1, 8)),
            absent(ana, "Ana", date(2024, 1, 14)),
            absent(ana, "Ana", date(2024, 1, 15)),
        ];

        let report = compute_alerts(&records, wednesday());
        assert_eq!(report.weekly[0].absence_count, 2);
    }

    #[test]
    fn no_look_back_when_today_starts_the_period() {
        let ana = Uuid::new_v4();
        let records = vec![
            absent(ana, "Ana", date(2024, 1, 30)),
            absent(ana, "Ana", date(2024, 1, 31)),
            absent(ana, "Ana", date(2024, 1, 29)),
            absent(ana, "Ana", date(2024, 2, 1)),
        ];

        // 2024-02-01 is a Thursday; its week reaches back into January
        // but its month does not.
        let report = compute_alerts(&records, date(2024, 2, 1));
        assert_eq!(report.weekly[0].absence_count, 4);
        assert!(report.monthly.is_empty());
        assert_eq!(report.month.start, date(2024, 2, 1));
    }

    #[test]
    fn absences_outside_the_month_are_not_counted() {
        let ana = Uuid::new_v4();
        let records = vec![
            absent(ana, "Ana", date(2023, 12, 20)),
            absent(ana, "Ana", date(2023, 12, 21)),
            absent(ana, "Ana", date(2024, 1, 3)),
        ];

        let report = compute_alerts(&records, wednesday());
        assert!(report.monthly.is_empty());
    }

    #[test]
    fn sorted_by_count_with_encounter_order_on_ties() {
        let ana = Uuid::new_v4();
        let ben = Uuid::new_v4();
        let cleo = Uuid::new_v4();
        let records = vec![
            absent(ana, "Ana", date(2024, 1, 8)),
            absent(ben, "Ben", date(2024, 1, 8)),
            absent(cleo, "Cleo", date(2024, 1, 8)),
            absent(ana, "Ana", date(2024, 1, 9)),
            absent(ben, "Ben", date(2024, 1, 9)),
            absent(cleo, "Cleo", date(2024, 1, 9)),
            absent(cleo, "Cleo", date(2024, 1, 10)),
        ];

        let report = compute_alerts(&records, wednesday());
        let names: Vec<&str> = report
            .weekly
            .iter()
            .map(|entry| entry.student_name.as_str())
            .collect();
        assert_eq!(names, vec!["Cleo", "Ana", "Ben"]);
        assert_eq!(report.weekly[0].reason, "3 absences this week");
    }

    #[test]
    fn monthly_ties_keep_encounter_order() {
        let ana = Uuid::new_v4();
        let ben = Uuid::new_v4();
        let cleo = Uuid::new_v4();
        let dan = Uuid::new_v4();
        let records = vec![
            absent(ben, "Ben", date(2024, 1, 2)),
            absent(ana, "Ana", date(2024, 1, 3)),
            absent(dan, "Dan", date(2024, 1, 3)),
            absent(cleo, "Cleo", date(2024, 1, 4)),
            absent(ana, "Ana", date(2024, 1, 9)),
            absent(cleo, "Cleo", date(2024, 1, 9)),
            absent(ben, "Ben", date(2024, 1, 10)),
            absent(dan, "Dan", date(2024, 1, 11)),
            absent(cleo, "Cleo", date(2024, 1, 16)),
            absent(ben, "Ben", date(2024, 1, 17)),
            absent(ana, "Ana", date(2024, 1, 17)),
            absent(dan, "Dan", date(2024, 1, 18)),
            absent(dan, "Dan", date(2024, 1, 19)),
        ];

        // 2024-01-25 is a Thursday; none of the absences fall in its week.
        let report = compute_alerts(&records, date(2024, 1, 25));
        assert!(report.weekly.is_empty());
        let ranked: Vec<(&str, usize)> = report
            .monthly
            .iter()
            .map(|entry| (entry.student_name.as_str(), entry.absence_count))
            .collect();
        assert_eq!(
            ranked,
            vec![("Dan", 4), ("Ben", 3), ("Ana", 3), ("Cleo", 3)]
        );
    }

    #[test]
    fn empty_input_yields_no_alerts() {
        let report = compute_alerts(&[], wednesday());
        assert!(report.weekly.is_empty());
        assert!(report.monthly.is_empty());
        assert_eq!(report.week.start, date(2024, 1, 8));
        assert_eq!(report.week.end, date(2024, 1, 14));
    }

    #[test]
    fn recomputes_from_current_input() {
        let ana = Uuid::new_v4();
        let mut records = vec![
            absent(ana, "Ana", date(2024, 1, 8)),
            absent(ana, "Ana", date(2024, 1, 9)),
        ];
        assert_eq!(compute_alerts(&records, wednesday()).weekly.len(), 1);

        records.pop();
        assert!(compute_alerts(&records, wednesday()).weekly.is_empty());
    }
}
