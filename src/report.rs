use std::collections::HashSet;
use std::fmt::Write;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::alerts::AlertReport;
use crate::dates::DateWindow;
use crate::models::{
    AlertEntry, AttendanceRecord, AttendanceStatus, AttendanceSummary, GradeAttendance, PieSlice,
    RollCall, Student,
};

/// Present/absent counts per grade name, in the order grades are first seen.
pub fn group_by_grade(records: &[AttendanceRecord]) -> Vec<GradeAttendance> {
    let mut grades: Vec<GradeAttendance> = Vec::new();

    for record in records {
        let position = match grades
            .iter()
            .position(|grade| grade.grade_name == record.grade_name)
        {
            Some(position) => position,
            None => {
                grades.push(GradeAttendance {
                    grade_name: record.grade_name.clone(),
                    present: 0,
                    absent: 0,
                });
                grades.len() - 1
            }
        };

        match record.status {
            AttendanceStatus::Present => grades[position].present += 1,
            AttendanceStatus::Absent => grades[position].absent += 1,
        }
    }

    grades
}

/// Absent records only, most recent first.
pub fn absences_sorted_desc(records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
    let mut absences: Vec<AttendanceRecord> = records
        .iter()
        .filter(|record| record.is_absent())
        .cloned()
        .collect();
    absences.sort_by(|a, b| b.date.cmp(&a.date));
    absences
}

pub fn pie_data(summary: &AttendanceSummary) -> [PieSlice; 2] {
    [
        PieSlice {
            label: "Present",
            value: summary.present,
            color: "#10b981",
        },
        PieSlice {
            label: "Absent",
            value: summary.absent,
            color: "#ef4444",
        },
    ]
}

/// Compares a roster against the records taken on `date`. Records for other
/// days, or for students outside the roster, are ignored.
pub fn roll_call(date: NaiveDate, roster: &[Student], records: &[AttendanceRecord]) -> RollCall {
    let marked: HashSet<Uuid> = records
        .iter()
        .filter(|record| record.date == date)
        .map(|record| record.student_id)
        .collect();

    let unmarked: Vec<Student> = roster
        .iter()
        .filter(|student| !marked.contains(&student.id))
        .cloned()
        .collect();

    RollCall {
        date,
        recorded: roster.len() - unmarked.len(),
        total: roster.len(),
        unmarked,
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

pub fn build_report(
    window: DateWindow,
    summary: &AttendanceSummary,
    records: &[AttendanceRecord],
    alerts: &AlertReport,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(output, "Period {} to {}", window.start, window.end);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Records: {}", summary.total);
    for slice in pie_data(summary) {
        let _ = writeln!(
            output,
            "- {}: {} ({:.1}%)",
            slice.label,
            slice.value,
            percentage(slice.value, summary.total)
        );
    }

    let grades = group_by_grade(records);
    let _ = writeln!(output);
    let _ = writeln!(output, "## By Grade");

    if grades.is_empty() {
        let _ = writeln!(output, "No attendance recorded for this period.");
    } else {
        let _ = writeln!(output, "| Grade | Present | Absent |");
        let _ = writeln!(output, "|---|---|---|");
        for grade in grades.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                grade.grade_name, grade.present, grade.absent
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Weekly Alerts ({} to {})",
        alerts.week.start, alerts.week.end
    );
    write_alerts(&mut output, &alerts.weekly);

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Monthly Alerts ({} to {})",
        alerts.month.start, alerts.month.end
    );
    write_alerts(&mut output, &alerts.monthly);

    let absences = absences_sorted_desc(records);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Absences");

    if absences.is_empty() {
        let _ = writeln!(output, "No absences recorded for this period.");
    } else {
        for record in absences.iter().take(10) {
            match record.notes.as_deref() {
                Some(notes) if !notes.is_empty() => {
                    let _ = writeln!(
                        output,
                        "- {} ({}) on {}: {}",
                        record.student_name, record.grade_name, record.date, notes
                    );
                }
                _ => {
                    let _ = writeln!(
                        output,
                        "- {} ({}) on {}",
                        record.student_name, record.grade_name, record.date
                    );
                }
            }
        }
    }

    output
}

fn write_alerts(output: &mut String, entries: &[AlertEntry]) {
    if entries.is_empty() {
        let _ = writeln!(output, "No students flagged.");
        return;
    }

    for entry in entries {
        let _ = writeln!(
            output,
            "- {} ({}): {}",
            entry.student_name, entry.grade_name, entry.reason
        );
    }
}
