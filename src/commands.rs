use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use crate::alerts::{self, AlertReport};
use crate::dates::{self, DateWindow};
use crate::db::{self, GradeUpdate, NewGrade, StudentUpdate};
use crate::models::{AttendanceRecord, AttendanceUpdate, Grade, NewAttendance, RollCall, Student};
use crate::report;
use crate::summary;
use crate::{AttendanceCommand, EntryArgs, GradeCommand, RangeArgs, StudentCommand};

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        if self.json {
            let rendered = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
            println!("{rendered}");
        } else {
            text();
        }
        Ok(())
    }
}

fn window_for(range: &RangeArgs) -> anyhow::Result<DateWindow> {
    let today = range.today.unwrap_or_else(dates::today);
    let window = dates::resolve_window(range.start, range.end, range.range, today)?;
    Ok(window)
}

fn print_grade(grade: &Grade) {
    println!(
        "{}  {:<6} {:<16} order {}{}",
        grade.id,
        grade.code,
        grade.name,
        grade.display_order,
        grade
            .description
            .as_deref()
            .map(|description| format!("  {description}"))
            .unwrap_or_default()
    );
}

fn print_student(student: &Student) {
    let state = if student.active { "" } else { "  (inactive)" };
    println!(
        "{}  {:<24} {}{}",
        student.id, student.full_name, student.grade_name, state
    );
}

fn print_record(record: &AttendanceRecord) {
    println!(
        "{}  {}  {:<24} {:<14} {:<7}{}",
        record.id,
        record.date,
        record.student_name,
        record.grade_name,
        record.status,
        record
            .notes
            .as_deref()
            .map(|notes| format!("  {notes}"))
            .unwrap_or_default()
    );
}

fn print_records(records: &[AttendanceRecord], empty: &str) {
    if records.is_empty() {
        println!("{empty}");
    }
    for record in records {
        print_record(record);
    }
}

fn print_roll_call(progress: &RollCall) {
    println!(
        "Recorded {} of {} ({:.1}%) on {}.",
        progress.recorded,
        progress.total,
        progress.percent(),
        progress.date
    );
    if progress.is_complete() {
        return;
    }
    println!("Not yet marked:");
    for student in progress.unmarked.iter() {
        print_student(student);
    }
}

pub async fn grade(pool: &PgPool, out: Output, command: GradeCommand) -> anyhow::Result<()> {
    match command {
        GradeCommand::List => {
            let grades = db::list_grades(pool).await?;
            out.emit(&grades, || {
                if grades.is_empty() {
                    println!("No grades defined.");
                }
                grades.iter().for_each(print_grade);
            })
        }
        GradeCommand::Show { id } => {
            let grade = db::get_grade(pool, id).await?;
            out.emit(&grade, || print_grade(&grade))
        }
        GradeCommand::Add {
            code,
            name,
            order,
            description,
        } => {
            let grade = db::create_grade(
                pool,
                &NewGrade {
                    code,
                    name,
                    display_order: order,
                    description,
                },
            )
            .await?;
            out.emit(&grade, || print_grade(&grade))
        }
        GradeCommand::Update {
            id,
            code,
            name,
            order,
            description,
            clear_description,
            active,
        } => {
            let update = GradeUpdate {
                code,
                name,
                display_order: order,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                active,
            };
            let grade = db::update_grade(pool, id, &update).await?;
            out.emit(&grade, || print_grade(&grade))
        }
        GradeCommand::Remove { id } => {
            db::deactivate_grade(pool, id).await?;
            println!("Grade {id} deactivated.");
            Ok(())
        }
    }
}

pub async fn student(pool: &PgPool, out: Output, command: StudentCommand) -> anyhow::Result<()> {
    match command {
        StudentCommand::List { grade } => {
            let students = match grade {
                Some(grade_id) => db::list_students_by_grade(pool, grade_id).await?,
                None => db::list_students(pool).await?,
            };
            out.emit(&students, || {
                if students.is_empty() {
                    println!("No students found.");
                }
                students.iter().for_each(print_student);
            })
        }
        StudentCommand::Show { id } => {
            let student = db::get_student(pool, id).await?;
            out.emit(&student, || print_student(&student))
        }
        StudentCommand::Add { name, grade } => {
            let student = db::create_student(pool, &name, grade).await?;
            out.emit(&student, || print_student(&student))
        }
        StudentCommand::Update {
            id,
            name,
            grade,
            active,
        } => {
            let update = StudentUpdate {
                full_name: name,
                grade_id: grade,
                active,
            };
            let student = db::update_student(pool, id, &update).await?;
            out.emit(&student, || print_student(&student))
        }
        StudentCommand::Remove { id } => {
            db::deactivate_student(pool, id).await?;
            println!("Student {id} deactivated.");
            Ok(())
        }
    }
}

fn new_attendance(entry: EntryArgs) -> NewAttendance {
    NewAttendance {
        student_id: entry.student,
        date: entry.date,
        status: entry.status,
        notes: entry.notes,
    }
}

pub async fn attendance(
    pool: &PgPool,
    out: Output,
    command: AttendanceCommand,
) -> anyhow::Result<()> {
    match command {
        AttendanceCommand::Day { date } => {
            let records = db::fetch_by_date(pool, date).await?;
            out.emit(&records, || {
                print_records(&records, &format!("No attendance taken on {date}."))
            })
        }
        AttendanceCommand::Progress { date, grade } => {
            let roster = match grade {
                Some(grade_id) => db::list_students_by_grade(pool, grade_id).await?,
                None => db::list_students(pool).await?,
            };
            let records = db::fetch_by_date(pool, date).await?;
            let progress = report::roll_call(date, &roster, &records);
            out.emit(&progress, || print_roll_call(&progress))
        }
        AttendanceCommand::Student { id, start, end } => {
            let window = match (start, end) {
                (Some(start), Some(end)) => Some(DateWindow::new(start, end)),
                _ => None,
            };
            let records = db::fetch_by_student(pool, id, window).await?;
            out.emit(&records, || {
                print_records(&records, "No attendance recorded for this student.")
            })
        }
        AttendanceCommand::Record(entry) => {
            let record = db::create_attendance(pool, &new_attendance(entry)).await?;
            out.emit(&record, || print_record(&record))
        }
        AttendanceCommand::Mark(entry) => {
            let record = db::upsert_attendance(pool, &new_attendance(entry)).await?;
            out.emit(&record, || print_record(&record))
        }
        AttendanceCommand::Update {
            id,
            status,
            notes,
            clear_notes,
        } => {
            let update = AttendanceUpdate {
                status,
                notes: if clear_notes { Some(None) } else { notes.map(Some) },
            };
            let record = db::update_attendance(pool, id, &update).await?;
            out.emit(&record, || print_record(&record))
        }
        AttendanceCommand::Delete { id } => {
            db::delete_attendance(pool, id).await?;
            println!("Attendance record {id} deleted.");
            Ok(())
        }
    }
}

pub async fn stats(pool: &PgPool, out: Output) -> anyhow::Result<()> {
    let stats = db::fetch_stats(pool).await?;
    out.emit(&stats, || {
        println!("Students: {} ({} active)", stats.total_students, stats.active_students);
        println!("Grades:   {}", stats.total_grades);
    })
}

pub async fn summary(pool: &PgPool, out: Output, range: &RangeArgs) -> anyhow::Result<()> {
    let window = window_for(range)?;
    let summary = db::fetch_summary(pool, window).await?;

    out.emit(&summary, || {
        println!("Attendance from {} to {}:", window.start, window.end);
        println!("- Records: {}", summary.total);
        for slice in report::pie_data(&summary) {
            println!("- {}: {}", slice.label, slice.value);
        }
    })
}

/// Both windows can reach outside each other (a week may start in the
/// previous month), so fetch their union.
fn alert_fetch_window(today: NaiveDate) -> DateWindow {
    let week = dates::week_window(today);
    let month = dates::month_window(today);
    DateWindow::new(week.start.min(month.start), week.end.max(month.end))
}

fn print_alerts(report: &AlertReport) {
    println!(
        "Weekly alerts ({} to {}):",
        report.week.start, report.week.end
    );
    if report.weekly.is_empty() {
        println!("  none");
    }
    for entry in report.weekly.iter() {
        println!("- {} ({}): {}", entry.student_name, entry.grade_name, entry.reason);
    }

    println!(
        "Monthly alerts ({} to {}):",
        report.month.start, report.month.end
    );
    if report.monthly.is_empty() {
        println!("  none");
    }
    for entry in report.monthly.iter() {
        println!("- {} ({}): {}", entry.student_name, entry.grade_name, entry.reason);
    }
}

pub async fn alerts(pool: &PgPool, out: Output, today: NaiveDate) -> anyhow::Result<()> {
    let records = db::fetch_range(pool, alert_fetch_window(today)).await?;
    let report = alerts::compute_alerts(&records, today);
    out.emit(&report, || print_alerts(&report))
}

pub async fn absences(
    pool: &PgPool,
    out: Output,
    range: &RangeArgs,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let window = window_for(range)?;
    let records = db::fetch_range(pool, window).await?;
    let mut absences = report::absences_sorted_desc(&records);
    if let Some(limit) = limit {
        absences.truncate(limit);
    }

    out.emit(&absences, || {
        print_records(&absences, "No absences recorded for this period.")
    })
}

pub async fn by_grade(pool: &PgPool, out: Output, range: &RangeArgs) -> anyhow::Result<()> {
    let window = window_for(range)?;
    let records = db::fetch_range(pool, window).await?;
    let grades = report::group_by_grade(&records);

    out.emit(&grades, || {
        if grades.is_empty() {
            println!("No attendance recorded for this period.");
        }
        for grade in grades.iter() {
            println!(
                "{:<16} present {:>4}  absent {:>4}",
                grade.grade_name, grade.present, grade.absent
            );
        }
    })
}

pub async fn report(pool: &PgPool, range: &RangeArgs) -> anyhow::Result<String> {
    let today = range.today.unwrap_or_else(dates::today);
    let window = window_for(range)?;
    let records = db::fetch_range(pool, window).await?;
    let alert_records = db::fetch_range(pool, alert_fetch_window(today)).await?;

    let summary = summary::compute_summary(&records, window.start, window.end);
    let alerts = alerts::compute_alerts(&alert_records, today);
    Ok(report::build_report(window, &summary, &records, &alerts))
}
