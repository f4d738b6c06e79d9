use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{AttendanceRecord, AttendanceStatus};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn record(
    student_id: Uuid,
    student_name: &str,
    grade_name: &str,
    on: NaiveDate,
    status: AttendanceStatus,
) -> AttendanceRecord {
    AttendanceRecord {
        id: Uuid::new_v4(),
        student_id,
        student_name: student_name.to_string(),
        grade_id: Uuid::nil(),
        grade_name: grade_name.to_string(),
        grade_order: 1,
        date: on,
        status,
        notes: None,
    }
}

pub fn absent(student_id: Uuid, student_name: &str, on: NaiveDate) -> AttendanceRecord {
    record(student_id, student_name, "1st Grade", on, AttendanceStatus::Absent)
}

pub fn present(student_id: Uuid, student_name: &str, on: NaiveDate) -> AttendanceRecord {
    record(student_id, student_name, "1st Grade", on, AttendanceStatus::Present)
}
