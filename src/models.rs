use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Serialize)]
pub struct Grade {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub display_order: i32,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub grade_id: Uuid,
    pub grade_name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            _ => Err(ValidationError::InvalidStatus(s.to_string())),
        }
    }
}

/// A stored attendance row joined with the student's name and grade.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub grade_id: Uuid,
    pub grade_name: String,
    pub grade_order: i32,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

impl AttendanceRecord {
    pub fn is_absent(&self) -> bool {
        self.status == AttendanceStatus::Absent
    }
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Partial update; `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default)]
pub struct AttendanceUpdate {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
}

impl Add for AttendanceSummary {
    type Output = AttendanceSummary;

    fn add(self, other: AttendanceSummary) -> AttendanceSummary {
        AttendanceSummary {
            total: self.total + other.total,
            present: self.present + other.present,
            absent: self.absent + other.absent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEntry {
    pub student_id: Uuid,
    pub student_name: String,
    pub grade_name: String,
    pub absence_count: usize,
    pub window: WindowKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeAttendance {
    pub grade_name: String,
    pub present: usize,
    pub absent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieSlice {
    pub label: &'static str,
    pub value: usize,
    pub color: &'static str,
}

/// Roll-call progress for one day: which roster students have a record.
#[derive(Debug, Clone, Serialize)]
pub struct RollCall {
    pub date: NaiveDate,
    pub recorded: usize,
    pub total: usize,
    pub unmarked: Vec<Student>,
}

impl RollCall {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.recorded as f64 * 100.0 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.recorded == self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_students: i64,
    pub active_students: i64,
    pub total_grades: i64,
}
