use chrono::{Datelike, NaiveDate, Weekday};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::dates::{self, DateWindow};
use crate::error::{AttendanceError, Result};
use crate::models::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, AttendanceUpdate, DashboardStats, Grade,
    NewAttendance, Student,
};
use crate::summary;

const RECORD_SELECT: &str = "SELECT r.id, r.student_id, st.full_name, st.grade_id, g.name AS grade_name, \
     g.display_order, r.date, r.status, r.notes \
     FROM attendance.records r \
     JOIN attendance.students st ON st.id = r.student_id \
     JOIN attendance.grades g ON g.id = st.grade_id";

const STUDENT_SELECT: &str = "SELECT st.id, st.full_name, st.grade_id, g.name AS grade_name, st.active \
     FROM attendance.students st \
     JOIN attendance.grades g ON g.id = st.grade_id";

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("attendance schema migrated");
    Ok(())
}

fn record_from_row(row: &PgRow) -> Result<AttendanceRecord> {
    let status: String = row.try_get("status")?;
    Ok(AttendanceRecord {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        student_name: row.try_get("full_name")?,
        grade_id: row.try_get("grade_id")?,
        grade_name: row.try_get("grade_name")?,
        grade_order: row.try_get("display_order")?,
        date: row.try_get("date")?,
        status: status.parse()?,
        notes: row.try_get("notes")?,
    })
}

fn grade_from_row(row: &PgRow) -> Result<Grade> {
    Ok(Grade {
        id: row.try_get("id")?,
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        display_order: row.try_get("display_order")?,
        description: row.try_get("description")?,
        active: row.try_get("active")?,
    })
}

fn student_from_row(row: &PgRow) -> Result<Student> {
    Ok(Student {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        grade_id: row.try_get("grade_id")?,
        grade_name: row.try_get("grade_name")?,
        active: row.try_get("active")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn grade_write_error(err: sqlx::Error, code: &str) -> AttendanceError {
    if is_unique_violation(&err) {
        AttendanceError::DuplicateGrade {
            code: code.to_string(),
        }
    } else {
        err.into()
    }
}

#[derive(Debug, Clone)]
pub struct NewGrade {
    pub code: String,
    pub name: String,
    pub display_order: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GradeUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub display_order: Option<i32>,
    pub description: Option<Option<String>>,
    pub active: Option<bool>,
}

pub async fn list_grades(pool: &PgPool) -> Result<Vec<Grade>> {
    let rows = sqlx::query(
        "SELECT id, code, name, display_order, description, active \
         FROM attendance.grades WHERE active ORDER BY display_order, name",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(grade_from_row).collect()
}

pub async fn get_grade(pool: &PgPool, id: Uuid) -> Result<Grade> {
    let row = sqlx::query(
        "SELECT id, code, name, display_order, description, active \
         FROM attendance.grades WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AttendanceError::not_found("grade", id))?;

    grade_from_row(&row)
}

pub async fn create_grade(pool: &PgPool, grade: &NewGrade) -> Result<Grade> {
    let row = sqlx::query(
        r#"
        INSERT INTO attendance.grades (id, code, name, display_order, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, code, name, display_order, description, active
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&grade.code)
    .bind(&grade.name)
    .bind(grade.display_order)
    .bind(&grade.description)
    .fetch_one(pool)
    .await
    .map_err(|err| grade_write_error(err, &grade.code))?;

    let created = grade_from_row(&row)?;
    tracing::info!(grade_id = %created.id, code = %created.code, "grade created");
    Ok(created)
}

pub async fn update_grade(pool: &PgPool, id: Uuid, update: &GradeUpdate) -> Result<Grade> {
    let current = get_grade(pool, id).await?;
    let description = match &update.description {
        Some(value) => value.clone(),
        None => current.description,
    };
    let code = update.code.as_ref().unwrap_or(&current.code);

    let row = sqlx::query(
        r#"
        UPDATE attendance.grades
        SET code = $2, name = $3, display_order = $4, description = $5, active = $6
        WHERE id = $1
        RETURNING id, code, name, display_order, description, active
        "#,
    )
    .bind(id)
    .bind(code)
    .bind(update.name.as_ref().unwrap_or(&current.name))
    .bind(update.display_order.unwrap_or(current.display_order))
    .bind(description)
    .bind(update.active.unwrap_or(current.active))
    .fetch_one(pool)
    .await
    .map_err(|err| grade_write_error(err, code))?;

    grade_from_row(&row)
}

/// Soft delete: the grade is hidden from listings but keeps its history.
pub async fn deactivate_grade(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("UPDATE attendance.grades SET active = FALSE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AttendanceError::not_found("grade", id));
    }
    tracing::info!(grade_id = %id, "grade deactivated");
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct StudentUpdate {
    pub full_name: Option<String>,
    pub grade_id: Option<Uuid>,
    pub active: Option<bool>,
}

pub async fn list_students(pool: &PgPool) -> Result<Vec<Student>> {
    let query = format!("{STUDENT_SELECT} WHERE st.active ORDER BY g.display_order, st.full_name");
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    rows.iter().map(student_from_row).collect()
}

pub async fn list_students_by_grade(pool: &PgPool, grade_id: Uuid) -> Result<Vec<Student>> {
    let query = format!("{STUDENT_SELECT} WHERE st.active AND st.grade_id = $1 ORDER BY st.full_name");
    let rows = sqlx::query(&query).bind(grade_id).fetch_all(pool).await?;
    rows.iter().map(student_from_row).collect()
}

pub async fn get_student(pool: &PgPool, id: Uuid) -> Result<Student> {
    let query = format!("{STUDENT_SELECT} WHERE st.id = $1");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AttendanceError::not_found("student", id))?;

    student_from_row(&row)
}

pub async fn create_student(pool: &PgPool, full_name: &str, grade_id: Uuid) -> Result<Student> {
    get_grade(pool, grade_id).await?;

    let id: Uuid = sqlx::query(
        "INSERT INTO attendance.students (id, full_name, grade_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(grade_id)
    .fetch_one(pool)
    .await?
    .try_get("id")?;

    tracing::info!(student_id = %id, %grade_id, "student created");
    get_student(pool, id).await
}

pub async fn update_student(pool: &PgPool, id: Uuid, update: &StudentUpdate) -> Result<Student> {
    let current = get_student(pool, id).await?;
    if let Some(grade_id) = update.grade_id {
        get_grade(pool, grade_id).await?;
    }

    sqlx::query(
        "UPDATE attendance.students SET full_name = $2, grade_id = $3, active = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(update.full_name.as_ref().unwrap_or(&current.full_name))
    .bind(update.grade_id.unwrap_or(current.grade_id))
    .bind(update.active.unwrap_or(current.active))
    .execute(pool)
    .await?;

    get_student(pool, id).await
}

pub async fn deactivate_student(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("UPDATE attendance.students SET active = FALSE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AttendanceError::not_found("student", id));
    }
    tracing::info!(student_id = %id, "student deactivated");
    Ok(())
}

pub async fn fetch_stats(pool: &PgPool) -> Result<DashboardStats> {
    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM attendance.students) AS total_students,
            (SELECT COUNT(*) FROM attendance.students WHERE active) AS active_students,
            (SELECT COUNT(*) FROM attendance.grades WHERE active) AS total_grades
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(DashboardStats {
        total_students: row.try_get("total_students")?,
        active_students: row.try_get("active_students")?,
        total_grades: row.try_get("total_grades")?,
    })
}

pub async fn get_attendance(pool: &PgPool, id: Uuid) -> Result<AttendanceRecord> {
    let query = format!("{RECORD_SELECT} WHERE r.id = $1");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AttendanceError::not_found("attendance record", id))?;

    record_from_row(&row)
}

pub async fn fetch_by_date(pool: &PgPool, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
    let query = format!("{RECORD_SELECT} WHERE r.date = $1 ORDER BY g.display_order, st.full_name");
    let rows = sqlx::query(&query).bind(date).fetch_all(pool).await?;
    rows.iter().map(record_from_row).collect()
}

pub async fn fetch_by_student(
    pool: &PgPool,
    student_id: Uuid,
    window: Option<DateWindow>,
) -> Result<Vec<AttendanceRecord>> {
    let mut query = format!("{RECORD_SELECT} WHERE r.student_id = $1");
    if window.is_some() {
        query.push_str(" AND r.date BETWEEN $2 AND $3");
    }
    query.push_str(" ORDER BY r.date DESC");

    let mut rows = sqlx::query(&query).bind(student_id);
    if let Some(window) = window {
        rows = rows.bind(window.start).bind(window.end);
    }

    let records = rows.fetch_all(pool).await?;
    records.iter().map(record_from_row).collect()
}

/// All records dated inside the inclusive window, oldest day first.
pub async fn fetch_range(pool: &PgPool, window: DateWindow) -> Result<Vec<AttendanceRecord>> {
    let query = format!(
        "{RECORD_SELECT} WHERE r.date BETWEEN $1 AND $2 \
         ORDER BY r.date, g.display_order, st.full_name"
    );
    let rows = sqlx::query(&query)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(pool)
        .await?;

    tracing::debug!(start = %window.start, end = %window.end, rows = rows.len(), "fetched attendance range");
    rows.iter().map(record_from_row).collect()
}

pub async fn fetch_summary(pool: &PgPool, window: DateWindow) -> Result<AttendanceSummary> {
    let records = fetch_range(pool, window).await?;
    Ok(summary::compute_summary(&records, window.start, window.end))
}

/// Strict insert: a second record for the same student and date is a conflict.
pub async fn create_attendance(pool: &PgPool, new: &NewAttendance) -> Result<AttendanceRecord> {
    get_student(pool, new.student_id).await?;

    let id = Uuid::new_v4();
    let inserted = sqlx::query(
        r#"
        INSERT INTO attendance.records (id, student_id, date, status, notes)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(new.student_id)
    .bind(new.date)
    .bind(new.status.as_str())
    .bind(&new.notes)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            return Err(AttendanceError::Conflict {
                student_id: new.student_id,
                date: new.date,
            })
        }
        Err(err) => return Err(err.into()),
    }

    tracing::info!(student_id = %new.student_id, date = %new.date, status = %new.status, "attendance recorded");
    get_attendance(pool, id).await
}

async fn write_attendance(conn: &mut PgConnection, new: &NewAttendance) -> Result<Uuid> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance.records (id, student_id, date, status, notes)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_id, date) DO UPDATE
        SET status = EXCLUDED.status, notes = EXCLUDED.notes, updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.student_id)
    .bind(new.date)
    .bind(new.status.as_str())
    .bind(&new.notes)
    .fetch_one(&mut *conn)
    .await;

    match result {
        Ok(row) => Ok(row.try_get("id")?),
        Err(err) if is_foreign_key_violation(&err) => {
            Err(AttendanceError::not_found("student", new.student_id))
        }
        Err(err) => Err(err.into()),
    }
}

/// Creates the record for (student, date) or overwrites its status and notes.
pub async fn upsert_attendance(pool: &PgPool, new: &NewAttendance) -> Result<AttendanceRecord> {
    let mut conn = pool.acquire().await?;
    let id = write_attendance(&mut conn, new).await?;
    drop(conn);

    tracing::info!(student_id = %new.student_id, date = %new.date, status = %new.status, "attendance saved");
    get_attendance(pool, id).await
}

pub async fn update_attendance(
    pool: &PgPool,
    id: Uuid,
    update: &AttendanceUpdate,
) -> Result<AttendanceRecord> {
    let current = get_attendance(pool, id).await?;
    let status = update.status.unwrap_or(current.status);
    let notes = match &update.notes {
        Some(value) => value.clone(),
        None => current.notes,
    };

    sqlx::query(
        "UPDATE attendance.records SET status = $2, notes = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(notes)
    .execute(pool)
    .await?;

    get_attendance(pool, id).await
}

pub async fn delete_attendance(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM attendance.records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AttendanceError::not_found("attendance record", id));
    }
    tracing::info!(record_id = %id, "attendance deleted");
    Ok(())
}

async fn upsert_grade(
    conn: &mut PgConnection,
    code: &str,
    name: &str,
    display_order: i32,
) -> Result<Uuid> {
    let id = sqlx::query(
        r#"
        INSERT INTO attendance.grades (id, code, name, display_order)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (code) DO UPDATE
        SET name = EXCLUDED.name, active = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(code)
    .bind(name)
    .bind(display_order)
    .fetch_one(&mut *conn)
    .await?
    .try_get("id")?;

    Ok(id)
}

async fn upsert_student(conn: &mut PgConnection, full_name: &str, grade_id: Uuid) -> Result<Uuid> {
    let id = sqlx::query(
        r#"
        INSERT INTO attendance.students (id, full_name, grade_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (grade_id, full_name) DO UPDATE
        SET active = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(grade_id)
    .fetch_one(&mut *conn)
    .await?
    .try_get("id")?;

    Ok(id)
}

fn is_school_day(day: &NaiveDate) -> bool {
    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

fn first_school_days(window: DateWindow, count: usize) -> Vec<NaiveDate> {
    window.days().filter(is_school_day).take(count).collect()
}

const SEED_GRADES: [(&str, &str, i32); 3] =
    [("G1", "1st Grade", 1), ("G2", "2nd Grade", 2), ("G3", "3rd Grade", 3)];

const SEED_ROSTER: [(&str, &str); 5] = [
    ("G1", "Avery Lee"),
    ("G1", "Jules Moreno"),
    ("G2", "Kiara Patel"),
    ("G2", "Noah Fischer"),
    ("G3", "Sofia Alvarez"),
];

/// Absences the seed plants: Avery misses Monday and Tuesday of the current
/// week, Kiara the first three school days of the current month. Either may
/// fall after `today`.
fn seed_absences(today: NaiveDate) -> Vec<(&'static str, NaiveDate)> {
    let mut absences: Vec<(&'static str, NaiveDate)> = first_school_days(dates::week_window(today), 2)
        .into_iter()
        .map(|day| ("Avery Lee", day))
        .collect();
    absences.extend(
        first_school_days(dates::month_window(today), 3)
            .into_iter()
            .map(|day| ("Kiara Patel", day)),
    );
    absences
}

/// Loads a small roster with a month of attendance ending at `today`, plus
/// enough planted absences that both alert windows flag someone.
pub async fn seed(pool: &PgPool, today: NaiveDate) -> Result<usize> {
    let mut tx = pool.begin().await?;

    let mut grade_ids = Vec::new();
    for (code, name, order) in SEED_GRADES {
        grade_ids.push((code, upsert_grade(&mut tx, code, name, order).await?));
    }

    let mut students = Vec::new();
    for (code, name) in SEED_ROSTER {
        let Some((_, grade_id)) = grade_ids.iter().find(|(c, _)| *c == code) else {
            continue;
        };
        students.push((name, upsert_student(&mut tx, name, *grade_id).await?));
    }

    let month = dates::month_window(today);
    let absences = seed_absences(today);
    let mut written = 0usize;

    for day in month.days().filter(|day| *day <= today).filter(is_school_day) {
        for (name, student_id) in students.iter() {
            if absences.contains(&(*name, day)) {
                continue;
            }
            let present = NewAttendance {
                student_id: *student_id,
                date: day,
                status: AttendanceStatus::Present,
                notes: None,
            };
            write_attendance(&mut tx, &present).await?;
            written += 1;
        }
    }

    for (name, day) in absences.iter() {
        let Some((_, student_id)) = students.iter().find(|(n, _)| n == name) else {
            continue;
        };
        let absence = NewAttendance {
            student_id: *student_id,
            date: *day,
            status: AttendanceStatus::Absent,
            notes: Some("No call from family".to_string()),
        };
        write_attendance(&mut tx, &absence).await?;
        written += 1;
    }

    tx.commit().await?;
    tracing::info!(records = written, start = %month.start, end = %today, "seed data written");
    Ok(written)
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    grade_code: String,
    grade_name: String,
    #[serde(default)]
    grade_order: Option<i32>,
    student_name: String,
    date: String,
    status: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct ImportRow {
    grade_code: String,
    grade_name: String,
    grade_order: i32,
    student_name: String,
    date: NaiveDate,
    status: AttendanceStatus,
    notes: Option<String>,
}

/// Reads and validates every row before anything is written.
fn read_import_rows<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Vec<ImportRow>> {
    let mut rows = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        rows.push(ImportRow {
            date: dates::parse_date(&row.date)?,
            status: row.status.parse()?,
            grade_code: row.grade_code,
            grade_name: row.grade_name,
            grade_order: row.grade_order.unwrap_or(0),
            student_name: row.student_name,
            notes: row.notes.filter(|notes| !notes.trim().is_empty()),
        });
    }

    Ok(rows)
}

/// Imports attendance rows from CSV, creating grades and students on the fly.
///
/// Expected headers: `grade_code,grade_name,grade_order,student_name,date,status,notes`
/// (`grade_order` and `notes` may be left out). Rows for an existing
/// (student, date) pair overwrite the stored record. The whole file is
/// written in one transaction; any bad row leaves the store untouched.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let rows = read_import_rows(&mut reader)?;

    let mut tx = pool.begin().await?;
    for row in rows.iter() {
        let grade_id = upsert_grade(&mut tx, &row.grade_code, &row.grade_name, row.grade_order).await?;
        let student_id = upsert_student(&mut tx, &row.student_name, grade_id).await?;

        write_attendance(
            &mut tx,
            &NewAttendance {
                student_id,
                date: row.date,
                status: row.status,
                notes: row.notes.clone(),
            },
        )
        .await?;
    }
    tx.commit().await?;

    tracing::info!(rows = rows.len(), path = %csv_path.display(), "csv import finished");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::compute_alerts;
    use crate::test_support::{absent, date};
    use std::fmt;

    #[derive(Debug)]
    struct UniqueViolation;

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn duplicate_grade_code_is_a_typed_error() {
        let err = grade_write_error(sqlx::Error::Database(Box::new(UniqueViolation)), "G1");
        assert!(matches!(err, AttendanceError::DuplicateGrade { ref code } if code == "G1"));

        let err = grade_write_error(sqlx::Error::RowNotFound, "G1");
        assert!(matches!(err, AttendanceError::Database(sqlx::Error::RowNotFound)));
    }

    fn seeded_absences(today: NaiveDate) -> Vec<crate::models::AttendanceRecord> {
        let avery = Uuid::new_v4();
        let kiara = Uuid::new_v4();
        seed_absences(today)
            .into_iter()
            .map(|(name, day)| {
                let id = if name == "Avery Lee" { avery } else { kiara };
                absent(id, name, day)
            })
            .collect()
    }

    #[test]
    fn seed_flags_both_windows_on_any_day() {
        // A Monday, a week starting in the previous month, a Sunday and a
        // month starting on a Saturday.
        for today in [
            date(2024, 1, 8),
            date(2024, 10, 1),
            date(2024, 1, 14),
            date(2024, 6, 1),
        ] {
            let alerts = compute_alerts(&seeded_absences(today), today);
            let weekly: Vec<_> = alerts.weekly.iter().map(|a| a.student_name.as_str()).collect();
            let monthly: Vec<_> = alerts.monthly.iter().map(|a| a.student_name.as_str()).collect();
            assert!(weekly.contains(&"Avery Lee"), "no weekly alert for {today}");
            assert!(monthly.contains(&"Kiara Patel"), "no monthly alert for {today}");
        }
    }

    #[test]
    fn seed_absences_fall_on_school_days() {
        let absences = seed_absences(date(2024, 10, 1));
        assert_eq!(
            absences,
            vec![
                ("Avery Lee", date(2024, 9, 30)),
                ("Avery Lee", date(2024, 10, 1)),
                ("Kiara Patel", date(2024, 10, 1)),
                ("Kiara Patel", date(2024, 10, 2)),
                ("Kiara Patel", date(2024, 10, 3)),
            ]
        );
    }

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(data.as_bytes())
    }

    #[test]
    fn import_rows_are_validated_up_front() {
        let mut input = reader(
            "grade_code,grade_name,student_name,date,status,notes\n\
             G1,1st Grade,Avery Lee,2024-01-08,absent,Fever\n\
             G1,1st Grade,Avery Lee,2024-01-09,present,\n",
        );
        let rows = read_import_rows(&mut input).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(2024, 1, 8));
        assert_eq!(rows[0].status, AttendanceStatus::Absent);
        assert_eq!(rows[0].notes.as_deref(), Some("Fever"));
        assert_eq!(rows[1].notes, None);
        assert_eq!(rows[1].grade_order, 0);
    }

    #[test]
    fn a_bad_row_rejects_the_whole_file() {
        let mut bad_status = reader(
            "grade_code,grade_name,student_name,date,status,notes\n\
             G1,1st Grade,Avery Lee,2024-01-08,absent,\n\
             G1,1st Grade,Avery Lee,2024-01-09,late,\n",
        );
        assert!(matches!(
            read_import_rows(&mut bad_status),
            Err(AttendanceError::Validation(_))
        ));

        let mut bad_date = reader(
            "grade_code,grade_name,student_name,date,status,notes\n\
             G1,1st Grade,Avery Lee,2024-1-8,absent,\n",
        );
        assert!(read_import_rows(&mut bad_date).is_err());
    }
}
