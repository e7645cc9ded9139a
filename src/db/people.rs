//! # 강사 / 학생 / 이름 조회 쿼리
//!
//! 강사와 학생은 `users` 테이블의 이름을 함께 읽습니다.
//! 알림 수신자는 강사·학생 id가 아니라 `users.id`입니다.

use super::{in_list, IN_CHUNK};
use crate::error::AppError;
use crate::models::{AvailabilityWindow, AvailabilityWindowInput, Student, Teacher};
use crate::scheduling::{Directory, TeacherProfile};
use sqlx::SqliteConnection;
use std::collections::BTreeSet;

/// 강사 + `users`의 이름. 없으면 None.
pub async fn get_teacher(conn: &mut SqliteConnection, id: &str) -> Result<Option<Teacher>, AppError> {
    let teacher = sqlx::query_as::<_, Teacher>(
        r#"
        SELECT t.id, t.user_id, u.first_name, u.last_name
        FROM teachers t JOIN users u ON u.id = t.user_id
        WHERE t.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(teacher)
}

/// 강사의 요일별 가용 구간을 요일, 시작 시각 순으로
pub async fn list_availability(
    conn: &mut SqliteConnection,
    teacher_id: &str,
) -> Result<Vec<AvailabilityWindow>, AppError> {
    let windows = sqlx::query_as::<_, AvailabilityWindow>(
        r#"
        SELECT id, teacher_id, day_of_week, start_time, end_time
        FROM teacher_availabilities
        WHERE teacher_id = ?
        ORDER BY day_of_week, start_time
        "#,
    )
    .bind(teacher_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(windows)
}

/// 강사의 가용 구간 전체를 교체합니다.
pub async fn replace_availability(
    conn: &mut SqliteConnection,
    teacher_id: &str,
    windows: &[AvailabilityWindowInput],
) -> Result<Vec<AvailabilityWindow>, AppError> {
    sqlx::query("DELETE FROM teacher_availabilities WHERE teacher_id = ?")
        .bind(teacher_id)
        .execute(&mut *conn)
        .await?;

    for window in windows {
        sqlx::query(
            r#"
            INSERT INTO teacher_availabilities (id, teacher_id, day_of_week, start_time, end_time)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::now_v7().to_string())
        .bind(teacher_id)
        .bind(&window.day_of_week)
        .bind(window.start_time.to_string())
        .bind(window.end_time.to_string())
        .execute(&mut *conn)
        .await?;
    }

    list_availability(conn, teacher_id).await
}

/// 강사 + 가용 구간. 강사가 없으면 None.
pub async fn teacher_profile(conn: &mut SqliteConnection, id: &str) -> Result<Option<TeacherProfile>, AppError> {
    let Some(teacher) = get_teacher(conn, id).await? else {
        return Ok(None);
    };
    let windows = list_availability(conn, id).await?;
    Ok(Some(TeacherProfile { teacher, windows }))
}

/// 학생 여러 명을 조회합니다.
///
/// 없는 id는 결과에서 빠지고, 순서는 요청한 id 순서와 다를 수 있습니다.
pub async fn get_students(conn: &mut SqliteConnection, ids: &[String]) -> Result<Vec<Student>, AppError> {
    let mut students = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_CHUNK) {
        let rows: Vec<Student> = in_list(
            r#"
            SELECT s.id, s.user_id, u.first_name, u.last_name, s.available_dates, s.session_balance
            FROM students s JOIN users u ON u.id = s.user_id
            WHERE s.id IN"#,
            chunk,
            "",
        )
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;
        students.extend(rows);
    }
    Ok(students)
}

/// 수업 잔여 횟수를 `delta`만큼 바꿉니다. 0 아래로는 내려가지 않습니다.
pub async fn adjust_session_balance(conn: &mut SqliteConnection, student_id: &str, delta: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE students SET session_balance = MAX(session_balance + ?, 0) WHERE id = ?")
        .bind(delta)
        .bind(student_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// 강사/학생 id → 알림을 받을 `users.id` (중복 제거)
pub async fn user_ids_for(
    conn: &mut SqliteConnection,
    teacher_ids: &[String],
    student_ids: &[String],
) -> Result<Vec<String>, AppError> {
    let mut user_ids = BTreeSet::new();

    for chunk in teacher_ids.chunks(IN_CHUNK) {
        let rows: Vec<(String,)> = in_list("SELECT user_id FROM teachers WHERE id IN", chunk, "")
            .build_query_as()
            .fetch_all(&mut *conn)
            .await?;
        user_ids.extend(rows.into_iter().map(|(id,)| id));
    }
    for chunk in student_ids.chunks(IN_CHUNK) {
        let rows: Vec<(String,)> = in_list("SELECT user_id FROM students WHERE id IN", chunk, "")
            .build_query_as()
            .fetch_all(&mut *conn)
            .await?;
        user_ids.extend(rows.into_iter().map(|(id,)| id));
    }

    Ok(user_ids.into_iter().collect())
}

async fn load_names(
    conn: &mut SqliteConnection,
    directory: &mut Directory,
    prefix: &str,
    ids: &[String],
) -> Result<(), AppError> {
    for chunk in ids.chunks(IN_CHUNK) {
        let rows: Vec<(String, String)> = in_list(prefix, chunk, "")
            .build_query_as()
            .fetch_all(&mut *conn)
            .await?;
        for (id, name) in rows {
            directory.insert(id, name);
        }
    }
    Ok(())
}

/// 변경 설명에 쓸 이름들을 한 번에 읽습니다.
pub async fn load_directory(
    conn: &mut SqliteConnection,
    teacher_ids: &[String],
    student_ids: &[String],
    location_ids: &[String],
    session_type_ids: &[String],
) -> Result<Directory, AppError> {
    let mut directory = Directory::new();
    load_names(
        conn,
        &mut directory,
        "SELECT t.id, u.first_name || ' ' || u.last_name FROM teachers t JOIN users u ON u.id = t.user_id WHERE t.id IN",
        teacher_ids,
    )
    .await?;
    load_names(
        conn,
        &mut directory,
        "SELECT s.id, u.first_name || ' ' || u.last_name FROM students s JOIN users u ON u.id = s.user_id WHERE s.id IN",
        student_ids,
    )
    .await?;
    load_names(conn, &mut directory, "SELECT id, name FROM locations WHERE id IN", location_ids).await?;
    load_names(conn, &mut directory, "SELECT id, name FROM session_types WHERE id IN", session_type_ids).await?;
    Ok(directory)
}

/// 장소가 있는지
pub async fn location_exists(conn: &mut SqliteConnection, id: &str) -> Result<bool, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM locations WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

pub async fn session_type_exists(conn: &mut SqliteConnection, id: &str) -> Result<bool, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM session_types WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}
