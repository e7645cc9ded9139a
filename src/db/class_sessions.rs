//! # 수업(class_sessions) 쿼리
//!
//! 반복 정의는 `recurrence_kind`, `start_date`, `end_date`, `schedule`(JSON) 컬럼에
//! 그대로 저장됩니다. 조정 엔진은 이 저장된 정의를 "이전 정의"로 사용합니다.

use crate::error::AppError;
use crate::models::{ClassSession, RecurrenceDefinition};
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, recurrence_kind, start_date, end_date, schedule, topic, is_holiday_course, created_at, updated_at";

/// ID로 수업 하나를 조회합니다.
///
/// 반복 정의(`schedule`)는 JSON 컬럼이라 `sqlx::types::Json`으로 풀어서 읽습니다.
/// 없으면 `Ok(None)`.
pub async fn get_class_session(conn: &mut SqliteConnection, id: &str) -> Result<Option<ClassSession>, AppError> {
    let session = sqlx::query_as::<_, ClassSession>(&format!(
        "SELECT {} FROM class_sessions WHERE id = ?",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(session)
}

/// 새 수업을 저장하고, 저장된 행을 다시 읽어 반환합니다.
pub async fn insert_class_session(
    conn: &mut SqliteConnection,
    id: &str,
    definition: &RecurrenceDefinition,
    topic: Option<&str>,
    is_holiday_course: bool,
) -> Result<ClassSession, AppError> {
    sqlx::query(
        r#"
        INSERT INTO class_sessions (id, recurrence_kind, start_date, end_date, schedule, topic, is_holiday_course)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(definition.recurrence_kind.as_str())
    .bind(definition.start_date)
    .bind(definition.end_date)
    .bind(Json(&definition.schedule))
    .bind(topic)
    .bind(is_holiday_course)
    .execute(&mut *conn)
    .await?;

    get_class_session(conn, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created class session".to_string()))
}

/// 반복 정의 전체와 부가 정보를 교체합니다.
pub async fn update_class_session(
    conn: &mut SqliteConnection,
    id: &str,
    definition: &RecurrenceDefinition,
    topic: Option<&str>,
    is_holiday_course: bool,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE class_sessions
        SET recurrence_kind = ?, start_date = ?, end_date = ?, schedule = ?,
            topic = ?, is_holiday_course = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(definition.recurrence_kind.as_str())
    .bind(definition.start_date)
    .bind(definition.end_date)
    .bind(Json(&definition.schedule))
    .bind(topic)
    .bind(is_holiday_course)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// 기간 한정 수정이 기존 종료일 뒤까지 갈 때 종료일을 늘립니다.
pub async fn extend_end_date(conn: &mut SqliteConnection, id: &str, end_date: NaiveDate) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE class_sessions
        SET end_date = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND end_date < ?
        "#,
    )
    .bind(end_date)
    .bind(id)
    .bind(end_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
