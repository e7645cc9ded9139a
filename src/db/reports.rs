//! # 출결 기록 / 수업 보고서 쿼리

use super::{in_list, IN_CHUNK};
use crate::error::AppError;
use crate::models::{Absence, AbsenceStatus, SessionReport, SubmitReportRequest};
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// 보고서가 하나 이상 달린 인스턴스 id
pub async fn reported_instance_ids(
    conn: &mut SqliteConnection,
    instance_ids: &[String],
) -> Result<HashSet<String>, AppError> {
    let mut reported = HashSet::new();
    for chunk in instance_ids.chunks(IN_CHUNK) {
        let rows: Vec<(String,)> = in_list(
            "SELECT DISTINCT instance_id FROM session_reports WHERE instance_id IN",
            chunk,
            "",
        )
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;
        reported.extend(rows.into_iter().map(|(id,)| id));
    }
    Ok(reported)
}

/// (instance_id, student_id) 쌍으로 보고서 작성 여부를 돌려줍니다.
pub async fn report_pairs(
    conn: &mut SqliteConnection,
    instance_ids: &[String],
) -> Result<Vec<(String, String)>, AppError> {
    let mut pairs = Vec::new();
    for chunk in instance_ids.chunks(IN_CHUNK) {
        let rows: Vec<(String, String)> = in_list(
            "SELECT DISTINCT instance_id, student_id FROM session_reports WHERE instance_id IN",
            chunk,
            "",
        )
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;
        pairs.extend(rows);
    }
    Ok(pairs)
}

/// 인스턴스들의 출결 기록 전체. `IN (...)`은 `IN_CHUNK`씩 나눠서 보냅니다.
pub async fn list_absences(conn: &mut SqliteConnection, instance_ids: &[String]) -> Result<Vec<Absence>, AppError> {
    let mut absences = Vec::new();
    for chunk in instance_ids.chunks(IN_CHUNK) {
        let rows: Vec<Absence> = in_list(
            "SELECT id, instance_id, student_id, status, reason FROM absences WHERE instance_id IN",
            chunk,
            "",
        )
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;
        absences.extend(rows);
    }
    Ok(absences)
}

/// (인스턴스, 학생)마다 하나뿐인 출결 기록을 만들거나 덮어씁니다.
pub async fn upsert_absence(
    conn: &mut SqliteConnection,
    instance_id: &str,
    student_id: &str,
    status: AbsenceStatus,
    reason: Option<&str>,
) -> Result<Absence, AppError> {
    let stored: Option<bool> = status.into();

    sqlx::query(
        r#"
        INSERT INTO absences (id, instance_id, student_id, status, reason)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (instance_id, student_id)
        DO UPDATE SET status = excluded.status, reason = excluded.reason
        "#,
    )
    .bind(uuid::Uuid::now_v7().to_string())
    .bind(instance_id)
    .bind(student_id)
    .bind(stored)
    .bind(reason)
    .execute(&mut *conn)
    .await?;

    let absence = sqlx::query_as::<_, Absence>(
        "SELECT id, instance_id, student_id, status, reason FROM absences WHERE instance_id = ? AND student_id = ?",
    )
    .bind(instance_id)
    .bind(student_id)
    .fetch_optional(&mut *conn)
    .await?;

    absence.ok_or(AppError::Internal("Failed to retrieve stored absence".to_string()))
}

/// 보고서를 저장하고 다시 읽어 반환합니다.
///
/// 같은 (인스턴스, 학생)에 보고서가 여러 번 달릴 수 있습니다. 완료 판정은 하나만 있으면 됩니다.
pub async fn insert_report(
    conn: &mut SqliteConnection,
    instance_id: &str,
    req: &SubmitReportRequest,
) -> Result<SessionReport, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO session_reports
            (id, instance_id, student_id, lesson_topic, covered_materials,
             learning_assessment, next_homework, tutor_remarks)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(instance_id)
    .bind(&req.student_id)
    .bind(&req.lesson_topic)
    .bind(&req.covered_materials)
    .bind(&req.learning_assessment)
    .bind(&req.next_homework)
    .bind(&req.tutor_remarks)
    .execute(&mut *conn)
    .await?;

    let report = sqlx::query_as::<_, SessionReport>(
        r#"
        SELECT id, instance_id, student_id, lesson_topic, covered_materials,
               learning_assessment, next_homework, tutor_remarks, created_at
        FROM session_reports WHERE id = ?
        "#,
    )
    .bind(&id)
    .fetch_optional(&mut *conn)
    .await?;

    report.ok_or(AppError::Internal("Failed to retrieve created report".to_string()))
}
