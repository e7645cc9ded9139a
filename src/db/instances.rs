//! # 수업 인스턴스 쿼리
//!
//! ## 테이블 구조
//! - `class_session_instances`: 인스턴스 한 행. 삭제는 `deleted_at`을 채우는 soft delete입니다.
//! - `instance_students`: 인스턴스와 학생의 다대다(N:M) 관계
//!
//! 조회 함수는 모두 soft delete 된 행을 제외하고, `student_ids`까지 채워서 반환합니다.

use super::{in_list, IN_CHUNK};
use crate::error::AppError;
use crate::models::SessionInstance;
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;

const COLUMNS: &str = "id, class_session_id, date, start_time, duration_minutes, teacher_id, location_id, \
                       room, session_type_id, note, is_active, reports_submitted";

/// `instance_students`에서 학생 목록을 읽어 채웁니다.
pub async fn attach_students(conn: &mut SqliteConnection, instances: &mut [SessionInstance]) -> Result<(), AppError> {
    let ids: Vec<String> = instances.iter().map(|i| i.id.clone()).collect();
    let mut students: HashMap<String, Vec<String>> = HashMap::new();

    for chunk in ids.chunks(IN_CHUNK) {
        let rows: Vec<(String, String)> = in_list(
            "SELECT instance_id, student_id FROM instance_students WHERE instance_id IN",
            chunk,
            " ORDER BY student_id",
        )
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;

        for (instance_id, student_id) in rows {
            students.entry(instance_id).or_default().push(student_id);
        }
    }

    for instance in instances.iter_mut() {
        instance.student_ids = students.remove(&instance.id).unwrap_or_default();
    }
    Ok(())
}

/// ID로 살아 있는 인스턴스 하나를 조회합니다. 학생 목록까지 채웁니다.
///
/// ## 반환값
/// - `Ok(Some(..))`: 찾음
/// - `Ok(None)`: 없거나 soft delete 됨
pub async fn get_instance(conn: &mut SqliteConnection, id: &str) -> Result<Option<SessionInstance>, AppError> {
    let instance = sqlx::query_as::<_, SessionInstance>(&format!(
        "SELECT {} FROM class_session_instances WHERE id = ? AND deleted_at IS NULL",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(instance) = instance else {
        return Ok(None);
    };
    let mut found = [instance];
    attach_students(conn, &mut found).await?;
    let [instance] = found;
    Ok(Some(instance))
}

/// 여러 인스턴스를 한 번에 조회합니다. 없는 id는 결과에서 빠지므로
/// 호출하는 쪽에서 개수를 비교해 404를 판단합니다.
pub async fn get_instances(conn: &mut SqliteConnection, ids: &[String]) -> Result<Vec<SessionInstance>, AppError> {
    let mut instances = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_CHUNK) {
        let rows: Vec<SessionInstance> = in_list(
            &format!(
                "SELECT {} FROM class_session_instances WHERE deleted_at IS NULL AND id IN",
                COLUMNS
            ),
            chunk,
            "",
        )
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;
        instances.extend(rows);
    }
    instances.sort_by(|a, b| a.date.cmp(&b.date).then(a.start_time.cmp(&b.start_time)));
    attach_students(conn, &mut instances).await?;
    Ok(instances)
}

/// 한 수업의 살아 있는 인스턴스를 날짜순으로
pub async fn list_for_class_session(
    conn: &mut SqliteConnection,
    class_session_id: &str,
) -> Result<Vec<SessionInstance>, AppError> {
    let mut instances = sqlx::query_as::<_, SessionInstance>(&format!(
        r#"
        SELECT {} FROM class_session_instances
        WHERE class_session_id = ? AND deleted_at IS NULL
        ORDER BY date, start_time
        "#,
        COLUMNS
    ))
    .bind(class_session_id)
    .fetch_all(&mut *conn)
    .await?;

    attach_students(conn, &mut instances).await?;
    Ok(instances)
}

/// 강사의 활성 인스턴스 중 `[from, to]` 구간에 있는 것.
/// `exclude_class_session`을 주면 그 수업의 인스턴스는 빼고 가져옵니다.
pub async fn busy_for_teacher(
    conn: &mut SqliteConnection,
    teacher_id: &str,
    from: NaiveDate,
    to: NaiveDate,
    exclude_class_session: Option<&str>,
) -> Result<Vec<SessionInstance>, AppError> {
    let instances = sqlx::query_as::<_, SessionInstance>(&format!(
        r#"
        SELECT {} FROM class_session_instances
        WHERE teacher_id = ? AND date BETWEEN ? AND ?
          AND is_active = 1 AND deleted_at IS NULL
          AND (? IS NULL OR class_session_id <> ?)
        ORDER BY date, start_time
        "#,
        COLUMNS
    ))
    .bind(teacher_id)
    .bind(from)
    .bind(to)
    .bind(exclude_class_session)
    .bind(exclude_class_session)
    .fetch_all(&mut *conn)
    .await?;

    Ok(instances)
}

/// 달력 조회 필터. 비어 있는 조건은 적용하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct CalendarFilter {
    /// 이 중 하나에 속한 인스턴스만. 비어 있으면 모든 장소
    pub location_ids: Vec<String>,
    pub teacher_id: Option<String>,
    /// 이 학생이 참여하는 인스턴스만
    pub student_id: Option<String>,
}

/// 달력 구간의 인스턴스 (활성/비활성 모두).
///
/// 필터 조건은 모두 SQL에서 처리합니다. 학생 조건은 `instance_students`를
/// 서브쿼리로 걸러 내므로, 반환되는 `student_ids`에는 다른 학생도 그대로 들어 있습니다.
pub async fn list_between(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
    filter: &CalendarFilter,
) -> Result<Vec<SessionInstance>, AppError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM class_session_instances WHERE deleted_at IS NULL AND date BETWEEN ",
        COLUMNS
    ));
    builder.push_bind(from).push(" AND ").push_bind(to);

    if let Some(teacher_id) = &filter.teacher_id {
        builder.push(" AND teacher_id = ").push_bind(teacher_id.as_str());
    }
    if let Some(student_id) = &filter.student_id {
        builder
            .push(" AND id IN (SELECT instance_id FROM instance_students WHERE student_id = ")
            .push_bind(student_id.as_str())
            .push(")");
    }
    if !filter.location_ids.is_empty() {
        builder.push(" AND location_id IN (");
        let mut separated = builder.separated(", ");
        for location_id in &filter.location_ids {
            separated.push_bind(location_id.as_str());
        }
        separated.push_unseparated(")");
    }
    builder.push(" ORDER BY date, start_time");

    let mut instances: Vec<SessionInstance> = builder.build_query_as().fetch_all(&mut *conn).await?;

    attach_students(conn, &mut instances).await?;
    Ok(instances)
}

async fn replace_students(conn: &mut SqliteConnection, instance_id: &str, student_ids: &[String]) -> Result<(), AppError> {
    sqlx::query("DELETE FROM instance_students WHERE instance_id = ?")
        .bind(instance_id)
        .execute(&mut *conn)
        .await?;

    for student_id in student_ids {
        sqlx::query("INSERT OR IGNORE INTO instance_students (instance_id, student_id) VALUES (?, ?)")
            .bind(instance_id)
            .bind(student_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// 새 인스턴스와 참여 학생 행을 저장합니다.
///
/// id는 호출하는 쪽(엔진의 draft)에서 이미 만들어 둔 값을 씁니다.
pub async fn insert_instance(conn: &mut SqliteConnection, instance: &SessionInstance) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO class_session_instances
            (id, class_session_id, date, start_time, duration_minutes, teacher_id, location_id,
             room, session_type_id, note, is_active, reports_submitted)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&instance.id)
    .bind(&instance.class_session_id)
    .bind(instance.date)
    .bind(instance.start_time.to_string())
    .bind(instance.duration_minutes)
    .bind(&instance.teacher_id)
    .bind(&instance.location_id)
    .bind(&instance.room)
    .bind(&instance.session_type_id)
    .bind(&instance.note)
    .bind(instance.is_active)
    .bind(instance.reports_submitted)
    .execute(&mut *conn)
    .await?;

    replace_students(conn, &instance.id, &instance.student_ids).await
}

/// 인스턴스의 일정/속성/학생 목록을 통째로 저장합니다.
pub async fn save_instance(conn: &mut SqliteConnection, instance: &SessionInstance) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE class_session_instances
        SET date = ?, start_time = ?, duration_minutes = ?, teacher_id = ?, location_id = ?,
            room = ?, session_type_id = ?, note = ?, is_active = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(instance.date)
    .bind(instance.start_time.to_string())
    .bind(instance.duration_minutes)
    .bind(&instance.teacher_id)
    .bind(&instance.location_id)
    .bind(&instance.room)
    .bind(&instance.session_type_id)
    .bind(&instance.note)
    .bind(instance.is_active)
    .bind(&instance.id)
    .execute(&mut *conn)
    .await?;

    replace_students(conn, &instance.id, &instance.student_ids).await
}

/// `deleted_at`만 채웁니다. 행과 보고서, 출결 기록은 그대로 남습니다.
pub async fn soft_remove_instance(conn: &mut SqliteConnection, id: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE class_session_instances
        SET deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// 활성 여부만 바꿉니다.
pub async fn set_instance_active(conn: &mut SqliteConnection, id: &str, is_active: bool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE class_session_instances
        SET is_active = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(is_active)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// 보고서 완료 플래그를 저장합니다.
pub async fn set_reports_submitted(conn: &mut SqliteConnection, id: &str, submitted: bool) -> Result<(), AppError> {
    sqlx::query("UPDATE class_session_instances SET reports_submitted = ? WHERE id = ?")
        .bind(submitted)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
