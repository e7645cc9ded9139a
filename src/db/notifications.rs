use crate::error::AppError;
use sqlx::SqliteConnection;

/// 알림 한 건과 수신자별 행을 저장하고 알림 id를 반환합니다.
pub async fn insert_notification(
    conn: &mut SqliteConnection,
    user_ids: &[String],
    title: &str,
    message: &str,
    event_type: &str,
) -> Result<String, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query("INSERT INTO notifications (id, title, message, event_type) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(title)
        .bind(message)
        .bind(event_type)
        .execute(&mut *conn)
        .await?;

    for user_id in user_ids {
        sqlx::query("INSERT OR IGNORE INTO user_notifications (notification_id, user_id) VALUES (?, ?)")
            .bind(&id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(id)
}
