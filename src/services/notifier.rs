//! # 알림 전송
//!
//! 일정 엔진은 알림이 어떻게 전달되는지 모릅니다. `Notifier` 트레이트만 호출하고,
//! 실패는 경고 로그만 남기고 삼킵니다 (이미 커밋된 일정 변경을 실패로 보이게 하지 않음).

use crate::db;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub const CLASS_SESSION_CREATED: &str = "class-session";
pub const CLASS_SESSION_UPDATE: &str = "class-session-update";
pub const CLASS_SESSION_DEACTIVATION: &str = "class-session-deactivation";
pub const SESSION_UPDATE: &str = "session-update";
pub const SESSION_REPORT_ADDED: &str = "session_report_added";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_ids: &[String], title: &str, message: &str, event_type: &str) -> Result<(), AppError>;
}

/// `notifications` / `user_notifications` 테이블에 저장하는 기본 구현
#[derive(Debug, Clone)]
pub struct SqliteNotifier {
    pool: SqlitePool,
}

impl SqliteNotifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for SqliteNotifier {
    async fn notify(&self, user_ids: &[String], title: &str, message: &str, event_type: &str) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        let id = db::insert_notification(&mut conn, user_ids, title, message, event_type).await?;
        tracing::debug!(notification_id = %id, recipients = user_ids.len(), event_type, "notification stored");
        Ok(())
    }
}

/// 알림을 보내고, 실패하면 경고만 남깁니다. 수신자가 없으면 보내지 않습니다.
pub async fn notify_quietly(
    notifier: &dyn Notifier,
    user_ids: &[String],
    title: &str,
    message: &str,
    event_type: &str,
) {
    if user_ids.is_empty() {
        return;
    }
    if let Err(e) = notifier.notify(user_ids, title, message, event_type).await {
        tracing::warn!(error = %e, event_type, "failed to send notification");
    }
}
