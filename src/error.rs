//! # 에러 처리 모듈
//!
//! HTTP 계층에서 쓰는 에러 타입 `AppError`를 정의합니다.
//! 일정 엔진의 에러(`ScheduleError`)는 `AppError::Schedule`로 감싸지고,
//! 종류마다 다른 HTTP 상태 코드로 변환됩니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 `{ "error": { "code", "message" } }` 응답으로 자동 변환

use crate::scheduling::ScheduleError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404). 무엇을 못 찾았는지 담습니다.
    #[error("{0} not found")]
    NotFound(String),

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx 함수에서 `?`를 쓰면 자동으로 AppError::Database로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 일정 엔진이 거부한 요청 (400 / 409 / 422)
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl AppError {
    /// `AppError::not_found("Class session", &id)` 형태로 쓰는 도우미
    pub fn not_found(kind: &str, id: &str) -> Self {
        AppError::NotFound(format!("{} {}", kind, id))
    }
}

impl IntoResponse for AppError {
    /// 내부 에러(Database, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            // 엔진 에러는 메시지를 그대로 사용자에게 보여줍니다 (어느 날짜/누가 문제인지 포함)
            AppError::Schedule(ref e) => {
                let (status, code) = match e {
                    ScheduleError::InvalidRecurrence(_) => (StatusCode::BAD_REQUEST, "invalid_recurrence"),
                    ScheduleError::AvailabilityConflict(_) => (StatusCode::CONFLICT, "availability_conflict"),
                    ScheduleError::DoubleBooking(_) => (StatusCode::CONFLICT, "double_booking"),
                    ScheduleError::ReportExists { .. } => (StatusCode::CONFLICT, "report_exists"),
                    ScheduleError::PastEdit { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "past_edit"),
                };
                (status, code, e.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
